//! Errors returned by the programmatic Features API.
//!
//! Typing paths never produce these; parse and validation problems found while editing are
//! reported through [`EditorEvent::Error`](crate::EditorEvent::Error) instead.

use thiserror::Error;

/// Features API error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeatureError {
    /// Input was neither a feature, a feature array nor a feature collection.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// An element of the input failed validation. Nothing was applied.
    #[error("Invalid feature at index {index}: {message}")]
    InvalidFeature {
        /// Position of the offending element in the normalized input.
        index: usize,
        /// First validation message for that element.
        message: String,
    },

    /// The operation needs the current buffer to parse.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Text handed to `open` is not JSON.
    #[error("Parse error: {0}")]
    Parse(String),
}
