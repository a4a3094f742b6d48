//! Change and error signals delivered to subscribers.

use crate::geojson::ValidationError;
use serde::Serialize;
use serde_json::Value;

/// Payload of an error signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Parse failure or summary of the validation errors.
    pub message: String,
    /// Path-qualified validation errors (empty for parse failures).
    pub validation_errors: Vec<ValidationError>,
    /// Buffer text at emission time.
    pub content: String,
}

/// Signal emitted after a pipeline run. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum EditorEvent {
    /// Parsed, validated `FeatureCollection` with hidden features removed.
    Change(Value),
    /// Parse or validation failure.
    Error(ErrorReport),
}

impl EditorEvent {
    /// Whether this is a change signal.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Change(_))
    }

    /// The emitted document, for change signals.
    pub fn document(&self) -> Option<&Value> {
        match self {
            Self::Change(doc) => Some(doc),
            Self::Error(_) => None,
        }
    }

    /// The report, for error signals.
    pub fn error(&self) -> Option<&ErrorReport> {
        match self {
            Self::Change(_) => None,
            Self::Error(report) => Some(report),
        }
    }
}

/// Subscriber callback.
pub type EventCallback = Box<dyn FnMut(&EditorEvent) + Send>;
