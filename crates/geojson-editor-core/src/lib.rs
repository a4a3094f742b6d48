#![warn(missing_docs)]
//! GeoJSON Editor Core - Headless Structured-Text Editing Engine for GeoJSON Feature Lists
//!
//! # Overview
//!
//! `geojson-editor-core` keeps a line-oriented text buffer holding a list of GeoJSON features
//! and everything derived from it. It does not paint anything: a host captures input, calls the
//! entry points on [`GeoJsonEditor`], and paints the [`VisibleLine`]s it gets back.
//!
//! # Core Features
//!
//! - **Collapsible nodes**: every multi-line object/array can be collapsed; node identity
//!   (attribute key + occurrence order) survives edits
//! - **Virtualization**: only the window of visible lines around the scroll position is handed
//!   to rendering, independent of document size
//! - **Cursor engine**: grapheme-aware, word-wise, and aware of collapsed ranges
//! - **Grouped undo/redo**: snapshot history with time-windowed merging of same-kind edits
//! - **Tolerant validation**: invalid JSON never blocks editing; a debounced pipeline reformats
//!   valid content and reports GeoJSON validation errors
//! - **Features API**: `set`/`add`/`insert_at`/`remove_at`/`get` with atomic validation
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  GeoJsonEditor (entry points, Features API) │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Pipeline (parse, format, validate, emit)   │  ← Signals
//! ├─────────────────────────────────────────────┤
//! │  Projection (line meta, visible lines)      │  ← Rendering Data
//! ├─────────────────────────────────────────────┤
//! │  Node Index + Feature Ranges                │  ← Structure
//! ├─────────────────────────────────────────────┤
//! │  Bracket Scanner                            │  ← Tokens
//! ├─────────────────────────────────────────────┤
//! │  Line Buffer                                │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use geojson_editor_core::{CollapseSpec, EditorOptions, GeoJsonEditor};
//! use serde_json::json;
//!
//! let mut editor = GeoJsonEditor::new(EditorOptions::default());
//! editor
//!     .set(
//!         json!({
//!             "type": "Feature",
//!             "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
//!             "properties": {"name": "path"}
//!         }),
//!         &CollapseSpec::default(),
//!     )
//!     .unwrap();
//!
//! // The coordinates array starts collapsed.
//! assert_eq!(editor.collapsed_nodes().len(), 1);
//!
//! // Hide the feature from emitted output.
//! let key = editor.feature_ranges()[0].feature_key.clone();
//! editor.toggle_feature_visibility(&key);
//! let event = editor.emit();
//! assert_eq!(event.document().unwrap()["features"].as_array().unwrap().len(), 0);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Line buffer
//! - [`scanner`] - Bracket and string tokenizer
//! - [`nodes`] - Collapsible node index and collapsed set
//! - [`features`] - Feature ranges, feature keys and hidden-feature set
//! - [`projection`] - Line metadata, visible lines and viewport windows
//! - [`cursor`] - Positions, selections and cursor motion
//! - [`history`] - Undo/redo
//! - [`format`] - Parsing and canonical formatting
//! - [`geojson`] - Validation and input normalization
//! - [`schedule`] - Clocks, debouncing and frame coalescing

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod error;
pub mod events;
pub mod features;
pub mod format;
pub mod geojson;
pub mod history;
pub mod nodes;
pub mod projection;
pub mod scanner;
pub mod schedule;

mod api;
mod edit;
mod editor;
mod pipeline;

pub use api::{CollapseFn, CollapseSpec, SavedDocument};
pub use buffer::Buffer;
pub use config::EditorOptions;
pub use cursor::{ArrowKey, HomeEnd, Modifiers, Position, Selection};
pub use edit::PasteKind;
pub use editor::{GeoJsonEditor, Viewport, VisiblePosition};
pub use error::FeatureError;
pub use events::{EditorEvent, ErrorReport, EventCallback};
pub use features::{FeatureKey, FeatureRange, HiddenFeatureSet};
pub use geojson::ValidationError;
pub use history::{ActionKind, HistoryEntry};
pub use nodes::{Node, NodeId, NodeIndex, ROOT_KEY};
pub use projection::{
    CollapseButton, InlineBoolean, InlineColor, LineMeta, ScrollMetrics, ViewportWindow,
    VisibilityButton, VisibleLine,
};
pub use schedule::{Clock, Debouncer, FrameScheduler, ManualClock, SystemClock};
