//! Editor options.

use serde::Deserialize;

/// Tunables for a [`GeoJsonEditor`](crate::GeoJsonEditor).
///
/// Missing fields fall back to their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Maximum number of undo steps.
    pub history_limit: usize,
    /// Same-kind edits closer than this merge into one undo step.
    pub group_window_ms: u64,
    /// Delay between the last edit and the change/error emission.
    pub emit_debounce_ms: u64,
    /// Rows rendered above and below the viewport.
    pub overscan_lines: usize,
    /// Spaces per indentation level when formatting.
    pub indent_width: usize,
    /// Attribute names collapsed by default after API writes.
    pub default_collapse: Vec<String>,
    /// File name used by `save` when none is given.
    pub save_file_name: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_limit: 100,
            group_window_ms: 500,
            emit_debounce_ms: 150,
            overscan_lines: 10,
            indent_width: 2,
            default_collapse: vec!["coordinates".to_string()],
            save_file_name: "features.geojson".to_string(),
        }
    }
}

impl EditorOptions {
    /// Load options from a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
