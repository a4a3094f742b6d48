//! Format and validate pipeline.
//!
//! Runs when the debounced emission fires (or on [`GeoJsonEditor::emit`]). A parseable buffer is
//! reformatted with the cursor carried over by significant-char count, then validated; an
//! unparseable buffer is left exactly as typed.

use crate::buffer::split_lines;
use crate::cursor::snap_to_visible;
use crate::editor::GeoJsonEditor;
use crate::events::{ErrorReport, EditorEvent};
use crate::features::feature_keys;
use crate::format::{cursor_anchor, format_features, parse_features, position_for_anchor};
use crate::geojson::{feature_collection, validate_features};
use tracing::{debug, warn};

impl GeoJsonEditor {
    /// Parse, reformat and validate the buffer. Produces exactly one signal.
    pub(crate) fn run_pipeline(&mut self) -> EditorEvent {
        let text = self.buffer.text();
        let features = match parse_features(&text) {
            Ok(features) => features,
            Err(failure) => {
                debug!(line = failure.line, column = failure.column, "buffer does not parse");
                return EditorEvent::Error(ErrorReport {
                    message: failure.to_string(),
                    validation_errors: Vec::new(),
                    content: text,
                });
            }
        };

        let formatted = format_features(&features, self.options.indent_width);
        if formatted != text {
            let anchor = cursor_anchor(self.buffer.lines(), self.cursor);
            let lines = split_lines(&formatted);
            self.cursor = position_for_anchor(&lines, anchor);
            self.buffer.set_lines(lines);
            self.selection = None;
            self.version = self.version.wrapping_add(1);
            self.recompute();
            self.cursor = snap_to_visible(self.buffer.lines(), &self.nodes, self.cursor);
            debug!(lines = self.buffer.line_count(), "reformatted");
        }

        let errors = validate_features(&features);
        if let Some(first) = errors.first() {
            warn!(count = errors.len(), first = %first, "validation failed");
            return EditorEvent::Error(ErrorReport {
                message: format!("Invalid GeoJSON: {first}"),
                validation_errors: errors,
                content: self.buffer.text(),
            });
        }

        let keys = feature_keys(&features);
        let visible: Vec<_> = features
            .into_iter()
            .zip(keys)
            .filter(|(_, key)| !self.hidden.contains(key))
            .map(|(feature, _)| feature)
            .collect();
        debug!(features = visible.len(), "change");
        EditorEvent::Change(feature_collection(visible))
    }

    /// Deliver a signal to every subscriber and remember it.
    pub(crate) fn dispatch(&mut self, event: EditorEvent) {
        for callback in self.callbacks.iter_mut() {
            callback(&event);
        }
        self.last_event = Some(event);
    }

    /// Cancel any pending debounced emission, run the pipeline now and dispatch the result.
    pub fn emit(&mut self) -> EditorEvent {
        self.emit_timer.cancel();
        let event = self.run_pipeline();
        self.dispatch(event.clone());
        event
    }
}
