//! Edit operations reachable from typing and the clipboard.
//!
//! Every operation records history before mutating, mutates the buffer at the cursor or
//! selection, then recomputes derived state. None of them fail: invalid JSON is always accepted.

use crate::cursor::{Position, next_grapheme_column, prev_grapheme_column};
use crate::editor::GeoJsonEditor;
use crate::format::format_features;
use crate::geojson::{is_recognized_shape, normalize_input};
use crate::history::ActionKind;
use crate::nodes::NodeId;
use crate::projection::is_color_value;
use serde_json::Value;
use tracing::trace;

/// How a paste was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteKind {
    /// GeoJSON recognized and inserted as this many formatted features.
    Features(usize),
    /// Inserted verbatim.
    Text,
    /// Nothing to paste.
    Empty,
}

impl GeoJsonEditor {
    /// Expand collapsed nodes whose brackets or hidden lines the range `[start, end)` touches.
    fn expand_touching(&mut self, start: Position, end: Position) {
        let touched: Vec<NodeId> = self
            .nodes
            .collapsed_nodes()
            .filter(|node| {
                let open = Position::new(node.start_line, node.start_column);
                let close = Position::new(node.end_line, node.end_column);
                let hidden_overlap = start.line < node.end_line && end.line > node.start_line;
                (open >= start && open < end) || (close >= start && close < end) || hidden_overlap
            })
            .map(|node| node.id)
            .collect();
        for id in touched {
            self.nodes.expand(id);
        }
    }

    /// Remove the selected text without recording history. Returns whether anything was removed.
    fn remove_selection(&mut self) -> bool {
        let Some(selection) = self.selection.take() else {
            return false;
        };
        if selection.is_empty() {
            return false;
        }
        let (start, end) = selection.normalized();
        self.expand_touching(start, end);
        self.buffer.delete_range(start, end);
        self.cursor = self.buffer.clamp(start);
        true
    }

    /// Insert text at the cursor, replacing the selection.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.insert_as(ActionKind::Insert, text);
    }

    fn insert_as(&mut self, kind: ActionKind, text: &str) {
        self.record(kind);
        self.remove_selection();
        self.cursor = self.buffer.insert(self.cursor, text);
        trace!(%kind, cursor = %self.cursor, "insert");
        self.after_edit();
    }

    /// Split the line at the cursor. No auto-indent.
    pub fn insert_newline(&mut self) {
        self.insert_as(ActionKind::Newline, "\n");
    }

    /// Delete the selection. Returns `false` when nothing is selected.
    pub fn delete_selection(&mut self) -> bool {
        if self.selection.is_none_or(|s| s.is_empty()) {
            self.selection = None;
            return false;
        }
        self.record(ActionKind::Delete);
        self.remove_selection();
        self.after_edit();
        true
    }

    /// Backspace.
    pub fn delete_backward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let cursor = self.cursor;
        let start = if cursor.column > 0 {
            let line = self.buffer.line(cursor.line).unwrap_or("");
            Position::new(cursor.line, prev_grapheme_column(line, cursor.column))
        } else if cursor.line > 0 {
            Position::new(cursor.line - 1, self.buffer.line_len(cursor.line - 1))
        } else {
            return;
        };

        self.record(ActionKind::Delete);
        self.expand_touching(start, cursor);
        self.buffer.delete_range(start, cursor);
        self.cursor = start;
        trace!(cursor = %self.cursor, "delete backward");
        self.after_edit();
    }

    /// Forward delete.
    pub fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let cursor = self.cursor;
        let len = self.buffer.line_len(cursor.line);
        let end = if cursor.column < len {
            let line = self.buffer.line(cursor.line).unwrap_or("");
            Position::new(cursor.line, next_grapheme_column(line, cursor.column))
        } else if cursor.line + 1 < self.buffer.line_count() {
            Position::new(cursor.line + 1, 0)
        } else {
            return;
        };

        self.record(ActionKind::Delete);
        self.expand_touching(cursor, end);
        self.buffer.delete_range(cursor, end);
        trace!(cursor = %self.cursor, "delete forward");
        self.after_edit();
    }

    /// Selected text, or the whole document when nothing is selected. Collapsed content is
    /// always included.
    pub fn handle_copy(&self) -> String {
        match self.selection.filter(|s| !s.is_empty()) {
            Some(selection) => {
                let (start, end) = selection.normalized();
                self.buffer.text_range(start, end)
            }
            None => self.buffer.text(),
        }
    }

    /// Copy, then remove the copied text (the whole document when nothing is selected).
    pub fn handle_cut(&mut self) -> String {
        let copied = self.handle_copy();
        if copied.is_empty() {
            return copied;
        }
        self.record(ActionKind::Cut);
        if !self.remove_selection() {
            self.buffer.set_lines(Vec::new());
            self.cursor = Position::new(0, 0);
            self.nodes.expand_all();
        }
        self.after_edit();
        copied
    }

    fn significant_neighbors(&self) -> (Option<char>, Option<char>) {
        let lines = self.buffer.lines();
        let cursor = self.cursor;

        let before = lines
            .iter()
            .take(cursor.line + 1)
            .enumerate()
            .rev()
            .flat_map(|(i, line)| {
                let take = if i == cursor.line { cursor.column } else { usize::MAX };
                line.chars().take(take).collect::<Vec<_>>().into_iter().rev()
            })
            .find(|c| !c.is_whitespace());

        let after = lines
            .iter()
            .enumerate()
            .skip(cursor.line)
            .flat_map(|(i, line)| {
                let skip = if i == cursor.line { cursor.column } else { 0 };
                line.chars().skip(skip)
            })
            .find(|c| !c.is_whitespace());

        (before, after)
    }

    /// Paste clipboard text.
    ///
    /// A feature, feature array or feature collection is formatted and inserted as features,
    /// with separating commas added against neighbouring features. Schema problems inside a
    /// feature are left for the pipeline to report. Anything else, including an array or
    /// collection mixing features with other values, is inserted verbatim.
    pub fn handle_paste(&mut self, text: &str) -> PasteKind {
        if text.is_empty() {
            return PasteKind::Empty;
        }

        let features = serde_json::from_str::<Value>(text.trim())
            .ok()
            .filter(is_recognized_shape)
            .and_then(|value| normalize_input(value).ok())
            .filter(|features| !features.is_empty());

        let Some(features) = features else {
            self.insert_as(ActionKind::Paste, text);
            return PasteKind::Text;
        };

        self.record(ActionKind::Paste);
        self.remove_selection();
        let (before, after) = self.significant_neighbors();
        let mut payload = format_features(&features, self.options.indent_width);
        if before == Some('}') {
            payload.insert_str(0, ",\n");
        }
        if after == Some('{') {
            payload.push(',');
        }
        self.cursor = self.buffer.insert(self.cursor, &payload);
        trace!(count = features.len(), "paste features");
        self.after_edit();
        PasteKind::Features(features.len())
    }

    /// Replace the `index`-th inline color on `line`. Returns `false` for unknown targets or a
    /// value that is not a color.
    pub fn update_inline_color(&mut self, line: usize, index: usize, value: &str) -> bool {
        let Some(color) = self
            .line_meta
            .get(line)
            .and_then(|meta| meta.colors.get(index))
            .cloned()
        else {
            return false;
        };
        if !is_color_value(value) || color.value == value {
            return false;
        }

        self.record(ActionKind::InlineEdit);
        self.buffer
            .replace_in_line(line, color.start_column, color.end_column, value);
        self.cursor = self.buffer.clamp(self.cursor);
        self.after_edit();
        true
    }

    /// Flip the `index`-th inline boolean on `line`.
    pub fn toggle_inline_boolean(&mut self, line: usize, index: usize) -> bool {
        let Some(boolean) = self
            .line_meta
            .get(line)
            .and_then(|meta| meta.booleans.get(index))
            .cloned()
        else {
            return false;
        };

        let replacement = if boolean.value { "false" } else { "true" };
        self.record(ActionKind::InlineEdit);
        self.buffer
            .replace_in_line(line, boolean.start_column, boolean.end_column, replacement);
        self.cursor = self.buffer.clamp(self.cursor);
        self.after_edit();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorOptions;
    use crate::cursor::Selection;

    fn editor(text: &str) -> GeoJsonEditor {
        GeoJsonEditor::from_text(text, EditorOptions::default())
    }

    #[test]
    fn test_newline_splits_line() {
        let mut ed = editor(r#"{"a": 1}"#);
        ed.set_cursor(Position::new(0, 4));
        ed.insert_newline();
        assert_eq!(ed.lines(), &[r#"{"a""#, r#": 1}"#]);
        assert_eq!(ed.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut ed = editor("hello world");
        ed.set_selection(Position::new(0, 11), Position::new(0, 6));
        ed.insert_text("there");
        assert_eq!(ed.text(), "hello there");
        assert_eq!(ed.cursor(), Position::new(0, 11));
        assert!(ed.selection().is_none());
    }

    #[test]
    fn test_backspace_merges_lines_and_stops_at_origin() {
        let mut ed = editor("ab\ncd");
        ed.set_cursor(Position::new(1, 0));
        ed.delete_backward();
        assert_eq!(ed.text(), "abcd");
        assert_eq!(ed.cursor(), Position::new(0, 2));

        ed.set_cursor(Position::new(0, 0));
        ed.delete_backward();
        assert_eq!(ed.text(), "abcd");
    }

    #[test]
    fn test_delete_forward_merges_next_line() {
        let mut ed = editor("ab\ncd");
        ed.set_cursor(Position::new(0, 2));
        ed.delete_forward();
        assert_eq!(ed.text(), "abcd");
        assert_eq!(ed.cursor(), Position::new(0, 2));
        ed.set_cursor(Position::new(0, 4));
        ed.delete_forward();
        assert_eq!(ed.text(), "abcd");
    }

    #[test]
    fn test_backspace_into_collapsed_node_expands_it() {
        let mut ed = editor("{\n  \"coordinates\": [\n    1,\n    2\n  ]\n}");
        let coords = ed.nodes()[1].id;
        ed.toggle_collapse(coords);
        ed.set_cursor(Position::new(4, 0));
        ed.delete_backward();
        assert!(!ed.is_collapsed(coords));
        assert_eq!(ed.lines()[3], "    2  ]");
    }

    #[test]
    fn test_copy_includes_collapsed_lines() {
        let text = "{\n  \"coordinates\": [\n    1,\n    2\n  ]\n}";
        let mut ed = editor(text);
        ed.toggle_collapse(ed.nodes()[1].id);
        assert_eq!(ed.handle_copy(), text);

        ed.set_selection(Position::new(1, 2), Position::new(4, 3));
        assert_eq!(ed.handle_copy(), "\"coordinates\": [\n    1,\n    2\n  ]");
    }

    #[test]
    fn test_cut_without_selection_clears_document() {
        let mut ed = editor("{\"a\": 1}");
        assert_eq!(ed.handle_cut(), "{\"a\": 1}");
        assert_eq!(ed.text(), "");
        assert!(ed.undo());
        assert_eq!(ed.text(), "{\"a\": 1}");
    }

    #[test]
    fn test_paste_feature_adds_separator() {
        let mut ed = editor(r#"{"type": "Feature", "geometry": null, "properties": {}}"#);
        ed.handle_home_end(crate::cursor::HomeEnd::End, Default::default());
        let kind = ed.handle_paste(r#"{"type": "Feature", "geometry": null, "properties": null}"#);
        assert_eq!(kind, PasteKind::Features(1));
        assert_eq!(ed.lines()[1], "{");
        assert!(ed.lines()[0].ends_with("},"));
        assert!(crate::format::parse_features(&ed.text()).is_ok());
    }

    #[test]
    fn test_paste_before_feature_adds_trailing_comma() {
        let mut ed = editor(r#"{"type": "Feature", "geometry": null, "properties": {}}"#);
        ed.set_cursor(Position::new(0, 0));
        ed.handle_paste(r#"[{"type": "Feature", "geometry": null, "properties": null}]"#);
        assert!(crate::format::parse_features(&ed.text()).unwrap().len() == 2);
    }

    #[test]
    fn test_paste_feature_collection_inserts_its_features() {
        let mut ed = editor("");
        let kind = ed.handle_paste(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": null, "properties": {"n": 1}},
                {"type": "Feature", "geometry": null, "properties": {"n": 2}}
            ]}"#,
        );
        assert_eq!(kind, PasteKind::Features(2));
        assert!(!ed.text().contains("FeatureCollection"));
        let features = crate::format::parse_features(&ed.text()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["properties"]["n"], 2);
    }

    #[test]
    fn test_paste_collection_with_non_feature_is_verbatim() {
        let mut ed = editor("");
        let payload = r#"{"type": "FeatureCollection", "features": [{"type": "Point", "coordinates": [0, 0]}]}"#;
        assert_eq!(ed.handle_paste(payload), PasteKind::Text);
        assert_eq!(ed.text(), payload);
    }

    #[test]
    fn test_paste_feature_with_bad_geometry_is_formatted_then_reported() {
        let mut ed = editor("");
        let kind = ed.handle_paste(
            r#"{"type": "Feature", "geometry": {"type": "InvalidType", "coordinates": [0, 0]}, "properties": {}}"#,
        );
        assert_eq!(kind, PasteKind::Features(1));
        assert_eq!(ed.lines()[0], "{");
        let report = ed.emit().error().cloned().unwrap();
        assert!(report.message.contains("Invalid geometry type"));
    }

    #[test]
    fn test_paste_plain_text_is_verbatim() {
        let mut ed = editor("ab");
        ed.set_cursor(Position::new(0, 1));
        assert_eq!(ed.handle_paste("x\ny"), PasteKind::Text);
        assert_eq!(ed.text(), "ax\nyb");
        assert_eq!(ed.cursor(), Position::new(1, 1));
        assert_eq!(ed.handle_paste(""), PasteKind::Empty);
    }

    #[test]
    fn test_inline_controls_edit_the_buffer() {
        let mut ed = editor("\"stroke\": \"#ff0000\", \"visible\": true");
        assert!(ed.update_inline_color(0, 0, "#00ff00"));
        assert!(ed.text().contains("#00ff00"));
        assert!(!ed.update_inline_color(0, 0, "notacolor"));
        assert!(!ed.update_inline_color(0, 3, "red"));

        assert!(ed.toggle_inline_boolean(0, 0));
        assert!(ed.text().ends_with("\"visible\": false"));
        assert!(ed.undo());
        assert!(ed.text().ends_with("\"visible\": true"));
    }

    #[test]
    fn test_delete_selection_normalizes_reversed_ends() {
        let mut ed = editor("abc\ndef");
        ed.selection = Some(Selection::new(Position::new(1, 1), Position::new(0, 1)));
        assert!(ed.delete_selection());
        assert_eq!(ed.text(), "aef");
        assert_eq!(ed.cursor(), Position::new(0, 1));
        assert!(!ed.delete_selection());
    }
}
