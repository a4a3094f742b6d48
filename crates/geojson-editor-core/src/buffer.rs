//! Line buffer.
//!
//! The buffer is an ordered list of line strings and the only source of truth for document
//! content. Columns are expressed in Unicode scalar values (`char`s); byte offsets never leak out
//! of this module.

use crate::cursor::Position;

/// Split text into lines the way an editor sees them.
///
/// `N` newlines produce `N + 1` lines (a trailing newline yields a trailing empty line), and a
/// `"\r\n"` sequence counts as a single line break.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Convert a char column into a byte index within `line` (clamped to the line end).
pub(crate) fn byte_index(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}

/// Number of chars in a line.
pub(crate) fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// The document text, stored by lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    lines: Vec<String>,
}

impl Buffer {
    /// Create a buffer holding a single empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    /// Create a buffer from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
        }
    }

    /// All lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines (always at least 1).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get a single line.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|l| l.as_str())
    }

    /// Length of a line in chars (0 for out-of-range lines).
    pub fn line_len(&self, index: usize) -> usize {
        self.lines.get(index).map(|l| char_len(l)).unwrap_or(0)
    }

    /// Full text, lines joined with `'\n'`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the whole content.
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
    }

    /// Clamp a position to the buffer: line to the last line, column to the line length.
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.lines.len().saturating_sub(1));
        Position::new(line, pos.column.min(self.line_len(line)))
    }

    /// Position just past the last character of the document.
    pub fn end_position(&self) -> Position {
        let last = self.lines.len().saturating_sub(1);
        Position::new(last, self.line_len(last))
    }

    /// Insert text at `pos` and return the position right after the inserted text.
    pub fn insert(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.clamp(pos);
        let line = &self.lines[pos.line];
        let split_at = byte_index(line, pos.column);
        let tail = line[split_at..].to_string();
        let head = line[..split_at].to_string();

        let mut inserted = split_lines(text);
        let last_len = inserted.last().map(|l| char_len(l)).unwrap_or(0);
        let inserted_count = inserted.len();

        let end = if inserted_count == 1 {
            Position::new(pos.line, pos.column + last_len)
        } else {
            Position::new(pos.line + inserted_count - 1, last_len)
        };

        if let Some(first) = inserted.first_mut() {
            first.insert_str(0, &head);
        }
        if let Some(last) = inserted.last_mut() {
            last.push_str(&tail);
        }

        self.lines.splice(pos.line..=pos.line, inserted);
        end
    }

    /// Text between two positions (order-insensitive), lines joined with `'\n'`.
    pub fn text_range(&self, a: Position, b: Position) -> String {
        let (start, end) = order(self.clamp(a), self.clamp(b));
        if start.line == end.line {
            let line = &self.lines[start.line];
            return line[byte_index(line, start.column)..byte_index(line, end.column)].to_string();
        }

        let mut out = String::new();
        let first = &self.lines[start.line];
        out.push_str(&first[byte_index(first, start.column)..]);
        for line in &self.lines[start.line + 1..end.line] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        let last = &self.lines[end.line];
        out.push_str(&last[..byte_index(last, end.column)]);
        out
    }

    /// Delete the text between two positions (order-insensitive) and return it.
    ///
    /// Lines touched by the range are merged so the start position survives unchanged.
    pub fn delete_range(&mut self, a: Position, b: Position) -> String {
        let (start, end) = order(self.clamp(a), self.clamp(b));
        if start == end {
            return String::new();
        }

        let removed = self.text_range(start, end);
        let head = {
            let line = &self.lines[start.line];
            line[..byte_index(line, start.column)].to_string()
        };
        let tail = {
            let line = &self.lines[end.line];
            line[byte_index(line, end.column)..].to_string()
        };

        self.lines
            .splice(start.line..=end.line, std::iter::once(head + &tail));
        removed
    }

    /// Replace the chars `[start_column, end_column)` of a single line.
    pub fn replace_in_line(
        &mut self,
        line: usize,
        start_column: usize,
        end_column: usize,
        text: &str,
    ) -> bool {
        let Some(content) = self.lines.get_mut(line) else {
            return false;
        };
        let start = byte_index(content, start_column);
        let end = byte_index(content, end_column.max(start_column));
        content.replace_range(start..end, text);
        true
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

fn order(a: Position, b: Position) -> (Position, Position) {
    if a <= b { (a, b) } else { (b, a) }
}
