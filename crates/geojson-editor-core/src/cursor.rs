//! Cursor and selection engine.
//!
//! Positions always refer to buffer lines, never to visible rows. Motion functions are pure:
//! they take the current lines and node index and return the next position, so the editor can
//! apply them to the cursor or to the moving end of a selection alike.

use crate::buffer::char_len;
use crate::nodes::NodeIndex;
use std::cmp::Ordering;
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// Position in the buffer (zero-based line, char column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based buffer line.
    pub line: usize,
    /// Zero-based column in chars.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A selection. `start` is the anchor and `end` follows the cursor; no ordering is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Anchor.
    pub start: Position,
    /// Moving end.
    pub end: Position,
}

impl Selection {
    /// Create a selection from anchor to head.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// `(min, max)` of the two ends.
    pub fn normalized(&self) -> (Position, Position) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    /// Whether both ends coincide.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    /// One grapheme (or word) back.
    Left,
    /// One grapheme (or word) forward.
    Right,
    /// One visible line up.
    Up,
    /// One visible line down.
    Down,
}

/// Home / End keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeEnd {
    /// Line (or document) start.
    Home,
    /// Line (or document) end.
    End,
}

/// Modifier state for navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Extend the selection.
    pub shift: bool,
    /// Word-wise horizontal motion.
    pub word: bool,
    /// Jump to document bounds (Home/End, Up/Down).
    pub document: bool,
}

impl Modifiers {
    /// Shift only.
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    /// Word motion only.
    pub fn word() -> Self {
        Self {
            word: true,
            ..Self::default()
        }
    }

    /// Document bounds only.
    pub fn document() -> Self {
        Self {
            document: true,
            ..Self::default()
        }
    }
}

fn line_at(lines: &[String], line: usize) -> &str {
    lines.get(line).map(|l| l.as_str()).unwrap_or("")
}

fn last_line(lines: &[String]) -> usize {
    lines.len().saturating_sub(1)
}

/// Char columns where grapheme clusters start, plus the line length.
fn grapheme_boundaries(line: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut column = 0;
    for grapheme in line.graphemes(true) {
        boundaries.push(column);
        column += grapheme.chars().count();
    }
    boundaries.push(column);
    boundaries
}

/// Previous grapheme boundary before `column` on `line`.
pub fn prev_grapheme_column(line: &str, column: usize) -> usize {
    grapheme_boundaries(line)
        .into_iter()
        .rev()
        .find(|&b| b < column)
        .unwrap_or(0)
}

/// Next grapheme boundary after `column` on `line`.
pub fn next_grapheme_column(line: &str, column: usize) -> usize {
    let len = char_len(line);
    grapheme_boundaries(line)
        .into_iter()
        .find(|&b| b > column)
        .unwrap_or(len)
}

/// Whether a char belongs to a word.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Move one grapheme left, jumping over collapsed content.
pub fn move_left(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    if let Some(node) = nodes.collapsed_ending_at(pos.line)
        && pos.column <= node.end_column + 1
    {
        return Position::new(node.start_line, node.start_column);
    }

    if pos.column > 0 {
        let line = line_at(lines, pos.line);
        return Position::new(pos.line, prev_grapheme_column(line, pos.column));
    }
    if pos.line == 0 {
        return pos;
    }

    let target = pos.line - 1;
    match nodes.hiding_node(target) {
        Some(node) => Position::new(node.start_line, node.start_column),
        None => Position::new(target, char_len(line_at(lines, target))),
    }
}

/// Move one grapheme right, jumping over collapsed content.
pub fn move_right(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    let line = line_at(lines, pos.line);
    let len = char_len(line);

    if let Some(node) = nodes.collapsed_starting_at(pos.line)
        && pos.column >= node.start_column
    {
        return Position::new(node.end_line, node.end_column + 1);
    }

    if pos.column < len {
        return Position::new(pos.line, next_grapheme_column(line, pos.column));
    }
    if pos.line >= last_line(lines) {
        return pos;
    }

    let target = pos.line + 1;
    match nodes.hiding_node(target) {
        Some(node) => Position::new(node.end_line, 0),
        None => Position::new(target, 0),
    }
}

/// Move one visible line up, keeping the column where possible.
pub fn move_up(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    if pos.line == 0 {
        return Position::new(0, 0);
    }
    let mut target = pos.line - 1;
    if let Some(node) = nodes.hiding_node(target) {
        target = node.start_line;
    }
    Position::new(target, pos.column.min(char_len(line_at(lines, target))))
}

/// Move one visible line down, keeping the column where possible.
pub fn move_down(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    let last = last_line(lines);
    if pos.line >= last {
        return Position::new(last, char_len(line_at(lines, last)));
    }
    let mut target = pos.line + 1;
    if let Some(node) = nodes.hiding_node(target) {
        target = node.end_line;
    }
    Position::new(target, pos.column.min(char_len(line_at(lines, target))))
}

/// Move to the end of the current or next word.
pub fn word_right(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    let line = line_at(lines, pos.line);
    let chars: Vec<char> = line.chars().collect();
    if pos.column >= chars.len() {
        return move_right(lines, nodes, pos);
    }

    let mut column = pos.column;
    while column < chars.len() && !is_word_char(chars[column]) {
        column += 1;
    }
    while column < chars.len() && is_word_char(chars[column]) {
        column += 1;
    }

    if let Some(node) = nodes.collapsed_starting_at(pos.line)
        && column > node.start_column
    {
        return Position::new(node.end_line, node.end_column + 1);
    }
    Position::new(pos.line, column)
}

/// Move to the start of the current or previous word.
pub fn word_left(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    if pos.column == 0 {
        return move_left(lines, nodes, pos);
    }

    let line = line_at(lines, pos.line);
    let chars: Vec<char> = line.chars().collect();
    let mut column = pos.column.min(chars.len());
    while column > 0 && !is_word_char(chars[column - 1]) {
        column -= 1;
    }
    while column > 0 && is_word_char(chars[column - 1]) {
        column -= 1;
    }

    if let Some(node) = nodes.collapsed_ending_at(pos.line)
        && column <= node.end_column
    {
        return Position::new(node.start_line, node.start_column);
    }
    Position::new(pos.line, column)
}

/// Start of the cursor's buffer line.
pub fn line_start(pos: Position) -> Position {
    Position::new(pos.line, 0)
}

/// End of the cursor's buffer line.
pub fn line_end(lines: &[String], pos: Position) -> Position {
    Position::new(pos.line, char_len(line_at(lines, pos.line)))
}

/// First position of the document.
pub fn document_start() -> Position {
    Position::new(0, 0)
}

/// Last position of the document.
pub fn document_end(lines: &[String]) -> Position {
    let last = last_line(lines);
    Position::new(last, char_len(line_at(lines, last)))
}

/// Apply an arrow key.
pub fn arrow(
    lines: &[String],
    nodes: &NodeIndex,
    pos: Position,
    key: ArrowKey,
    modifiers: Modifiers,
) -> Position {
    match (key, modifiers.word, modifiers.document) {
        (ArrowKey::Up, _, true) => document_start(),
        (ArrowKey::Down, _, true) => document_end(lines),
        (ArrowKey::Left, true, _) => word_left(lines, nodes, pos),
        (ArrowKey::Right, true, _) => word_right(lines, nodes, pos),
        (ArrowKey::Left, false, _) => move_left(lines, nodes, pos),
        (ArrowKey::Right, false, _) => move_right(lines, nodes, pos),
        (ArrowKey::Up, _, false) => move_up(lines, nodes, pos),
        (ArrowKey::Down, _, false) => move_down(lines, nodes, pos),
    }
}

/// Apply Home or End.
pub fn home_end(lines: &[String], pos: Position, key: HomeEnd, modifiers: Modifiers) -> Position {
    match (key, modifiers.document) {
        (HomeEnd::Home, false) => line_start(pos),
        (HomeEnd::End, false) => line_end(lines, pos),
        (HomeEnd::Home, true) => document_start(),
        (HomeEnd::End, true) => document_end(lines),
    }
}

/// Clamp a position into the buffer and move it out of hidden lines.
pub fn snap_to_visible(lines: &[String], nodes: &NodeIndex, pos: Position) -> Position {
    let line = pos.line.min(last_line(lines));
    let pos = Position::new(line, pos.column.min(char_len(line_at(lines, line))));
    match nodes.hiding_node(pos.line) {
        Some(node) => Position::new(node.start_line, node.start_column),
        None => pos,
    }
}
