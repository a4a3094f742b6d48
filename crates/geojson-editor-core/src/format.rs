//! Parsing and canonical formatting of the feature list.
//!
//! The buffer holds the features without the enclosing array brackets. Parsing wraps the text
//! as `"[\n" + text + "\n]"`, so error positions are shifted back by the wrapper's first line.

use crate::cursor::Position;
use serde_json::Value;
use std::fmt;

/// Lines added in front of the buffer by the parse wrapper.
const WRAPPER_LINES: usize = 1;

/// A JSON syntax error located in buffer coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Message without position suffix.
    pub message: String,
    /// Zero-based buffer line.
    pub line: usize,
    /// Zero-based char column.
    pub column: usize,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {} column {}",
            self.message,
            self.line + 1,
            self.column + 1
        )
    }
}

impl ParseFailure {
    fn from_serde(err: &serde_json::Error, line_count: usize) -> Self {
        let text = err.to_string();
        let message = match text.rfind(" at line ") {
            Some(idx) => text[..idx].to_string(),
            None => text,
        };
        // serde_json lines are 1-based; line 1 is the wrapper's `[`.
        let line = err
            .line()
            .saturating_sub(1 + WRAPPER_LINES)
            .min(line_count.saturating_sub(1));
        Self {
            message,
            line,
            column: err.column().saturating_sub(1),
        }
    }
}

/// Parse buffer text into the feature list.
pub fn parse_features(text: &str) -> Result<Vec<Value>, ParseFailure> {
    let wrapped = format!("[\n{text}\n]");
    match serde_json::from_str::<Value>(&wrapped) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(ParseFailure {
            message: "expected a feature list".to_string(),
            line: 0,
            column: 0,
        }),
        Err(err) => Err(ParseFailure::from_serde(&err, text.split('\n').count())),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn push_indent(out: &mut String, width: usize) {
    out.extend(std::iter::repeat_n(' ', width));
}

/// Pretty-print a value at `indent`, stepping by `step` spaces. Arrays of scalars stay inline.
pub fn write_value(out: &mut String, value: &Value, indent: usize, step: usize) {
    match value {
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) if items.iter().all(is_scalar) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&item.to_string());
            }
            out.push(']');
        }
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, indent + step);
                write_value(out, item, indent + step, step);
            }
            out.push('\n');
            push_indent(out, indent);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, indent + step);
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push_str(": ");
                write_value(out, item, indent + step, step);
            }
            out.push('\n');
            push_indent(out, indent);
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Format one value at indent 0.
pub fn format_value(value: &Value, step: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0, step);
    out
}

/// Canonical buffer text for a feature list.
pub fn format_features(features: &[Value], step: usize) -> String {
    features
        .iter()
        .map(|feature| format_value(feature, step))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Walk significant chars: every char inside a string literal (quotes included) and every
/// non-whitespace char outside. Calls `visit` with the position just past each one.
fn walk_significant(lines: &[String], mut visit: impl FnMut(Position) -> bool) {
    let mut in_string = false;
    let mut escaped = false;
    for (line_idx, line) in lines.iter().enumerate() {
        for (column, ch) in line.chars().enumerate() {
            let significant = in_string || !ch.is_whitespace();
            if in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    in_string = false;
                }
            } else if ch == '"' {
                in_string = true;
            }
            if significant && !visit(Position::new(line_idx, column + 1)) {
                return;
            }
        }
    }
}

/// Number of significant chars before `pos`.
pub fn cursor_anchor(lines: &[String], pos: Position) -> usize {
    let mut count = 0;
    walk_significant(lines, |after| {
        if after > pos {
            return false;
        }
        count += 1;
        true
    });
    count
}

/// Position right after the `anchor`-th significant char (document end when out of range).
pub fn position_for_anchor(lines: &[String], anchor: usize) -> Position {
    if anchor == 0 {
        return Position::new(0, 0);
    }
    let mut count = 0;
    let mut found = None;
    walk_significant(lines, |after| {
        count += 1;
        if count == anchor {
            found = Some(after);
            return false;
        }
        true
    });
    found.unwrap_or_else(|| {
        let last = lines.len().saturating_sub(1);
        Position::new(last, lines.get(last).map(|l| l.chars().count()).unwrap_or(0))
    })
}
