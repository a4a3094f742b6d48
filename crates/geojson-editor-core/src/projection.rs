//! Visibility projection.
//!
//! Derives per-line metadata and the visible line sequence from the buffer, the node index and
//! the hidden-feature set, and computes the virtualization window handed to rendering.
//! Everything here is a pure function of its inputs.

use crate::features::{FeatureKey, FeatureRange, HiddenFeatureSet};
use crate::nodes::{NodeId, NodeIndex};
use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthChar;

/// CSS named colors recognized as inline color values.
pub const NAMED_COLORS: &[&str] = &[
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue", "darkcyan",
    "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki", "darkmagenta",
    "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon", "darkseagreen",
    "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise", "darkviolet", "deeppink",
    "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick", "floralwhite", "forestgreen",
    "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod", "gray", "green", "greenyellow",
    "grey", "honeydew", "hotpink", "indianred", "indigo", "ivory", "khaki", "lavender",
    "lavenderblush", "lawngreen", "lemonchiffon", "lightblue", "lightcoral", "lightcyan",
    "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey", "lightpink", "lightsalmon",
    "lightseagreen", "lightskyblue", "lightslategray", "lightslategrey", "lightsteelblue",
    "lightyellow", "lime", "limegreen", "linen", "magenta", "maroon", "mediumaquamarine",
    "mediumblue", "mediumorchid", "mediumpurple", "mediumseagreen", "mediumslateblue",
    "mediumspringgreen", "mediumturquoise", "mediumvioletred", "midnightblue", "mintcream",
    "mistyrose", "moccasin", "navajowhite", "navy", "oldlace", "olive", "olivedrab", "orange",
    "orangered", "orchid", "palegoldenrod", "palegreen", "paleturquoise", "palevioletred",
    "papayawhip", "peachpuff", "peru", "pink", "plum", "powderblue", "purple", "rebeccapurple",
    "red", "rosybrown", "royalblue", "saddlebrown", "salmon", "sandybrown", "seagreen",
    "seashell", "sienna", "silver", "skyblue", "slateblue", "slategray", "slategrey", "snow",
    "springgreen", "steelblue", "tan", "teal", "thistle", "tomato", "turquoise", "violet",
    "wheat", "white", "whitesmoke", "yellow", "yellowgreen",
];

static COLOR_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#""([^"\\]+)"\s*:\s*"(#[0-9a-fA-F]{6}|#[0-9a-fA-F]{3}|[a-zA-Z]+)""#).ok()
});

static BOOLEAN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""([^"\\]+)"\s*:\s*(true|false)\b"#).ok());

/// Whether a string is a color the inline picker understands.
pub fn is_color_value(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    NAMED_COLORS.contains(&value.to_ascii_lowercase().as_str())
}

/// A color value attached to a key on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineColor {
    /// Attribute name.
    pub key: String,
    /// Color text as written (without quotes).
    pub value: String,
    /// Char column of the first value char.
    pub start_column: usize,
    /// Char column just past the value.
    pub end_column: usize,
}

/// A boolean literal attached to a key on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBoolean {
    /// Attribute name.
    pub key: String,
    /// Literal value.
    pub value: bool,
    /// Char column of the literal.
    pub start_column: usize,
    /// Char column just past the literal.
    pub end_column: usize,
}

/// Collapse toggle shown on a node's start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseButton {
    /// Node the button toggles.
    pub node_id: NodeId,
    /// Key that introduced the node.
    pub key: String,
    /// Current state.
    pub collapsed: bool,
}

/// Visibility toggle shown on a feature's start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityButton {
    /// Feature the button toggles.
    pub feature_key: FeatureKey,
    /// Whether the feature is excluded from output.
    pub hidden: bool,
}

/// Derived facts about one buffer line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMeta {
    /// Inline color values.
    pub colors: Vec<InlineColor>,
    /// Inline boolean literals.
    pub booleans: Vec<InlineBoolean>,
    /// Present on node start lines.
    pub collapse_button: Option<CollapseButton>,
    /// Present on feature start lines.
    pub visibility_button: Option<VisibilityButton>,
    /// Inside a collapsed node.
    pub is_hidden: bool,
    /// Start line of a collapsed node.
    pub is_collapsed: bool,
    /// Owning feature.
    pub feature_key: Option<FeatureKey>,
    /// Owning feature is excluded from output.
    pub feature_hidden: bool,
}

/// A line handed to rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleLine {
    /// Index of the line in the buffer.
    pub buffer_index: usize,
    /// Line text.
    pub content: String,
    /// Derived metadata.
    pub meta: LineMeta,
}

fn char_column(line: &str, byte: usize) -> usize {
    line[..byte].chars().count()
}

/// Inline color tokens on a line.
pub fn scan_colors(line: &str) -> Vec<InlineColor> {
    let Some(re) = COLOR_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(line)
        .filter_map(|caps| {
            let key = caps.get(1)?;
            let value = caps.get(2)?;
            if !is_color_value(value.as_str()) {
                return None;
            }
            Some(InlineColor {
                key: key.as_str().to_string(),
                value: value.as_str().to_string(),
                start_column: char_column(line, value.start()),
                end_column: char_column(line, value.end()),
            })
        })
        .collect()
}

/// Boolean literals attached to keys on a line.
pub fn scan_booleans(line: &str) -> Vec<InlineBoolean> {
    let Some(re) = BOOLEAN_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(line)
        .filter_map(|caps| {
            let key = caps.get(1)?;
            let value = caps.get(2)?;
            Some(InlineBoolean {
                key: key.as_str().to_string(),
                value: value.as_str() == "true",
                start_column: char_column(line, value.start()),
                end_column: char_column(line, value.end()),
            })
        })
        .collect()
}

/// Metadata for every buffer line.
pub fn compute_line_metadata(
    lines: &[String],
    nodes: &NodeIndex,
    features: &[FeatureRange],
    hidden: &HiddenFeatureSet,
) -> Vec<LineMeta> {
    let mut metas: Vec<LineMeta> = lines
        .iter()
        .map(|line| LineMeta {
            colors: scan_colors(line),
            booleans: scan_booleans(line),
            ..LineMeta::default()
        })
        .collect();

    // Outermost node wins the button when several start on one line.
    for node in nodes.nodes().iter().rev() {
        let Some(meta) = metas.get_mut(node.start_line) else {
            continue;
        };
        let collapsed = nodes.is_collapsed(node.id);
        meta.collapse_button = Some(CollapseButton {
            node_id: node.id,
            key: node.key.clone(),
            collapsed,
        });
        meta.is_collapsed = collapsed;
    }

    for node in nodes.collapsed_nodes() {
        for line in node.start_line + 1..node.end_line {
            if let Some(meta) = metas.get_mut(line) {
                meta.is_hidden = true;
            }
        }
    }

    for range in features {
        let is_hidden = hidden.contains(&range.feature_key);
        if let Some(meta) = metas.get_mut(range.start_line) {
            meta.visibility_button = Some(VisibilityButton {
                feature_key: range.feature_key.clone(),
                hidden: is_hidden,
            });
        }
        for line in range.start_line..=range.end_line {
            if let Some(meta) = metas.get_mut(line)
                && meta.feature_key.is_none()
            {
                meta.feature_key = Some(range.feature_key.clone());
                meta.feature_hidden = is_hidden;
            }
        }
    }

    metas
}

/// The visible line sequence: every line not hidden by a collapsed node.
pub fn compute_visible_lines(lines: &[String], metas: &[LineMeta]) -> Vec<VisibleLine> {
    lines
        .iter()
        .zip(metas)
        .enumerate()
        .filter(|(_, (_, meta))| !meta.is_hidden)
        .map(|(buffer_index, (content, meta))| VisibleLine {
            buffer_index,
            content: content.clone(),
            meta: meta.clone(),
        })
        .collect()
}

/// Scroll geometry reported by the host, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Scroll offset of the first pixel shown.
    pub scroll_top: f64,
    /// Height of one row.
    pub line_height: f64,
    /// Height of the viewport.
    pub viewport_height: f64,
}

/// Half-open range `[start, end)` of visible-line indices to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportWindow {
    /// First row (inclusive).
    pub start: usize,
    /// Last row (exclusive).
    pub end: usize,
}

impl ViewportWindow {
    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Rows to materialize for a scroll position, padded by `overscan` rows on each side.
pub fn compute_window(metrics: ScrollMetrics, visible_count: usize, overscan: usize) -> ViewportWindow {
    if metrics.line_height <= 0.0 || !metrics.line_height.is_finite() || visible_count == 0 {
        return ViewportWindow::default();
    }

    let scroll_top = metrics.scroll_top.max(0.0);
    let viewport_height = metrics.viewport_height.max(0.0);
    let first = (scroll_top / metrics.line_height).floor() as usize;
    let last = ((scroll_top + viewport_height) / metrics.line_height).ceil() as usize;

    let start = first.saturating_sub(overscan).min(visible_count);
    let end = last.saturating_add(overscan).min(visible_count);
    ViewportWindow {
        start: start.min(end),
        end,
    }
}

/// Display column (terminal cells) of a char column.
pub fn display_column(line: &str, column: usize) -> usize {
    line.chars()
        .take(column)
        .map(|c| c.width().unwrap_or(0))
        .sum()
}

/// Visible row for a buffer line. Hidden lines map to their collapsed node's start row.
pub fn visible_index(visible: &[VisibleLine], buffer_line: usize) -> Option<usize> {
    match visible.binary_search_by_key(&buffer_line, |v| v.buffer_index) {
        Ok(row) => Some(row),
        Err(0) => None,
        Err(row) => Some(row - 1),
    }
}
