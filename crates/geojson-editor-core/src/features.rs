//! Feature ranges, content-derived feature keys and the hidden-feature set.

use crate::scanner::{Token, tokenize_line};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Content-derived feature identifier: a hash of geometry and properties plus a sequence
/// number separating identical features in document order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureKey(pub String);

impl FeatureKey {
    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A top-level feature's span in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRange {
    /// Stable key.
    pub feature_key: FeatureKey,
    /// Line with the opening brace.
    pub start_line: usize,
    /// Line with the closing brace.
    pub end_line: usize,
    /// Positional index among features.
    pub feature_index: usize,
}

/// Feed a JSON value into a hasher with object keys sorted, so key order never matters.
fn hash_canonical<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            n.to_string().hash(state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_canonical(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.len().hash(state);
            for (key, item) in entries {
                key.hash(state);
                hash_canonical(item, state);
            }
        }
    }
}

/// Content hash of a feature's geometry and properties.
pub fn feature_hash(feature: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_canonical(feature.get("geometry").unwrap_or(&Value::Null), &mut hasher);
    hash_canonical(
        feature.get("properties").unwrap_or(&Value::Null),
        &mut hasher,
    );
    hasher.finish()
}

fn raw_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Turns hashes into keys, numbering repeats in the order they appear.
#[derive(Debug, Default)]
struct KeyMinter {
    seen: HashMap<u64, usize>,
}

impl KeyMinter {
    fn mint(&mut self, hash: u64) -> FeatureKey {
        let n = self.seen.entry(hash).or_insert(0);
        let key = FeatureKey(format!("{hash:016x}-{n}"));
        *n += 1;
        key
    }
}

/// Keys for a list of parsed features.
pub fn feature_keys(features: &[Value]) -> Vec<FeatureKey> {
    let mut minter = KeyMinter::default();
    features
        .iter()
        .map(|feature| minter.mint(feature_hash(feature)))
        .collect()
}

/// Extract the text between two char positions (inclusive end column).
fn span_text(lines: &[String], start: (usize, usize), end: (usize, usize)) -> String {
    let mut out = String::new();
    for line_idx in start.0..=end.0 {
        let Some(line) = lines.get(line_idx) else {
            break;
        };
        let from = if line_idx == start.0 { start.1 } else { 0 };
        let to = if line_idx == end.0 {
            end.1 + 1
        } else {
            usize::MAX
        };
        if line_idx > start.0 {
            out.push('\n');
        }
        out.extend(line.chars().skip(from).take(to.saturating_sub(from)));
    }
    out
}

/// Partition the buffer into top-level feature ranges.
///
/// Each object at depth 0 of the feature list is one feature. Features that fail to parse on
/// their own are keyed by a hash of their raw text. Returns an empty list when the brackets
/// are unbalanced.
pub fn compute_feature_ranges(lines: &[String]) -> Vec<FeatureRange> {
    let mut spans: Vec<((usize, usize), (usize, usize))> = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (line_idx, line) in lines.iter().enumerate() {
        for token in tokenize_line(line) {
            match token {
                Token::Open { bracket, column } => {
                    if depth == 0 && bracket == '{' {
                        start = Some((line_idx, column));
                    }
                    depth += 1;
                }
                Token::Close { column, .. } => {
                    if depth == 0 {
                        return Vec::new();
                    }
                    depth -= 1;
                    if depth == 0
                        && let Some(open) = start.take()
                    {
                        spans.push((open, (line_idx, column)));
                    }
                }
                _ => {}
            }
        }
    }
    if depth != 0 {
        return Vec::new();
    }

    let mut minter = KeyMinter::default();
    spans
        .into_iter()
        .enumerate()
        .map(|(feature_index, (open, close))| {
            let text = span_text(lines, open, close);
            let hash = match serde_json::from_str::<Value>(&text) {
                Ok(value) => feature_hash(&value),
                Err(_) => raw_hash(&text),
            };
            FeatureRange {
                feature_key: minter.mint(hash),
                start_line: open.0,
                end_line: close.0,
                feature_index,
            }
        })
        .collect()
}

/// Feature keys excluded from emitted output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenFeatureSet {
    keys: BTreeSet<FeatureKey>,
}

impl HiddenFeatureSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of a key. Returns the new hidden state.
    pub fn toggle(&mut self, key: &FeatureKey) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.clone());
            true
        }
    }

    /// Mark a key hidden.
    pub fn insert(&mut self, key: FeatureKey) -> bool {
        self.keys.insert(key)
    }

    /// Whether a key is hidden.
    pub fn contains(&self, key: &FeatureKey) -> bool {
        self.keys.contains(key)
    }

    /// Drop keys that no longer belong to any feature.
    pub fn prune(&mut self, live: &[FeatureRange]) -> usize {
        let before = self.keys.len();
        self.keys
            .retain(|key| live.iter().any(|range| &range.feature_key == key));
        before - self.keys.len()
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Number of hidden keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is hidden.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Hidden keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureKey> {
        self.keys.iter()
    }

    /// Copy of the membership for history snapshots.
    pub fn snapshot(&self) -> Vec<FeatureKey> {
        self.keys.iter().cloned().collect()
    }

    /// Replace the membership from a snapshot.
    pub fn restore(&mut self, keys: Vec<FeatureKey>) {
        self.keys = keys.into_iter().collect();
    }
}
