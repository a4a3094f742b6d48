//! Features API and persistence.
//!
//! Programmatic writes validate their whole input before touching the buffer and fail with a
//! [`FeatureError`] otherwise, so a bad batch never partially applies. Every write is one undo
//! step.

use crate::buffer::split_lines;
use crate::cursor::Position;
use crate::editor::GeoJsonEditor;
use crate::error::FeatureError;
use crate::features::feature_keys;
use crate::format::{format_features, format_value, parse_features};
use crate::geojson::{ensure_valid, feature_collection, normalize_input};
use crate::history::ActionKind;
use crate::nodes::ROOT_KEY;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Chooses attribute names to collapse for one feature (`feature`, `index`).
pub type CollapseFn = Arc<dyn Fn(&Value, usize) -> Vec<String> + Send + Sync>;

/// Which nodes start collapsed after an API write.
///
/// Every variant except [`CollapseSpec::None`] replaces the collapsed set.
#[derive(Clone)]
pub enum CollapseSpec {
    /// Collapse the outermost nodes with any of these keys (may include `$root`).
    Keys(Vec<String>),
    /// Collapse every feature.
    Root,
    /// Ask per feature.
    PerFeature(CollapseFn),
    /// Leave collapse state alone.
    None,
}

impl CollapseSpec {
    /// Collapse nodes with the given keys.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Decide per feature.
    pub fn per_feature<F>(f: F) -> Self
    where
        F: Fn(&Value, usize) -> Vec<String> + Send + Sync + 'static,
    {
        Self::PerFeature(Arc::new(f))
    }
}

impl Default for CollapseSpec {
    fn default() -> Self {
        Self::keys(["coordinates"])
    }
}

impl fmt::Debug for CollapseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keys(keys) => f.debug_tuple("Keys").field(keys).finish(),
            Self::Root => f.write_str("Root"),
            Self::PerFeature(_) => f.write_str("PerFeature(..)"),
            Self::None => f.write_str("None"),
        }
    }
}

/// A serialized document ready to be written by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    /// Suggested file name.
    pub file_name: String,
    /// Pretty-printed `FeatureCollection`.
    pub content: String,
}

/// Resolve a possibly negative index against `len`. `None` when out of range.
fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index.unsigned_abs()
    };
    (resolved < len).then_some(resolved)
}

/// Resolve an insertion index, clamping to `[0, len]`.
fn clamp_insert_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

impl GeoJsonEditor {
    /// The collapse spec built from [`EditorOptions::default_collapse`](crate::EditorOptions).
    pub fn default_collapse(&self) -> CollapseSpec {
        CollapseSpec::Keys(self.options.default_collapse.clone())
    }

    fn validated_input(input: Value) -> Result<Vec<Value>, FeatureError> {
        let features = normalize_input(input).inspect_err(|err| warn!(%err, "rejected input"))?;
        ensure_valid(&features).inspect_err(|err| warn!(%err, "rejected input"))?;
        Ok(features)
    }

    fn current_features(&self) -> Result<Vec<Value>, FeatureError> {
        parse_features(&self.buffer.text())
            .map_err(|failure| FeatureError::InvalidDocument(failure.to_string()))
    }

    /// Hidden flag of every feature in `features`, by position.
    fn hidden_flags(&self, features: &[Value]) -> Vec<bool> {
        feature_keys(features)
            .iter()
            .map(|key| self.hidden.contains(key))
            .collect()
    }

    /// Replace the buffer with `features` as one undoable step.
    ///
    /// `hidden` carries per-position hidden flags for writes that shift features, so identical
    /// features keep their own visibility instead of trading keys.
    fn write_features(
        &mut self,
        features: &[Value],
        hidden: Option<Vec<bool>>,
        collapse: &CollapseSpec,
    ) {
        self.record(ActionKind::Api);
        let text = format_features(features, self.options.indent_width);
        self.buffer.set_lines(split_lines(&text));
        if let Some(flags) = hidden {
            let keys = feature_keys(features)
                .into_iter()
                .zip(flags)
                .filter_map(|(key, is_hidden)| is_hidden.then_some(key))
                .collect();
            self.hidden.restore(keys);
        }
        self.cursor = Position::new(0, 0);
        self.selection = None;
        self.after_edit();
        let mut collapsed = 0;
        if !matches!(collapse, CollapseSpec::None) {
            // Ids are positional, so stale collapses would land on the new document's nodes.
            self.nodes.expand_all();
            collapsed = self.apply_collapse(collapse, features);
            self.refresh_projection();
        }
        debug!(features = features.len(), collapsed, "features written");
    }

    /// Apply a collapse spec to the current buffer. Returns the number of nodes collapsed.
    pub(crate) fn apply_collapse(&mut self, spec: &CollapseSpec, features: &[Value]) -> usize {
        match spec {
            CollapseSpec::None => 0,
            CollapseSpec::Keys(keys) => self.collapse_outermost(keys, None),
            CollapseSpec::Root => self.collapse_outermost(&[ROOT_KEY.to_string()], None),
            CollapseSpec::PerFeature(choose) => {
                let ranges: Vec<(usize, usize, usize)> = self
                    .feature_ranges
                    .iter()
                    .map(|r| (r.feature_index, r.start_line, r.end_line))
                    .collect();
                ranges
                    .into_iter()
                    .filter_map(|(index, start, end)| {
                        let feature = features.get(index)?;
                        let keys = choose(feature, index);
                        Some(self.collapse_outermost(&keys, Some((start, end))))
                    })
                    .sum()
            }
        }
    }

    /// Replace the document with `input` (feature, feature array or feature collection).
    pub fn set(&mut self, input: Value, collapse: &CollapseSpec) -> Result<(), FeatureError> {
        let features = Self::validated_input(input)?;
        self.write_features(&features, None, collapse);
        Ok(())
    }

    /// Append features. The current buffer must parse.
    pub fn add(&mut self, input: Value, collapse: &CollapseSpec) -> Result<(), FeatureError> {
        let added = Self::validated_input(input)?;
        let mut features = self.current_features()?;
        features.extend(added);
        self.write_features(&features, None, collapse);
        Ok(())
    }

    /// Insert features at `index` (negative counts from the end; clamped).
    pub fn insert_at(
        &mut self,
        input: Value,
        index: isize,
        collapse: &CollapseSpec,
    ) -> Result<(), FeatureError> {
        let inserted = Self::validated_input(input)?;
        let mut features = self.current_features()?;
        let at = clamp_insert_index(index, features.len());
        let mut hidden = self.hidden_flags(&features);
        hidden.splice(at..at, std::iter::repeat_n(false, inserted.len()));
        features.splice(at..at, inserted);
        self.write_features(&features, Some(hidden), collapse);
        Ok(())
    }

    /// Remove the feature at `index` (negative counts from the end).
    ///
    /// Returns `Ok(None)` without touching anything when the index is out of range.
    pub fn remove_at(
        &mut self,
        index: isize,
        collapse: &CollapseSpec,
    ) -> Result<Option<Value>, FeatureError> {
        let mut features = self.current_features()?;
        let Some(at) = resolve_index(index, features.len()) else {
            return Ok(None);
        };
        let mut hidden = self.hidden_flags(&features);
        hidden.remove(at);
        let removed = features.remove(at);
        self.write_features(&features, Some(hidden), collapse);
        Ok(Some(removed))
    }

    /// Clear the document, the collapsed set and the hidden-feature set.
    pub fn remove_all(&mut self) {
        self.record(ActionKind::Api);
        self.buffer.set_lines(Vec::new());
        self.cursor = Position::new(0, 0);
        self.selection = None;
        self.nodes.expand_all();
        self.hidden.clear();
        self.after_edit();
    }

    /// Feature at `index` (negative counts from the end). `None` when out of range or while
    /// the buffer does not parse.
    pub fn get(&self, index: isize) -> Option<Value> {
        let mut features = self.current_features().ok()?;
        let at = resolve_index(index, features.len())?;
        Some(features.swap_remove(at))
    }

    /// All features, hidden ones included. Empty while the buffer does not parse.
    pub fn get_all(&self) -> Vec<Value> {
        self.current_features().unwrap_or_default()
    }

    /// Serialize the document without hidden features.
    pub fn save(&self, file_name: Option<&str>) -> Result<SavedDocument, FeatureError> {
        let features = self.current_features()?;
        let keys = feature_keys(&features);
        let visible: Vec<Value> = features
            .into_iter()
            .zip(keys)
            .filter(|(_, key)| !self.hidden.contains(key))
            .map(|(feature, _)| feature)
            .collect();
        let content = format_value(&feature_collection(visible), self.options.indent_width);
        Ok(SavedDocument {
            file_name: file_name
                .map(str::to_string)
                .unwrap_or_else(|| self.options.save_file_name.clone()),
            content,
        })
    }

    /// Load a document from text. Returns the number of features loaded.
    pub fn open(&mut self, text: &str) -> Result<usize, FeatureError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| FeatureError::Parse(err.to_string()))?;
        let features = Self::validated_input(value)?;
        let count = features.len();
        let collapse = self.default_collapse();
        self.write_features(&features, None, &collapse);
        Ok(count)
    }
}
