//! The editor instance.
//!
//! [`GeoJsonEditor`] owns the buffer and every structure derived from it. Each entry point
//! fully updates buffer, node index, feature ranges and projections before returning, so callers
//! never observe a half-updated state. Change/error emission is debounced and driven by
//! [`GeoJsonEditor::poll`]; repaints are coalesced through a frame scheduler.

use crate::buffer::Buffer;
use crate::config::EditorOptions;
use crate::cursor::{
    self, ArrowKey, HomeEnd, Modifiers, Position, Selection, snap_to_visible,
};
use crate::events::{EditorEvent, EventCallback};
use crate::features::{FeatureKey, FeatureRange, HiddenFeatureSet, compute_feature_ranges};
use crate::history::{ActionKind, History, HistoryEntry};
use crate::nodes::{Node, NodeId, NodeIndex};
use crate::projection::{
    LineMeta, ScrollMetrics, ViewportWindow, VisibleLine, compute_line_metadata,
    compute_visible_lines, compute_window, display_column, visible_index,
};
use crate::schedule::{Clock, Debouncer, FrameScheduler, SystemClock};
use tracing::{debug, trace};

/// Cursor or selection end translated to rendering coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisiblePosition {
    /// Row in the visible line sequence.
    pub row: usize,
    /// Char column on the line.
    pub column: usize,
    /// Display column (wide chars count twice).
    pub display_column: usize,
}

/// Slice of visible lines to paint.
#[derive(Debug, Clone, Copy)]
pub struct Viewport<'a> {
    /// Rows covered by `lines`.
    pub window: ViewportWindow,
    /// Lines of the window.
    pub lines: &'a [VisibleLine],
    /// Total number of visible rows.
    pub total_rows: usize,
}

pub(crate) fn snapshot_of(
    buffer: &Buffer,
    cursor: Position,
    hidden: &HiddenFeatureSet,
    now: u64,
) -> HistoryEntry {
    HistoryEntry {
        lines: buffer.lines().to_vec(),
        cursor,
        timestamp: now,
        hidden: hidden.snapshot(),
    }
}

/// Structured-text editor for a GeoJSON feature list.
pub struct GeoJsonEditor {
    pub(crate) options: EditorOptions,
    pub(crate) buffer: Buffer,
    pub(crate) cursor: Position,
    pub(crate) selection: Option<Selection>,
    pub(crate) nodes: NodeIndex,
    pub(crate) feature_ranges: Vec<FeatureRange>,
    pub(crate) hidden: HiddenFeatureSet,
    pub(crate) line_meta: Vec<LineMeta>,
    pub(crate) visible: Vec<VisibleLine>,
    pub(crate) history: History,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) emit_timer: Debouncer,
    pub(crate) frames: FrameScheduler,
    pub(crate) callbacks: Vec<EventCallback>,
    pub(crate) last_event: Option<EditorEvent>,
    pub(crate) version: u64,
}

impl std::fmt::Debug for GeoJsonEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoJsonEditor")
            .field("line_count", &self.buffer.line_count())
            .field("cursor", &self.cursor)
            .field("selection", &self.selection)
            .field("collapsed", &self.nodes.collapsed_count())
            .field("hidden_features", &self.hidden.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Default for GeoJsonEditor {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}

impl GeoJsonEditor {
    /// Create an empty editor driven by the system clock.
    pub fn new(options: EditorOptions) -> Self {
        Self::with_clock(options, SystemClock::new())
    }

    /// Create an empty editor with a custom clock.
    pub fn with_clock(options: EditorOptions, clock: impl Clock + 'static) -> Self {
        let mut editor = Self {
            history: History::new(options.history_limit, options.group_window_ms),
            emit_timer: Debouncer::new(options.emit_debounce_ms),
            options,
            buffer: Buffer::new(),
            cursor: Position::default(),
            selection: None,
            nodes: NodeIndex::new(),
            feature_ranges: Vec::new(),
            hidden: HiddenFeatureSet::new(),
            line_meta: Vec::new(),
            visible: Vec::new(),
            clock: Box::new(clock),
            frames: FrameScheduler::new(),
            callbacks: Vec::new(),
            last_event: None,
            version: 0,
        };
        editor.recompute();
        editor
    }

    /// Create an editor holding `text` as typed (no formatting, no history).
    pub fn from_text(text: &str, options: EditorOptions) -> Self {
        let mut editor = Self::new(options);
        editor.buffer = Buffer::from_text(text);
        editor.recompute();
        editor
    }

    // ----- queries -----

    /// Options in effect.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Buffer lines.
    pub fn lines(&self) -> &[String] {
        self.buffer.lines()
    }

    /// Buffer text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Number of buffer lines.
    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// Cursor position (buffer coordinates).
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Current selection, if any.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// All collapsible nodes.
    pub fn nodes(&self) -> &[Node] {
        self.nodes.nodes()
    }

    /// Ids of collapsed nodes, in document order. Empty while the brackets are unbalanced.
    pub fn collapsed_nodes(&self) -> Vec<NodeId> {
        self.nodes.collapsed_nodes().map(|node| node.id).collect()
    }

    /// Whether a live node is collapsed.
    pub fn is_collapsed(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some() && self.nodes.is_collapsed(id)
    }

    /// Top-level feature ranges.
    pub fn feature_ranges(&self) -> &[FeatureRange] {
        &self.feature_ranges
    }

    /// Per-line metadata.
    pub fn line_meta(&self) -> &[LineMeta] {
        &self.line_meta
    }

    /// The full visible line sequence.
    pub fn visible_lines(&self) -> &[VisibleLine] {
        &self.visible
    }

    /// Hidden feature keys.
    pub fn hidden_features(&self) -> Vec<FeatureKey> {
        self.hidden.snapshot()
    }

    /// Whether a feature is hidden.
    pub fn is_feature_hidden(&self, key: &FeatureKey) -> bool {
        self.hidden.contains(key)
    }

    /// Whether there is a step to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether there is a step to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Last emitted signal.
    pub fn last_event(&self) -> Option<&EditorEvent> {
        self.last_event.as_ref()
    }

    /// Counter bumped by every buffer mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Outermost node starting on `line`.
    pub fn node_at_line(&self, line: usize) -> Option<&Node> {
        self.nodes.node_at_line(line)
    }

    // ----- derived state -----

    /// Rebuild node index, feature ranges and projections from the buffer.
    pub(crate) fn recompute(&mut self) {
        let outcome = self.nodes.rebuild(self.buffer.lines());
        if outcome.balanced {
            self.feature_ranges = compute_feature_ranges(self.buffer.lines());
            let pruned = self.hidden.prune(&self.feature_ranges);
            if pruned > 0 {
                debug!(pruned, "dropped hidden keys of removed features");
            }
        } else {
            self.feature_ranges.clear();
        }
        self.refresh_projection();
        debug!(
            lines = self.buffer.line_count(),
            nodes = self.nodes.nodes().len(),
            features = self.feature_ranges.len(),
            balanced = outcome.balanced,
            dropped = outcome.dropped.len(),
            minted = outcome.minted.len(),
            "recomputed"
        );
    }

    /// Recompute metadata and visible lines only (collapse or visibility changed).
    pub(crate) fn refresh_projection(&mut self) {
        self.line_meta = compute_line_metadata(
            self.buffer.lines(),
            &self.nodes,
            &self.feature_ranges,
            &self.hidden,
        );
        self.visible = compute_visible_lines(self.buffer.lines(), &self.line_meta);
        self.frames.request();
    }

    /// Push a history entry for an action about to mutate the buffer.
    pub(crate) fn record(&mut self, kind: ActionKind) {
        let now = self.clock.now_ms();
        let pushed = self.history.record(kind, now, || {
            snapshot_of(&self.buffer, self.cursor, &self.hidden, now)
        });
        trace!(%kind, pushed, "history");
    }

    /// Common tail of every buffer mutation.
    pub(crate) fn after_edit(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.recompute();
        self.cursor = snap_to_visible(self.buffer.lines(), &self.nodes, self.cursor);
        self.emit_timer.schedule(self.clock.now_ms());
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.buffer.set_lines(entry.lines);
        self.hidden.restore(entry.hidden);
        self.cursor = entry.cursor;
        self.selection = None;
        self.after_edit();
    }

    // ----- history -----

    /// Restore the state before the newest undo step.
    pub fn undo(&mut self) -> bool {
        let now = self.clock.now_ms();
        let current = snapshot_of(&self.buffer, self.cursor, &self.hidden, now);
        match self.history.undo(current) {
            Some(entry) => {
                debug!(at = entry.timestamp, "undo");
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    /// Re-apply the newest undone step.
    pub fn redo(&mut self) -> bool {
        let now = self.clock.now_ms();
        let current = snapshot_of(&self.buffer, self.cursor, &self.hidden, now);
        match self.history.redo(current) {
            Some(entry) => {
                debug!(at = entry.timestamp, "redo");
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    /// Empty both history stacks. The buffer is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ----- collapse and visibility -----

    /// Flip a node's collapsed state. Unknown ids are a no-op returning `false`.
    pub fn toggle_collapse(&mut self, id: NodeId) -> bool {
        if !self.nodes.toggle(id) {
            return false;
        }
        self.after_collapse_change();
        true
    }

    /// Collapse every node.
    pub fn collapse_all(&mut self) {
        self.nodes.collapse_all();
        self.after_collapse_change();
    }

    /// Expand every node.
    pub fn expand_all(&mut self) {
        self.nodes.expand_all();
        self.after_collapse_change();
    }

    /// Collapse the outermost `coordinates` nodes. Does nothing unless the buffer parses.
    ///
    /// Returns the number of nodes collapsed.
    pub fn auto_collapse_coordinates(&mut self) -> usize {
        if crate::format::parse_features(&self.buffer.text()).is_err() {
            return 0;
        }
        let keys = ["coordinates".to_string()];
        let collapsed = self.collapse_outermost(&keys, None);
        if collapsed > 0 {
            self.after_collapse_change();
        }
        collapsed
    }

    /// Collapse the outermost nodes whose key is in `keys`, optionally within a line range.
    pub(crate) fn collapse_outermost(
        &mut self,
        keys: &[String],
        within: Option<(usize, usize)>,
    ) -> usize {
        let matches = |node: &Node| keys.iter().any(|k| *k == node.key);
        let targets: Vec<NodeId> = self
            .nodes
            .nodes()
            .iter()
            .filter(|node| {
                within.is_none_or(|(start, end)| node.start_line >= start && node.end_line <= end)
            })
            .filter(|node| matches(node))
            .filter(|node| {
                !self
                    .nodes
                    .nodes()
                    .iter()
                    .any(|other| matches(other) && self.nodes.is_ancestor(other.id, node))
            })
            .map(|node| node.id)
            .collect();

        targets
            .into_iter()
            .filter(|id| self.nodes.collapse(*id))
            .count()
    }

    fn after_collapse_change(&mut self) {
        self.refresh_projection();
        self.cursor = snap_to_visible(self.buffer.lines(), &self.nodes, self.cursor);
        if let Some(selection) = self.selection {
            self.selection = Some(Selection::new(
                snap_to_visible(self.buffer.lines(), &self.nodes, selection.start),
                snap_to_visible(self.buffer.lines(), &self.nodes, selection.end),
            ));
        }
    }

    /// Flip whether a feature is excluded from emitted output. Unknown keys return `false`.
    pub fn toggle_feature_visibility(&mut self, key: &FeatureKey) -> bool {
        if !self.feature_ranges.iter().any(|r| &r.feature_key == key) {
            return false;
        }
        let hidden = self.hidden.toggle(key);
        debug!(feature = %key, hidden, "feature visibility");
        self.refresh_projection();
        self.emit_timer.schedule(self.clock.now_ms());
        true
    }

    // ----- cursor and selection -----

    /// Move the cursor (clamped and moved out of collapsed content). Clears the selection.
    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = snap_to_visible(self.buffer.lines(), &self.nodes, pos);
        self.selection = None;
        self.frames.request();
    }

    /// Select from `anchor` to `head`; the cursor follows `head`.
    pub fn set_selection(&mut self, anchor: Position, head: Position) {
        let anchor = self.buffer.clamp(anchor);
        let head = self.buffer.clamp(head);
        self.cursor = head;
        self.selection = (anchor != head).then(|| Selection::new(anchor, head));
        self.frames.request();
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let end = self.buffer.end_position();
        self.selection = Some(Selection::new(Position::new(0, 0), end));
        self.cursor = end;
        self.frames.request();
    }

    fn move_cursor_to(&mut self, target: Position, extend: bool) {
        if extend {
            let anchor = self.selection.map(|s| s.start).unwrap_or(self.cursor);
            self.selection = (anchor != target).then(|| Selection::new(anchor, target));
        } else {
            self.selection = None;
        }
        self.cursor = target;
        self.frames.request();
    }

    /// Arrow key navigation.
    pub fn handle_arrow_key(&mut self, key: ArrowKey, modifiers: Modifiers) {
        if !modifiers.shift
            && !modifiers.word
            && !modifiers.document
            && matches!(key, ArrowKey::Left | ArrowKey::Right)
            && let Some(selection) = self.selection.filter(|s| !s.is_empty())
        {
            let (start, end) = selection.normalized();
            let target = if key == ArrowKey::Left { start } else { end };
            self.move_cursor_to(target, false);
            return;
        }

        let target = cursor::arrow(
            self.buffer.lines(),
            &self.nodes,
            self.cursor,
            key,
            modifiers,
        );
        self.move_cursor_to(target, modifiers.shift);
    }

    /// Home / End navigation.
    pub fn handle_home_end(&mut self, key: HomeEnd, modifiers: Modifiers) {
        let target = cursor::home_end(self.buffer.lines(), self.cursor, key, modifiers);
        self.move_cursor_to(target, modifiers.shift);
    }

    // ----- rendering -----

    /// Visible row of a buffer line. Hidden lines map to the row of their collapsed node.
    pub fn to_visible_index(&self, buffer_line: usize) -> Option<usize> {
        visible_index(&self.visible, buffer_line)
    }

    fn visible_position(&self, pos: Position) -> Option<VisiblePosition> {
        let row = self.to_visible_index(pos.line)?;
        let line = self.buffer.line(pos.line).unwrap_or("");
        Some(VisiblePosition {
            row,
            column: pos.column,
            display_column: display_column(line, pos.column),
        })
    }

    /// Cursor in rendering coordinates.
    pub fn cursor_visible_position(&self) -> Option<VisiblePosition> {
        self.visible_position(self.cursor)
    }

    /// Normalized selection in rendering coordinates.
    pub fn selection_visible_range(&self) -> Option<(VisiblePosition, VisiblePosition)> {
        let (start, end) = self.selection?.normalized();
        Some((self.visible_position(start)?, self.visible_position(end)?))
    }

    /// Window of visible lines for a scroll position.
    pub fn viewport(&self, metrics: ScrollMetrics) -> Viewport<'_> {
        let window = compute_window(metrics, self.visible.len(), self.options.overscan_lines);
        Viewport {
            window,
            lines: &self.visible[window.start..window.end],
            total_rows: self.visible.len(),
        }
    }

    // ----- scheduling -----

    /// Register a change/error subscriber.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Host-loop hook: fires the debounced emission when due. Returns whether a repaint is
    /// waiting (see [`take_frame`](Self::take_frame)).
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now_ms();
        if self.emit_timer.fire_if_due(now) {
            let event = self.run_pipeline();
            self.dispatch(event);
        }
        self.frames.is_pending() && !self.frames.is_blocked()
    }

    /// Whether an emission is scheduled.
    pub fn has_pending_emit(&self) -> bool {
        self.emit_timer.is_pending()
    }

    /// Consume the pending repaint. `false` while rendering is blocked or nothing changed.
    pub fn take_frame(&mut self) -> bool {
        self.frames.take()
    }

    /// Suppress repaints while an inline control is mid-interaction.
    pub fn set_render_blocked(&mut self, blocked: bool) {
        self.frames.set_blocked(blocked);
    }
}
