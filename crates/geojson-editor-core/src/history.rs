//! Snapshot-based undo/redo with time-windowed grouping.
//!
//! Every mutating action records the state *before* it mutates. Consecutive actions of the same
//! groupable kind inside the grouping window do not push a new entry, so the entry recorded by
//! the first action of the run stays the rollback target for the whole run.

use crate::cursor::Position;
use crate::features::FeatureKey;
use std::fmt;

/// Kind of a mutating action, used for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Typed text.
    Insert,
    /// Backspace / delete / selection delete.
    Delete,
    /// Line break.
    Newline,
    /// Clipboard paste.
    Paste,
    /// Clipboard cut.
    Cut,
    /// Inline color or boolean control edit.
    InlineEdit,
    /// Features API call.
    Api,
}

impl ActionKind {
    /// Whether consecutive actions of this kind may merge into one undo step.
    pub fn is_groupable(self) -> bool {
        matches!(self, Self::Insert | Self::Delete | Self::InlineEdit)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Newline => "newline",
            Self::Paste => "paste",
            Self::Cut => "cut",
            Self::InlineEdit => "inline-edit",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

/// A restorable editor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Full copy of the buffer lines.
    pub lines: Vec<String>,
    /// Cursor at snapshot time.
    pub cursor: Position,
    /// Clock time of the snapshot in milliseconds.
    pub timestamp: u64,
    /// Hidden-feature membership.
    pub hidden: Vec<FeatureKey>,
}

/// Undo/redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_undo: usize,
    group_window_ms: u64,
    last_action: Option<(ActionKind, u64)>,
}

impl History {
    /// Create empty stacks.
    pub fn new(max_undo: usize, group_window_ms: u64) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
            group_window_ms,
            last_action: None,
        }
    }

    /// Whether there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is a step to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(entry);
    }

    /// Record the state before a mutating action.
    ///
    /// `snapshot` is only called when a new entry is pushed. Returns whether one was.
    pub fn record(
        &mut self,
        kind: ActionKind,
        now: u64,
        snapshot: impl FnOnce() -> HistoryEntry,
    ) -> bool {
        self.redo_stack.clear();

        let grouped = kind.is_groupable()
            && !self.undo_stack.is_empty()
            && matches!(
                self.last_action,
                Some((last, at)) if last == kind && now.saturating_sub(at) < self.group_window_ms
            );

        self.last_action = Some((kind, now));
        if grouped {
            return false;
        }

        self.push_undo(snapshot());
        true
    }

    /// Close the current group so the next action always pushes.
    pub fn end_group(&mut self) {
        self.last_action = None;
    }

    /// Pop the newest entry, saving `current` for redo.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.end_group();
        Some(entry)
    }

    /// Pop the newest redo entry, saving `current` for undo.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.push_undo(current);
        self.end_group();
        Some(entry)
    }

    /// Empty both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.end_group();
    }
}
