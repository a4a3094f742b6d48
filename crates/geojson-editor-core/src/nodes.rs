//! Collapsible node index.
//!
//! Every JSON object or array whose brackets sit on different lines is a *node*. Nodes are
//! identified by the attribute key that introduced them plus their occurrence order among nodes
//! with the same key, so a node keeps its [`NodeId`] (and therefore its collapsed state) across
//! edits as long as the same `(key, nth)` pair still resolves to a bracket pair.
//!
//! The index also owns the collapsed set. Lines strictly between a collapsed node's start and end
//! line are hidden; the start and end lines themselves stay visible.

use crate::scanner::{Token, closing_for, tokenize_line};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Context key used for the implicit array that wraps the feature list.
pub const ROOT_KEY: &str = "$root";

/// Stable node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// A collapsible object/array span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Stable identifier.
    pub id: NodeId,
    /// Attribute name that introduced this node, or [`ROOT_KEY`] for features.
    pub key: String,
    /// Occurrence order among nodes sharing `key` (document order).
    pub occurrence: usize,
    /// Line holding the opening bracket.
    pub start_line: usize,
    /// Char column of the opening bracket.
    pub start_column: usize,
    /// Line holding the closing bracket.
    pub end_line: usize,
    /// Char column of the closing bracket.
    pub end_column: usize,
    /// `'{'` or `'['`.
    pub open_bracket: char,
    /// Nesting depth among nodes (0 for features).
    pub depth: usize,
    /// Nearest enclosing node.
    pub parent: Option<NodeId>,
}

impl Node {
    /// Whether `line` lies strictly between the start and end line.
    pub fn hides_line(&self, line: usize) -> bool {
        line > self.start_line && line < self.end_line
    }

    /// Whether `line` is within `[start_line, end_line]`.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Result of a [`NodeIndex::rebuild`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildOutcome {
    /// Whether all brackets matched. When `false`, no nodes were produced.
    pub balanced: bool,
    /// Ids that resolved before the rebuild but no longer do.
    pub dropped: Vec<NodeId>,
    /// Ids minted by this rebuild.
    pub minted: Vec<NodeId>,
}

struct RawSpan {
    key: String,
    open: char,
    start: (usize, usize),
    end: Option<(usize, usize)>,
    parent_slot: Option<usize>,
}

/// Node index with identity matching and the collapsed set.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    /// Nodes in document order (by opening bracket position).
    nodes: Vec<Node>,
    /// `(key, occurrence) -> id` mapping from the last balanced scan.
    ids_by_key: HashMap<(String, usize), NodeId>,
    next_id: u32,
    balanced: bool,
    collapsed: BTreeSet<NodeId>,
}

impl NodeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            balanced: true,
            ..Self::default()
        }
    }

    /// Re-scan the buffer and match the found ranges against the previous identities.
    ///
    /// When the brackets are unbalanced no nodes are produced at all. The previous identities and
    /// the collapsed set are kept dormant so they resume once the buffer balances again.
    pub fn rebuild(&mut self, lines: &[String]) -> RebuildOutcome {
        let Some(spans) = scan_spans(lines) else {
            self.nodes.clear();
            self.balanced = false;
            return RebuildOutcome {
                balanced: false,
                ..RebuildOutcome::default()
            };
        };

        // Only multi-line spans are nodes; map each slot to its registered node index.
        let mut slot_to_node: Vec<Option<usize>> = vec![None; spans.len()];
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut ids_by_key: HashMap<(String, usize), NodeId> = HashMap::new();
        let mut nodes: Vec<Node> = Vec::new();
        let mut minted = Vec::new();

        for (slot, span) in spans.iter().enumerate() {
            let Some(end) = span.end else {
                continue;
            };
            if end.0 <= span.start.0 {
                continue;
            }

            let occurrence = {
                let count = occurrences.entry(span.key.clone()).or_insert(0);
                let current = *count;
                *count += 1;
                current
            };

            let pair = (span.key.clone(), occurrence);
            let id = match self.ids_by_key.get(&pair) {
                Some(id) => *id,
                None => {
                    let id = NodeId(self.next_id);
                    self.next_id = self.next_id.wrapping_add(1);
                    minted.push(id);
                    id
                }
            };
            ids_by_key.insert(pair, id);

            // Walk up to the nearest registered ancestor.
            let mut parent_slot = span.parent_slot;
            let mut parent = None;
            while let Some(p) = parent_slot {
                if let Some(node_idx) = slot_to_node[p] {
                    parent = Some(node_idx);
                    break;
                }
                parent_slot = spans[p].parent_slot;
            }

            let (depth, parent) = match parent {
                Some(p) => (nodes[p].depth + 1, Some(nodes[p].id)),
                None => (0, None),
            };
            slot_to_node[slot] = Some(nodes.len());
            nodes.push(Node {
                id,
                key: span.key.clone(),
                occurrence,
                start_line: span.start.0,
                start_column: span.start.1,
                end_line: end.0,
                end_column: end.1,
                open_bracket: span.open,
                depth,
                parent,
            });
        }

        let live: HashSet<NodeId> = ids_by_key.values().copied().collect();
        let dropped: Vec<NodeId> = self
            .ids_by_key
            .values()
            .copied()
            .filter(|id| !live.contains(id))
            .collect();

        self.collapsed.retain(|id| live.contains(id));
        self.ids_by_key = ids_by_key;
        self.nodes = nodes;
        self.balanced = true;

        RebuildOutcome {
            balanced: true,
            dropped,
            minted,
        }
    }

    /// All nodes in document order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Whether the last scan found balanced brackets.
    pub fn is_balanced(&self) -> bool {
        self.balanced
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Top-level nodes (features).
    pub fn root_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.parent.is_none())
    }

    /// The outermost node whose opening bracket is on `line`.
    pub fn node_at_line(&self, line: usize) -> Option<&Node> {
        self.nodes.iter().find(|n| n.start_line == line)
    }

    /// Whether `ancestor` encloses `node` (strictly).
    pub fn is_ancestor(&self, ancestor: NodeId, node: &Node) -> bool {
        let mut current = node.parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Number of collapsed nodes.
    pub fn collapsed_count(&self) -> usize {
        self.collapsed.len()
    }

    /// Whether a node is collapsed.
    pub fn is_collapsed(&self, id: NodeId) -> bool {
        self.collapsed.contains(&id)
    }

    /// Toggle a node. Returns `false` (no-op) when the id does not resolve to a live node.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        true
    }

    /// Collapse a node. Returns `false` when the id does not resolve or is already collapsed.
    pub fn collapse(&mut self, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.collapsed.insert(id)
    }

    /// Expand a node. Returns `false` when it was not collapsed.
    pub fn expand(&mut self, id: NodeId) -> bool {
        self.collapsed.remove(&id)
    }

    /// Collapse every live node.
    pub fn collapse_all(&mut self) {
        self.collapsed.extend(self.nodes.iter().map(|n| n.id));
    }

    /// Expand every node.
    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    /// Collapsed nodes that are currently live.
    pub fn collapsed_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|n| self.collapsed.contains(&n.id))
    }

    /// Whether `line` is hidden by some collapsed node.
    pub fn is_line_hidden(&self, line: usize) -> bool {
        self.collapsed_nodes().any(|n| n.hides_line(line))
    }

    /// The outermost collapsed node hiding `line`.
    pub fn hiding_node(&self, line: usize) -> Option<&Node> {
        self.collapsed_nodes().find(|n| n.hides_line(line))
    }

    /// The outermost collapsed node whose opening bracket is on `line`.
    pub fn collapsed_starting_at(&self, line: usize) -> Option<&Node> {
        self.collapsed_nodes().find(|n| n.start_line == line)
    }

    /// The outermost collapsed node whose closing bracket is on `line`.
    pub fn collapsed_ending_at(&self, line: usize) -> Option<&Node> {
        self.collapsed_nodes().find(|n| n.end_line == line)
    }
}

/// Single pass over all tokens: bracket spans with the key that introduced them.
///
/// Returns `None` for unbalanced input (mismatched, stray or unclosed brackets).
fn scan_spans(lines: &[String]) -> Option<Vec<RawSpan>> {
    let mut spans: Vec<RawSpan> = Vec::new();
    let mut open_slots: Vec<usize> = Vec::new();
    // Keys of enclosing brackets; keyless elements inherit them.
    let mut contexts: Vec<String> = vec![ROOT_KEY.to_string()];
    let mut last_string: Option<String> = None;
    let mut pending_key: Option<String> = None;

    for (line_idx, line) in lines.iter().enumerate() {
        for token in tokenize_line(line) {
            match token {
                Token::Str { value, .. } => last_string = Some(value),
                Token::Colon => pending_key = last_string.take(),
                Token::Comma => {
                    last_string = None;
                    pending_key = None;
                }
                Token::Open { bracket, column } => {
                    let key = match pending_key.take() {
                        Some(key) => key,
                        None => contexts
                            .last()
                            .cloned()
                            .unwrap_or_else(|| ROOT_KEY.to_string()),
                    };
                    last_string = None;

                    spans.push(RawSpan {
                        key: key.clone(),
                        open: bracket,
                        start: (line_idx, column),
                        end: None,
                        parent_slot: open_slots.last().copied(),
                    });
                    open_slots.push(spans.len() - 1);
                    contexts.push(key);
                }
                Token::Close { bracket, column } => {
                    let slot = open_slots.pop()?;
                    if closing_for(spans[slot].open) != Some(bracket) {
                        return None;
                    }
                    spans[slot].end = Some((line_idx, column));
                    contexts.pop();
                    last_string = None;
                    pending_key = None;
                }
            }
        }
    }

    if !open_slots.is_empty() {
        return None;
    }

    Some(spans)
}
