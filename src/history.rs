//! Snapshot-based undo/redo.
//!
//! A [HistoryItem] is taken before every user-visible mutating action. Snapshots hold full
//! collections by value, which is sound because graph operations never mutate a collection
//! once it has been returned.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{graph::Edges, ids::NodeId, properties::ConversationNode};

/// Default number of undo steps kept.
pub const MAX_HISTORY_SIZE: usize = 256;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub nodes: Vec<ConversationNode>,
    pub edges: Edges,
    pub selected_node_id: Option<NodeId>,
    pub last_selected_node_id: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct History {
    past: VecDeque<HistoryItem>,
    future: Vec<HistoryItem>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        History::new(MAX_HISTORY_SIZE)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        History {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Oldest first.
    pub fn past(&self) -> impl ExactSizeIterator<Item = &HistoryItem> {
        self.past.iter()
    }

    /// Next redo step last.
    pub fn future(&self) -> &[HistoryItem] {
        &self.future
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Record the state as it was before an action. Drops the oldest entries beyond
    /// `max_depth` and invalidates every redo step.
    pub fn take_snapshot(&mut self, item: HistoryItem) {
        self.past.push_back(item);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        if !self.future.is_empty() {
            tracing::debug!(
                "[History::take_snapshot] discarding {} redo steps",
                self.future.len()
            );
            self.future.clear();
        }
    }

    /// Step back. `current` is the live state, which becomes the next redo step. Returns the
    /// state to restore, or `None` (and leaves the history untouched) when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: HistoryItem) -> Option<HistoryItem> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward again after an [History::undo].
    pub fn redo(&mut self, current: HistoryItem) -> Option<HistoryItem> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{add_edge, add_node, NodeParams},
        properties::NodeKind,
        tests::helpers::id,
    };
    use test_log::test;

    fn state(n: usize) -> HistoryItem {
        let mut nodes = Vec::new();
        for i in 0..n {
            nodes = add_node(
                &nodes,
                NodeParams::new(NodeKind::User, 0.0, 0.0, "").with_id(id(&format!("n{i}"))),
            );
        }
        HistoryItem {
            nodes,
            selected_node_id: (n > 0).then(|| id(&format!("n{}", n - 1))),
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_then_undo_restores_exactly() {
        let mut history = History::default();
        let before = state(1);
        history.take_snapshot(before.clone());

        let mut after = state(2);
        after.edges = add_edge(&after.edges, id("n0"), id("n1"), false);

        let restored = history.undo(after.clone()).unwrap();
        assert_eq!(restored, before);

        let redone = history.redo(restored).unwrap();
        assert_eq!(redone, after);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_noop_when_empty() {
        let mut history = History::default();
        assert!(history.undo(state(1)).is_none());
        assert!(history.redo(state(1)).is_none());
        assert!(!history.can_redo());
        assert_eq!(history.past().len(), 0);
    }

    #[test]
    fn test_depth_bounded_keeps_most_recent_in_order() {
        let mut history = History::new(3);
        for n in 0..5 {
            history.take_snapshot(state(n));
        }
        let kept: Vec<usize> = history.past().map(|item| item.nodes.len()).collect();
        assert_eq!(kept, vec![2, 3, 4]);
    }

    #[test]
    fn test_new_snapshot_clears_future() {
        let mut history = History::default();
        history.take_snapshot(state(0));
        let restored = history.undo(state(1)).unwrap();
        assert!(history.can_redo());

        history.take_snapshot(restored);
        assert!(!history.can_redo());
        assert!(history.redo(state(2)).is_none());
    }
}
