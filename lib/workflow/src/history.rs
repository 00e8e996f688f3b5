//! Undo/redo history of graph snapshots.
//!
//! History is a bounded list of immutable snapshots with a cursor. The
//! entry under the cursor is the current graph. Checkpointing after the
//! cursor has been moved back discards the redo branch.

use crate::graph::WorkflowGraph;
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of snapshots kept by default, including the current one.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Snapshot history with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Arc<WorkflowGraph>>,
    cursor: usize,
    limit: usize,
}

impl History {
    /// Starts a history whose only entry is `initial`.
    ///
    /// A limit below 1 is treated as 1.
    #[must_use]
    pub fn new(initial: Arc<WorkflowGraph>, limit: usize) -> Self {
        let mut entries = VecDeque::with_capacity(limit.clamp(1, DEFAULT_HISTORY_LIMIT));
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Records a new current snapshot.
    pub fn checkpoint(&mut self, snapshot: Arc<WorkflowGraph>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Steps back one snapshot and returns it.
    pub fn undo(&mut self) -> Option<Arc<WorkflowGraph>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Steps forward one snapshot and returns it.
    pub fn redo(&mut self) -> Option<Arc<WorkflowGraph>> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Replaces the snapshot under the cursor without adding an entry.
    ///
    /// Used for changes that should not be undoable on their own, such as
    /// writing run results onto nodes.
    pub fn replace_current(&mut self, snapshot: Arc<WorkflowGraph>) {
        if let Some(entry) = self.entries.get_mut(self.cursor) {
            *entry = snapshot;
        }
    }

    /// Drops all entries and starts over from `initial`.
    pub fn reset(&mut self, initial: Arc<WorkflowGraph>) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn snapshot(ids: &[&str]) -> Arc<WorkflowGraph> {
        let nodes = ids.iter().map(|id| Node::new(*id, "1", "test", *id)).collect();
        Arc::new(WorkflowGraph::assemble(nodes, Vec::new()).expect("assemble"))
    }

    #[test]
    fn undo_and_redo_restore_exact_snapshots() {
        let empty = snapshot(&[]);
        let one = snapshot(&["a"]);
        let two = snapshot(&["a", "b"]);
        let mut history = History::new(Arc::clone(&empty), DEFAULT_HISTORY_LIMIT);
        history.checkpoint(Arc::clone(&one));
        history.checkpoint(Arc::clone(&two));

        assert!(Arc::ptr_eq(&history.undo().expect("undo"), &one));
        assert!(Arc::ptr_eq(&history.undo().expect("undo"), &empty));
        assert!(history.undo().is_none());
        assert!(Arc::ptr_eq(&history.redo().expect("redo"), &one));
        assert!(Arc::ptr_eq(&history.redo().expect("redo"), &two));
        assert!(history.redo().is_none());
    }

    #[test]
    fn checkpoint_discards_redo_branch() {
        let mut history = History::new(snapshot(&[]), DEFAULT_HISTORY_LIMIT);
        history.checkpoint(snapshot(&["a"]));
        history.checkpoint(snapshot(&["a", "b"]));
        history.undo();

        history.checkpoint(snapshot(&["a", "c"]));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        let back = history.undo().expect("undo");
        assert_eq!(back.node_count(), 1);
    }

    #[test]
    fn history_is_capped_dropping_oldest() {
        let mut history = History::new(snapshot(&[]), 3);
        for i in 0..5 {
            let id = format!("n{i}");
            history.checkpoint(snapshot(&[id.as_str()]));
        }

        assert_eq!(history.len(), 3);
        let mut steps = 0;
        while history.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 2);
    }

    #[test]
    fn replace_current_does_not_add_an_entry() {
        let mut history = History::new(snapshot(&[]), DEFAULT_HISTORY_LIMIT);
        history.checkpoint(snapshot(&["a"]));
        let replaced = snapshot(&["a", "z"]);
        history.replace_current(Arc::clone(&replaced));

        assert_eq!(history.len(), 2);
        history.undo();
        assert!(Arc::ptr_eq(&history.redo().expect("redo"), &replaced));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut history = History::new(snapshot(&[]), DEFAULT_HISTORY_LIMIT);
        history.checkpoint(snapshot(&["a"]));
        history.reset(snapshot(&["b"]));

        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
