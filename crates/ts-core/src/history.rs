//! Bounded linear undo/redo over full snapshots.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::LedgerSnapshot;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

const fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Undo/redo stacks of whole snapshots.
///
/// The engine knows nothing about history; undo simply swaps a previous
/// snapshot back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    past: VecDeque<LedgerSnapshot>,
    #[serde(default)]
    future: Vec<LedgerSnapshot>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            past: VecDeque::new(),
            future: Vec::new(),
        }
    }

    /// Records the snapshot that an edit is about to replace.
    ///
    /// Drops the oldest entry beyond the limit and clears the redo stack.
    pub fn record(&mut self, previous: LedgerSnapshot) {
        if self.limit == 0 {
            return;
        }
        self.past.push_back(previous);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Steps back, returning the snapshot to restore.
    pub fn undo(&mut self, current: LedgerSnapshot) -> Option<LedgerSnapshot> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Steps forward again after an undo.
    pub fn redo(&mut self, current: LedgerSnapshot) -> Option<LedgerSnapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Applies a new limit, trimming the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        while self.past.len() > limit {
            self.past.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> LedgerSnapshot {
        LedgerSnapshot {
            name: name.to_string(),
            ..LedgerSnapshot::default()
        }
    }

    #[test]
    fn undo_then_redo_restores() {
        let mut history = History::default();
        history.record(named("v1"));
        let current = named("v2");

        let restored = history.undo(current).unwrap();
        assert_eq!(restored.name, "v1");
        assert!(history.can_redo());

        let again = history.redo(restored).unwrap();
        assert_eq!(again.name, "v2");
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut history = History::default();
        history.record(named("v1"));
        let restored = history.undo(named("v2")).unwrap();
        history.record(restored);
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_history_has_nothing_to_undo() {
        let mut history = History::default();
        assert!(history.undo(named("v1")).is_none());
        assert!(history.redo(named("v1")).is_none());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(named(&format!("v{i}")));
        }
        assert_eq!(history.undo_depth(), 3);

        let mut current = named("v5");
        let mut seen = Vec::new();
        while let Some(previous) = history.undo(current.clone()) {
            seen.push(previous.name.clone());
            current = previous;
        }
        assert_eq!(seen, vec!["v4", "v3", "v2"]);
    }

    #[test]
    fn shrinking_limit_trims() {
        let mut history = History::default();
        for i in 0..10 {
            history.record(named(&format!("v{i}")));
        }
        history.set_limit(4);
        assert_eq!(history.undo_depth(), 4);
    }

    #[test]
    fn history_roundtrips_through_json() {
        let mut history = History::new(7);
        history.record(named("v1"));
        let json = serde_json::to_string(&history).unwrap();
        let parsed: History = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
