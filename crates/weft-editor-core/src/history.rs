//! Snapshot-based undo/redo.
//!
//! Provides:
//! - `UndoManager` trait for anything that can undo and redo
//! - `History`, two bounded stacks of serialized document snapshots
//!
//! A snapshot is taken before each user change; it only becomes an undo
//! entry once the change is complete and actually altered the document.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::types::{ChangeOrigin, Selection};

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Document state recorded for undo: canonical markup plus the selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub html: String,
    pub selection: Selection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    enabled: bool,
    capacity: usize,
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    /// Snapshot taken before the change currently being handled.
    #[serde(skip)]
    pending: Option<HistoryEntry>,
}

impl History {
    pub fn new(config: &EditorConfig) -> Result<Self, EditorError> {
        config.validate()?;
        Ok(Self {
            enabled: config.history_enabled,
            capacity: config.history_size,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            pending: None,
        })
    }

    /// Change whether history is recorded and how many entries are kept.
    /// Disabling drops all entries.
    pub fn configure(&mut self, enabled: bool, capacity: usize) -> Result<(), EditorError> {
        EditorConfig {
            history_enabled: enabled,
            history_size: capacity,
        }
        .validate()?;
        self.enabled = enabled;
        self.capacity = capacity;
        if enabled {
            trim_front(&mut self.undo_stack, capacity);
            trim_front(&mut self.redo_stack, capacity);
        } else {
            self.clear();
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remember the state before a change. Only the first snapshot of a
    /// change counts; replayed and nested changes are not recorded.
    pub fn before_text_changed(&mut self, snapshot: HistoryEntry, origin: ChangeOrigin) {
        if !self.enabled || !origin.records_history() || self.pending.is_some() {
            return;
        }
        self.pending = Some(snapshot);
    }

    /// Turn the pending snapshot into an undo entry unless the change left
    /// the document as it was. Returns whether an entry was pushed.
    pub fn handle_history(&mut self, current: &HistoryEntry) -> bool {
        let Some(before) = self.pending.take() else {
            return false;
        };
        if before.html == current.html {
            return false;
        }
        self.redo_stack.clear();
        self.undo_stack.push_back(before);
        trim_front(&mut self.undo_stack, self.capacity);
        tracing::debug!(
            target: "weft::history",
            undo = self.undo_stack.len(),
            "recorded undo entry"
        );
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop a pending snapshot without recording it.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Pop the entry to restore, keeping `current` for redo.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        trim_front(&mut self.redo_stack, self.capacity);
        tracing::debug!(
            target: "weft::history",
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "undo"
        );
        Some(entry)
    }

    /// Pop the entry to restore, keeping `current` for undo.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(current);
        trim_front(&mut self.undo_stack, self.capacity);
        tracing::debug!(
            target: "weft::history",
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "redo"
        );
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }
}

fn trim_front(stack: &mut VecDeque<HistoryEntry>, capacity: usize) {
    while stack.len() > capacity {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(html: &str, caret: usize) -> HistoryEntry {
        HistoryEntry {
            html: html.to_owned(),
            selection: Selection::collapsed(caret),
        }
    }

    fn record(history: &mut History, before: &str, after: &str) -> bool {
        history.before_text_changed(entry(before, 0), ChangeOrigin::User);
        history.handle_history(&entry(after, 0))
    }

    #[test]
    fn undo_then_redo_moves_entries() {
        let mut history = History::new(&EditorConfig::default()).unwrap();
        assert!(record(&mut history, "", "a"));
        assert!(record(&mut history, "a", "ab"));

        let restored = history.undo(entry("ab", 2)).unwrap();
        assert_eq!(restored.html, "a");
        assert!(history.can_redo());
        let restored = history.redo(entry("a", 1)).unwrap();
        assert_eq!(restored, entry("ab", 2));
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let config = EditorConfig {
            history_enabled: true,
            history_size: 2,
        };
        let mut history = History::new(&config).unwrap();
        for (before, after) in [("", "a"), ("a", "ab"), ("ab", "abc")] {
            record(&mut history, before, after);
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.undo(entry("abc", 0)).unwrap().html, "ab");
        assert_eq!(history.undo(entry("ab", 0)).unwrap().html, "a");
        assert!(history.undo(entry("a", 0)).is_none());
    }

    #[test]
    fn no_op_changes_are_not_recorded() {
        let mut history = History::new(&EditorConfig::default()).unwrap();
        assert!(!record(&mut history, "same", "same"));
        assert!(!history.can_undo());
    }

    #[test]
    fn nested_and_replayed_changes_are_not_recorded() {
        let mut history = History::new(&EditorConfig::default()).unwrap();
        for origin in [ChangeOrigin::Nested, ChangeOrigin::Replay] {
            history.before_text_changed(entry("", 0), origin);
            assert!(!history.handle_history(&entry("x", 1)));
        }
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut history = History::new(&EditorConfig::default()).unwrap();
        record(&mut history, "", "a");
        history.undo(entry("a", 1));
        record(&mut history, "", "b");
        assert!(!history.can_redo());
    }

    #[test]
    fn zero_capacity_is_a_configuration_error() {
        let mut history = History::new(&EditorConfig::default()).unwrap();
        assert!(matches!(
            history.configure(true, 0),
            Err(EditorError::Configuration { .. })
        ));
        history.configure(false, 0).unwrap();
        assert!(!history.is_enabled());
        assert!(!record(&mut history, "", "a"));
    }
}
