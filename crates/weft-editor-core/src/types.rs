//! Core editor types: selection, text changes and edit tracking.
//!
//! These types are independent of the text buffer implementation.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Check if an offset is within the selection.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    /// Clamp both ends into `0..=len`, keeping the direction.
    pub fn clamped(&self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

/// Ordered, clamped `start..end` from two possibly swapped offsets.
pub fn normalize_range(start: usize, end: usize, len: usize) -> Range<usize> {
    let (a, b) = if end < start { (end, start) } else { (start, end) };
    a.min(len)..b.min(len)
}

/// A text mutation described by offsets, as delivered to the two-phase
/// change callbacks: `deleted` chars starting at `start` are replaced by
/// `inserted` chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub start: usize,
    pub deleted: usize,
    pub inserted: usize,
}

impl TextChange {
    pub fn new(start: usize, deleted: usize, inserted: usize) -> Self {
        Self {
            start,
            deleted,
            inserted,
        }
    }

    pub fn insertion(start: usize, inserted: usize) -> Self {
        Self::new(start, 0, inserted)
    }

    pub fn deletion(range: Range<usize>) -> Self {
        Self::new(range.start, range.len(), 0)
    }

    /// Length change applied to offsets after the edit.
    pub fn delta(&self) -> isize {
        self.inserted as isize - self.deleted as isize
    }

    /// End of the deleted region in pre-edit coordinates.
    pub fn old_end(&self) -> usize {
        self.start + self.deleted
    }

    /// End of the inserted region in post-edit coordinates.
    pub fn new_end(&self) -> usize {
        self.start + self.inserted
    }

    pub fn is_noop(&self) -> bool {
        self.deleted == 0 && self.inserted == 0
    }
}

/// Where a mutation comes from.
///
/// Passed explicitly down the mutation pipeline in place of a global
/// "currently handling a change" flag. Only `User` changes are captured by
/// history and re-run the line-break formatters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChangeOrigin {
    /// Typing, pasting or an explicit host request.
    #[default]
    User,
    /// A change issued by the engine while it handles another change.
    Nested,
    /// Undo/redo replay or a document load.
    Replay,
}

impl ChangeOrigin {
    pub fn records_history(self) -> bool {
        matches!(self, ChangeOrigin::User)
    }

    pub fn runs_formatters(self) -> bool {
        matches!(self, ChangeOrigin::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        // Forward selection
        let sel = Selection::new(5, 10);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert!(!sel.is_backwards());

        // Backward selection
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert!(sel.is_backwards());
    }

    #[test]
    fn test_selection_collapsed() {
        let sel = Selection::collapsed(7);
        assert!(sel.is_collapsed());
        assert!(sel.is_empty());
        assert_eq!(sel.len(), 0);
        assert_eq!(sel.to_range(), 7..7);
    }

    #[test]
    fn test_selection_contains() {
        let sel = Selection::new(5, 10);
        assert!(!sel.contains(4));
        assert!(sel.contains(5));
        assert!(sel.contains(9));
        assert!(!sel.contains(10)); // end is exclusive
    }

    #[test]
    fn test_selection_clamped() {
        let sel = Selection::new(40, 2).clamped(10);
        assert_eq!(sel, Selection::new(10, 2));
        assert!(sel.is_backwards());
    }

    #[test]
    fn test_normalize_range_swaps_and_clamps() {
        assert_eq!(normalize_range(8, 3, 100), 3..8);
        assert_eq!(normalize_range(3, 80, 10), 3..10);
        assert_eq!(normalize_range(50, 60, 10), 10..10);
    }

    #[test]
    fn test_text_change_delta() {
        let change = TextChange::new(4, 3, 1);
        assert_eq!(change.delta(), -2);
        assert_eq!(change.old_end(), 7);
        assert_eq!(change.new_end(), 5);
        assert!(!change.is_noop());
        assert!(TextChange::insertion(3, 0).is_noop());
    }

    #[test]
    fn test_change_origin_guards() {
        assert!(ChangeOrigin::User.records_history());
        assert!(!ChangeOrigin::Nested.records_history());
        assert!(!ChangeOrigin::Replay.runs_formatters());
    }
}
