//! Document state shared by the editor and its formatters.
//!
//! A [`Document`] pairs the text buffer with its [`SpanSet`]. Every mutation
//! goes through [`Document::splice`], which shifts the spans along with the
//! text, so the two can never drift apart. Formatters borrow the document for
//! the duration of one operation.

use std::ops::Range;

use smol_str::SmolStr;

use crate::span::{Span, SpanSet};
use crate::text::{EditorRope, TextBuffer};
use crate::types::{TextChange, normalize_range};

#[derive(Clone, Debug, Default)]
pub struct Document {
    text: EditorRope,
    spans: SpanSet,
    /// Edits issued by formatters since the counter was last taken.
    nested_edits: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document from text and spans in any order; spans are canonicalized.
    pub fn from_parts(text: &str, spans: Vec<Span>) -> Self {
        let mut doc = Self {
            text: EditorRope::from_str(text),
            spans: SpanSet::from_spans(spans),
            nested_edits: 0,
        };
        doc.canonicalize();
        doc
    }

    pub fn text(&self) -> &EditorRope {
        &self.text
    }

    pub fn spans(&self) -> &SpanSet {
        &self.spans
    }

    pub fn spans_mut(&mut self) -> &mut SpanSet {
        &mut self.spans
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len_chars() == 0
    }

    pub fn content(&self) -> String {
        self.text.to_string()
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.char_at(offset)
    }

    /// Text of `range`, clamped to the buffer.
    pub fn slice(&self, range: Range<usize>) -> SmolStr {
        let range = normalize_range(range.start, range.end, self.len_chars());
        self.text.slice(range).unwrap_or_default()
    }

    pub fn canonicalize(&mut self) {
        self.spans.canonicalize(&self.text);
    }

    /// Replace `range` with `text` and shift spans accordingly.
    ///
    /// Spans are left uncanonicalized so that callers can adjust them before
    /// invariants are restored.
    pub fn splice(&mut self, range: Range<usize>, text: &str) -> TextChange {
        let range = normalize_range(range.start, range.end, self.len_chars());
        let change = TextChange::new(range.start, range.len(), text.chars().count());
        if change.is_noop() {
            return change;
        }
        self.text.replace(range, text);
        self.spans.apply_edit(change);
        change
    }

    /// An edit issued while handling another one. Spans are canonicalized
    /// right away and the edit is counted so the tree gets rebuilt.
    pub fn nested_replace(&mut self, range: Range<usize>, text: &str) -> TextChange {
        let change = self.splice(range, text);
        if change.is_noop() {
            return change;
        }
        self.canonicalize();
        self.nested_edits += 1;
        tracing::trace!(target: "weft::edit", ?change, "nested edit");
        change
    }

    /// Number of nested edits since the last call; resets the counter.
    pub fn take_nested_edits(&mut self) -> usize {
        std::mem::take(&mut self.nested_edits)
    }

    /// Replace the whole text, keeping whatever spans still fit.
    pub fn reset_text(&mut self, text: &str) {
        self.text = EditorRope::from_str(text);
        self.canonicalize();
        self.nested_edits += 1;
    }

    pub fn has_media(&self) -> bool {
        self.spans.iter().any(|s| s.format.media_kind().is_some())
    }
}
