//! Formatters: short-lived services that borrow a [`Document`] to answer
//! "is this range formatted" and to toggle formatting on and off.
//!
//! - [`inline`] for character styles,
//! - [`block`] for lists and quotes, plus line-break handling inside them,
//! - [`line_block`] for headings and paragraphs,
//! - [`link`] for hyperlinks,
//! - [`object`] for media and comment markers.

pub mod block;
pub mod inline;
pub mod line_block;
pub mod link;
pub mod object;

use std::ops::Range;

pub use block::{BlockFormatter, ListItemMarker, list_item_marker};
pub use inline::{AttributeMemo, InlineFormatter};
pub use line_block::LineBlockFormatter;
pub use link::LinkFormatter;
pub use object::ObjectFormatter;

use crate::document::Document;
use crate::format::{Format, FormatCategory};
use crate::span::Span;
pub(crate) use crate::span::{cut_block, cut_inline};
use crate::text::TextBuffer;
use crate::types::normalize_range;

/// The range `contains` inspects.
///
/// A selection is used as is. For a caret: at the buffer start the first
/// character, right after a line break the character after the caret,
/// otherwise the character before it.
pub fn probe_range<T: TextBuffer + ?Sized>(text: &T, start: usize, end: usize) -> Range<usize> {
    if start < end {
        return start..end;
    }
    let len = text.len_chars();
    if len == 0 {
        return start..start;
    }
    if start == 0 {
        0..1
    } else if text.char_at(start - 1) == Some('\n') {
        start..(start + 1).min(len)
    } else {
        start - 1..start
    }
}

/// Whether `format` applies to `start..end` (or to the caret at `start`).
pub fn contains(doc: &Document, format: Format, start: usize, end: usize) -> bool {
    let range = normalize_range(start, end, doc.len_chars());
    match format.category() {
        FormatCategory::Inline => inline::contains(doc, format, range),
        FormatCategory::Link => link::contains_link(doc, range),
        FormatCategory::Container | FormatCategory::Line => {
            block::contains_block(doc, format, range)
        }
        FormatCategory::Media | FormatCategory::Comment => {
            let probe = probe_range(doc.text(), range.start, range.end);
            doc.spans().of_format(format).any(|s| s.overlaps(&probe))
        }
    }
}

/// Whether a block span shares a line with the line range `lines`.
pub(crate) fn touches_lines(span: &Span, lines: &Range<usize>) -> bool {
    span.start <= lines.end && lines.start <= span.end
}

/// `start..end` grown to whole lines, from the first touched line start to
/// the last touched line end.
pub(crate) fn whole_lines<T: TextBuffer + ?Sized>(text: &T, start: usize, end: usize) -> Range<usize> {
    let lines = crate::span::line_ranges(text, start, end);
    let first = lines.first().map_or(0, |l| l.start);
    let last = lines.last().map_or(0, |l| l.end);
    first..last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::EditorRope;

    #[test]
    fn caret_looks_at_neighbouring_char() {
        let text = EditorRope::from_str("ab\ncd");
        assert_eq!(probe_range(&text, 0, 0), 0..1);
        assert_eq!(probe_range(&text, 2, 2), 1..2);
        assert_eq!(probe_range(&text, 3, 3), 3..4);
        assert_eq!(probe_range(&text, 5, 5), 4..5);
        assert_eq!(probe_range(&text, 1, 4), 1..4);
    }

    #[test]
    fn cutting_lines_out_of_a_block() {
        let span = Span::new(Format::Quote, 0, 8);
        let pieces = cut_block(&span, &(3..5));
        let ranges: Vec<_> = pieces.iter().map(Span::range).collect();
        assert_eq!(ranges, vec![0..2, 6..8]);
        assert!(cut_block(&span, &(0..8)).is_empty());
    }

    #[test]
    fn cutting_a_range_out_of_an_inline_span() {
        let span = Span::new(Format::Bold, 2, 9);
        let ranges: Vec<_> = cut_inline(&span, &(4..6)).iter().map(Span::range).collect();
        assert_eq!(ranges, vec![2..4, 6..9]);
        assert!(cut_inline(&span, &(0..10)).is_empty());
    }
}
