//! Formatting spans over the text buffer.
//!
//! A [`SpanSet`] is the flat, authoritative description of formatting. It
//! shifts with every text edit ([`SpanSet::apply_edit`]) and is brought back
//! to its invariants by [`SpanSet::canonicalize`]:
//!
//! - block spans start on a line start and end on a line end (the offset of
//!   the terminating `\n` or the buffer end);
//! - same-style inline spans never overlap or touch;
//! - links never contain a line break, and no inline span contains a line
//!   break implied by a block boundary;
//! - media and comment spans cover exactly one object character;
//! - a comment marker shares no span with its neighbours: inline styles and
//!   links skip it and the breaks around it, blocks skip its line.

use std::cmp::Reverse;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attributes::AttributeBag;
use crate::format::{Format, FormatCategory, OBJECT_CHAR};
use crate::text::TextBuffer;
use crate::types::TextChange;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub format: Format,
    /// Tag the span was parsed from, or the format's canonical tag.
    pub tag: SmolStr,
    pub attributes: AttributeBag,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(format: Format, start: usize, end: usize) -> Self {
        Self {
            format,
            tag: SmolStr::new_static(format.canonical_tag()),
            attributes: AttributeBag::new(),
            start,
            end,
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeBag) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<SmolStr>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Same format, tag and attributes.
    pub fn same_style(&self, other: &Span) -> bool {
        self.format == other.format && self.tag == other.tag && self.attributes == other.attributes
    }

    pub fn covers(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }

    /// Start of span after an edit, following the format's boundary policy.
    fn map_start(&self, change: &TextChange) -> usize {
        let policy = self.format.boundary();
        let (s, e) = (change.start, change.old_end());
        if self.start < s {
            self.start
        } else if self.start < e {
            s
        } else if self.start == e {
            if policy.start_inclusive {
                s
            } else {
                change.new_end()
            }
        } else {
            (self.start as isize + change.delta()) as usize
        }
    }

    fn map_end(&self, change: &TextChange) -> usize {
        let policy = self.format.boundary();
        let (s, e) = (change.start, change.old_end());
        if self.end < s {
            self.end
        } else if self.end <= e {
            if policy.end_inclusive {
                change.new_end()
            } else {
                s
            }
        } else {
            (self.end as isize + change.delta()) as usize
        }
    }
}

/// Ordered collection of spans for one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSet {
    spans: Vec<Span>,
}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spans(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    pub fn into_vec(self) -> Vec<Span> {
        self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn push(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn extend(&mut self, spans: impl IntoIterator<Item = Span>) {
        self.spans.extend(spans);
    }

    pub fn retain(&mut self, f: impl FnMut(&Span) -> bool) {
        self.spans.retain(f);
    }

    /// Remove and return every span matching `pred`.
    pub fn take_where(&mut self, mut pred: impl FnMut(&Span) -> bool) -> Vec<Span> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if pred(&span) {
                taken.push(span);
            } else {
                kept.push(span);
            }
        }
        self.spans = kept;
        taken
    }

    /// Replace every span matching `pred` with the pieces `f` returns, at the
    /// same position. Returns how many spans were replaced.
    ///
    /// Position matters for container spans sharing a range: the canonical
    /// sort is stable, so a list must stay ahead of its own item.
    pub fn replace_where(
        &mut self,
        mut pred: impl FnMut(&Span) -> bool,
        mut f: impl FnMut(&Span) -> Vec<Span>,
    ) -> usize {
        let mut replaced = 0;
        let mut out = Vec::with_capacity(self.spans.len());
        for span in std::mem::take(&mut self.spans) {
            if pred(&span) {
                replaced += 1;
                out.extend(f(&span));
            } else {
                out.push(span);
            }
        }
        self.spans = out;
        replaced
    }

    /// Replace the first span equal to `target` with `with`, in place.
    pub fn replace_first(&mut self, target: &Span, with: Vec<Span>) -> bool {
        match self.spans.iter().position(|s| s == target) {
            Some(i) => {
                self.spans.splice(i..i + 1, with);
                true
            }
            None => false,
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Span> {
        self.spans.iter_mut()
    }

    pub fn of_format(&self, format: Format) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |s| s.format == format)
    }

    /// Spans sharing at least one position with `range`. Zero-length ranges
    /// match spans that contain the position or start there.
    pub fn overlapping(&self, range: Range<usize>) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |s| {
            if range.is_empty() {
                s.start <= range.start && range.start <= s.end
            } else {
                s.overlaps(&range)
            }
        })
    }

    /// Shift and clip spans for a text edit.
    ///
    /// Spans before the edit are untouched, spans after it move by the
    /// length delta and spans overlapping it are clipped according to their
    /// boundary policy. A span emptied by the deleted part of a replacement
    /// takes over the inserted text.
    pub fn apply_edit(&mut self, change: TextChange) {
        if change.is_noop() {
            return;
        }
        let (s, e) = (change.start, change.old_end());
        for span in &mut self.spans {
            let emptied_by_replacement = change.deleted > 0
                && change.inserted > 0
                && span.start < span.end
                && span.start >= s
                && span.end <= e;
            let (start, end) = if emptied_by_replacement {
                (s, change.new_end())
            } else {
                let start = span.map_start(&change);
                (start, span.map_end(&change).max(start))
            };
            if (start, end) != (span.start, span.end) {
                tracing::trace!(
                    target: "weft::edit",
                    format = %span.format,
                    from = ?(span.start..span.end),
                    to = ?(start..end),
                    "span shifted"
                );
            }
            span.start = start;
            span.end = end;
        }
    }

    /// Restore span invariants against the current text.
    pub fn canonicalize<T: TextBuffer + ?Sized>(&mut self, text: &T) {
        let len = text.len_chars();
        let mut out: Vec<Span> = Vec::with_capacity(self.spans.len());
        let mut objects: Vec<usize> = Vec::new();

        for mut span in std::mem::take(&mut self.spans) {
            if span.end < span.start {
                std::mem::swap(&mut span.start, &mut span.end);
            }
            span.start = span.start.min(len);
            span.end = span.end.min(len);

            match span.format.category() {
                FormatCategory::Inline => {
                    if !span.is_empty() {
                        out.push(span);
                    }
                }
                FormatCategory::Link => split_link(span, text, &mut out),
                FormatCategory::Media | FormatCategory::Comment => {
                    let owned = span.len() == 1 && text.char_at(span.start) == Some(OBJECT_CHAR);
                    if owned && !objects.contains(&span.start) {
                        objects.push(span.start);
                        out.push(span);
                    } else {
                        tracing::trace!(
                            target: "weft::edit",
                            format = %span.format,
                            range = ?span.range(),
                            "dropping object span without its own object character"
                        );
                    }
                }
                FormatCategory::Container | FormatCategory::Line => {
                    if let Some(span) = align_block(span, text) {
                        out.push(span);
                    }
                }
            }
        }

        let markers: Vec<usize> = out
            .iter()
            .filter(|s| s.format.category() == FormatCategory::Comment)
            .map(|s| s.start)
            .collect();
        if !markers.is_empty() {
            out = isolate_markers(out, &markers, text);
        }
        let breaks = structural_breaks(|i| text.char_at(i), &out);
        if !breaks.is_empty() {
            out = split_at_breaks(out, &breaks);
        }

        let mut merged = merge_inline(out);
        dedupe_lines(&mut merged);
        merged.sort_by_key(|s| (s.start, Reverse(s.end), s.format.rank()));
        self.spans = merged;
        self.check_invariants(text);
    }

    fn check_invariants<T: TextBuffer + ?Sized>(&mut self, text: &T) {
        let len = text.len_chars();
        for span in &mut self.spans {
            let misaligned = span.format.is_block()
                && (!text.is_line_start(span.start) || !text.is_line_end(span.end));
            if span.end > len || misaligned {
                tracing::error!(
                    target: "weft::edit",
                    format = %span.format,
                    range = ?span.range(),
                    len,
                    "span invariant violated after canonicalization"
                );
                debug_assert!(false, "span invariant violated: {span:?}");
                span.end = span.end.min(len);
                span.start = span.start.min(span.end);
            }
        }
    }

    /// True if `pos` is covered by a span of `format`.
    pub fn covered_by(&self, format: Format, pos: usize) -> bool {
        self.spans
            .iter()
            .any(|s| s.format == format && s.covers(pos))
    }

    /// True if a comment marker sits at `pos`.
    pub fn comment_at(&self, pos: usize) -> bool {
        self.spans
            .iter()
            .any(|s| s.format.category() == FormatCategory::Comment && s.start == pos)
    }

    /// Innermost span of one of the given formats whose lines include `pos`.
    ///
    /// Block spans are matched inclusively at both ends, so a caret at the
    /// end of a line still belongs to that line's block.
    pub fn block_at(&self, pos: usize, pred: impl Fn(Format) -> bool) -> Option<&Span> {
        self.spans
            .iter()
            .filter(|s| pred(s.format) && s.start <= pos && pos <= s.end)
            .min_by_key(|s| s.len())
    }
}

impl<'a> IntoIterator for &'a SpanSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Ranges of the lines touched by `start..end`, each excluding its `\n`.
///
/// A non-empty range ending right after a line break does not touch the
/// following line.
pub fn line_ranges<T: TextBuffer + ?Sized>(text: &T, start: usize, end: usize) -> Vec<Range<usize>> {
    let len = text.len_chars();
    let start = start.min(len);
    let end = end.min(len).max(start);
    let last = if end > start { end - 1 } else { start };

    let mut lines = Vec::new();
    let mut line_start = text.line_start(start);
    loop {
        let line_end = text.line_end(line_start);
        lines.push(line_start..line_end);
        if line_end >= last || line_end >= len {
            break;
        }
        line_start = line_end + 1;
    }
    lines
}

fn split_link<T: TextBuffer + ?Sized>(span: Span, text: &T, out: &mut Vec<Span>) {
    let mut piece_start = span.start;
    for pos in span.start..span.end {
        if text.char_at(pos) == Some('\n') {
            if pos > piece_start {
                out.push(Span {
                    start: piece_start,
                    end: pos,
                    ..span.clone()
                });
            }
            piece_start = pos + 1;
        }
    }
    if span.end > piece_start {
        out.push(Span {
            start: piece_start,
            ..span
        });
    }
}

/// Offsets of the `\n` chars implied by block boundaries rather than written
/// as `<br>`: the break right after a block, and the one right before a
/// block unless it follows another break. Sorted, without duplicates.
pub fn structural_breaks(char_at: impl Fn(usize) -> Option<char>, spans: &[Span]) -> Vec<usize> {
    let mut breaks = Vec::new();
    for span in spans.iter().filter(|s| s.format.is_block()) {
        if char_at(span.end) == Some('\n') {
            breaks.push(span.end);
        }
        if span.start >= 2
            && char_at(span.start - 1) == Some('\n')
            && char_at(span.start - 2) != Some('\n')
        {
            breaks.push(span.start - 1);
        }
    }
    breaks.sort_unstable();
    breaks.dedup();
    breaks
}

/// What is left of a block span after the whole lines `cut` are removed:
/// the lines above and the lines below.
pub(crate) fn cut_block(span: &Span, cut: &Range<usize>) -> Vec<Span> {
    let mut pieces = Vec::with_capacity(2);
    if span.start < cut.start {
        pieces.push(Span {
            end: cut.start - 1,
            ..span.clone()
        });
    }
    if span.end > cut.end {
        pieces.push(Span {
            start: cut.end + 1,
            ..span.clone()
        });
    }
    pieces
}

/// What is left of an inline span after `cut` is removed.
pub(crate) fn cut_inline(span: &Span, cut: &Range<usize>) -> Vec<Span> {
    let mut pieces = Vec::with_capacity(2);
    if span.start < cut.start {
        pieces.push(Span {
            end: cut.start.min(span.end),
            ..span.clone()
        });
    }
    if span.end > cut.end {
        pieces.push(Span {
            start: cut.end.max(span.start),
            ..span.clone()
        });
    }
    pieces
}

fn is_flowing(format: Format) -> bool {
    matches!(
        format.category(),
        FormatCategory::Inline | FormatCategory::Link
    )
}

/// Take every comment marker out of the other spans. Inline styles and links
/// lose the marker and the line breaks next to it; blocks lose the marker's
/// line when the marker has it to itself.
fn isolate_markers<T: TextBuffer + ?Sized>(
    mut spans: Vec<Span>,
    markers: &[usize],
    text: &T,
) -> Vec<Span> {
    for &at in markers {
        let before = at > 0 && text.char_at(at - 1) == Some('\n');
        let after = text.char_at(at + 1) == Some('\n');
        let around = at - usize::from(before)..at + 1 + usize::from(after);
        let own_line = text.is_line_start(at) && text.is_line_end(at + 1);
        let line = at..at + 1;

        spans = spans
            .into_iter()
            .flat_map(|span| {
                if is_flowing(span.format) && span.overlaps(&around) {
                    cut_inline(&span, &around)
                } else if span.format.is_block()
                    && own_line
                    && span.start <= line.end
                    && line.start <= span.end
                {
                    cut_block(&span, &line)
                } else {
                    vec![span]
                }
            })
            .collect();
    }
    spans
}

/// Split inline styles and links at the structural line breaks `breaks`.
fn split_at_breaks(spans: Vec<Span>, breaks: &[usize]) -> Vec<Span> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        if !is_flowing(span.format) {
            out.push(span);
            continue;
        }
        let first = breaks.partition_point(|&b| b < span.start);
        let mut piece_start = span.start;
        for &at in breaks[first..].iter().take_while(|&&b| b < span.end) {
            if at > piece_start {
                out.push(Span {
                    start: piece_start,
                    end: at,
                    ..span.clone()
                });
            }
            piece_start = at + 1;
        }
        if span.end > piece_start {
            out.push(Span {
                start: piece_start,
                ..span
            });
        }
    }
    out
}

fn align_block<T: TextBuffer + ?Sized>(mut span: Span, text: &T) -> Option<Span> {
    let len = text.len_chars();
    if !text.is_line_start(span.start) {
        let next = text.line_end(span.start) + 1;
        if next > len || next > span.end {
            tracing::trace!(
                target: "weft::edit",
                format = %span.format,
                range = ?span.range(),
                "dropping block merged into the line above"
            );
            return None;
        }
        span.start = next;
    }

    if span.start == span.end {
        let empty_line = text.line_end(span.start) == span.start;
        return empty_line.then_some(span);
    }

    span.end = text.line_end(span.end);
    Some(span)
}

fn merge_inline(spans: Vec<Span>) -> Vec<Span> {
    let (mergeable, mut rest): (Vec<Span>, Vec<Span>) =
        spans.into_iter().partition(|s| is_flowing(s.format));

    let mut groups: Vec<Vec<Span>> = Vec::new();
    for span in mergeable {
        match groups.iter_mut().find(|g| g[0].same_style(&span)) {
            Some(group) => group.push(span),
            None => groups.push(vec![span]),
        }
    }

    for mut group in groups {
        group.sort_by_key(|s| s.start);
        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };
        for span in iter {
            if span.start <= current.end {
                current.end = current.end.max(span.end);
            } else {
                rest.push(std::mem::replace(&mut current, span));
            }
        }
        rest.push(current);
    }
    rest
}

fn dedupe_lines(spans: &mut Vec<Span>) {
    let mut seen: Vec<(usize, usize, Format)> = Vec::new();
    spans.retain(|s| {
        if s.format.category() != FormatCategory::Line {
            return true;
        }
        let key = (s.start, s.end, s.format);
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HeadingLevel;
    use crate::text::EditorRope;

    fn set(spans: &[Span]) -> SpanSet {
        SpanSet::from_spans(spans.to_vec())
    }

    #[test]
    fn typing_at_inline_end_extends() {
        let mut spans = set(&[Span::new(Format::Bold, 0, 2)]);
        spans.apply_edit(TextChange::insertion(2, 3));
        assert_eq!(spans.as_slice()[0].range(), 0..5);
    }

    #[test]
    fn typing_at_inline_start_does_not_extend() {
        let mut spans = set(&[Span::new(Format::Bold, 2, 4)]);
        spans.apply_edit(TextChange::insertion(2, 1));
        assert_eq!(spans.as_slice()[0].range(), 3..5);
    }

    #[test]
    fn links_are_exclusive_at_both_ends() {
        let mut spans = set(&[Span::new(Format::Link, 2, 4)]);
        spans.apply_edit(TextChange::insertion(4, 1));
        assert_eq!(spans.as_slice()[0].range(), 2..4);
        spans.apply_edit(TextChange::insertion(2, 1));
        assert_eq!(spans.as_slice()[0].range(), 3..5);
    }

    #[test]
    fn blocks_absorb_typing_at_both_ends() {
        let mut spans = set(&[Span::new(Format::Quote, 0, 0)]);
        spans.apply_edit(TextChange::insertion(0, 3));
        assert_eq!(spans.as_slice()[0].range(), 0..3);
    }

    #[test]
    fn deletion_collapses_overlapping_spans() {
        let mut spans = set(&[Span::new(Format::Italic, 2, 8), Span::new(Format::Bold, 9, 10)]);
        spans.apply_edit(TextChange::deletion(4..9));
        assert_eq!(spans.as_slice()[0].range(), 2..4);
        assert_eq!(spans.as_slice()[1].range(), 4..5);
    }

    #[test]
    fn replacement_carries_style_over() {
        let mut spans = set(&[Span::new(Format::Link, 6, 11)]);
        spans.apply_edit(TextChange::new(6, 5, 3));
        assert_eq!(spans.as_slice()[0].range(), 6..9);
    }

    #[test]
    fn canonicalize_drops_empty_inline_spans() {
        let text = EditorRope::from_str("");
        let mut spans = set(&[Span::new(Format::Bold, 0, 1)]);
        spans.apply_edit(TextChange::deletion(0..1));
        spans.canonicalize(&text);
        assert!(spans.is_empty());
    }

    #[test]
    fn canonicalize_merges_touching_same_style() {
        let text = EditorRope::from_str("abcdef");
        let mut spans = set(&[
            Span::new(Format::Bold, 0, 2),
            Span::new(Format::Bold, 2, 4),
            Span::new(Format::Bold, 3, 5).with_tag("strong"),
        ]);
        spans.canonicalize(&text);
        let ranges: Vec<_> = spans.iter().map(|s| (s.range(), s.tag.clone())).collect();
        assert_eq!(
            ranges,
            vec![(0..4, SmolStr::from("b")), (3..5, SmolStr::from("strong"))]
        );
    }

    #[test]
    fn canonicalize_aligns_blocks_to_lines() {
        let text = EditorRope::from_str("abc\ndef\nghi");
        let mut spans = set(&[Span::new(Format::Quote, 0, 5)]);
        spans.canonicalize(&text);
        assert_eq!(spans.as_slice()[0].range(), 0..7);
    }

    #[test]
    fn merged_lines_keep_upper_block() {
        // "abc\ndef" with a heading on each line; delete the line break.
        let mut text = EditorRope::from_str("abc\ndef");
        let h1 = Format::Heading(HeadingLevel::H1);
        let h2 = Format::Heading(HeadingLevel::H2);
        let mut spans = set(&[Span::new(h1, 0, 3), Span::new(h2, 4, 7)]);
        text.delete(3..4);
        spans.apply_edit(TextChange::deletion(3..4));
        spans.canonicalize(&text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans.as_slice()[0].format, h1);
        assert_eq!(spans.as_slice()[0].range(), 0..6);
    }

    #[test]
    fn empty_block_survives_only_on_empty_line() {
        let text = EditorRope::from_str("a\n");
        let mut spans = set(&[
            Span::new(Format::Paragraph, 2, 2),
            Span::new(Format::Quote, 1, 1),
        ]);
        spans.canonicalize(&text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans.as_slice()[0].format, Format::Paragraph);
    }

    #[test]
    fn links_split_at_line_breaks() {
        let text = EditorRope::from_str("ab\ncd");
        let mut spans = set(&[Span::new(Format::Link, 0, 5)]);
        spans.canonicalize(&text);
        let ranges: Vec<_> = spans.iter().map(Span::range).collect();
        assert_eq!(ranges, vec![0..2, 3..5]);
    }

    #[test]
    fn inline_spans_stop_at_block_boundaries() {
        // Enter inside a bold heading: the heading was split, the bold not.
        let h2 = Format::Heading(HeadingLevel::H2);
        let text = EditorRope::from_str("ab\nc");
        let mut spans = set(&[
            Span::new(h2, 0, 2),
            Span::new(h2, 3, 4),
            Span::new(Format::Bold, 0, 4),
            Span::new(Format::Link, 1, 4),
        ]);
        spans.canonicalize(&text);
        let flowing: Vec<_> = spans
            .iter()
            .filter(|s| !s.format.is_block())
            .map(|s| (s.format, s.range()))
            .collect();
        assert_eq!(
            flowing,
            vec![
                (Format::Bold, 0..2),
                (Format::Link, 1..2),
                (Format::Link, 3..4),
                (Format::Bold, 3..4),
            ]
        );
    }

    #[test]
    fn plain_line_breaks_stay_inside_inline_spans() {
        let text = EditorRope::from_str("a\nb");
        let mut spans = set(&[Span::new(Format::Italic, 0, 3)]);
        spans.canonicalize(&text);
        assert_eq!(spans.as_slice()[0].range(), 0..3);
    }

    #[test]
    fn comment_markers_shed_other_spans() {
        let text = EditorRope::from_str("a\n\u{FFFC}\nb");
        let mut spans = set(&[
            Span::new(Format::Bold, 0, 5),
            Span::new(Format::Quote, 0, 5),
            Span::new(Format::More, 2, 3),
        ]);
        spans.canonicalize(&text);
        let ranges: Vec<_> = spans.iter().map(|s| (s.format, s.range())).collect();
        assert_eq!(
            ranges,
            vec![
                (Format::Quote, 0..1),
                (Format::Bold, 0..1),
                (Format::More, 2..3),
                (Format::Quote, 4..5),
                (Format::Bold, 4..5),
            ]
        );
    }

    #[test]
    fn one_object_per_character() {
        let text = EditorRope::from_str("\u{FFFC}");
        let mut spans = set(&[Span::new(Format::Image, 0, 1), Span::new(Format::More, 0, 1)]);
        spans.canonicalize(&text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans.as_slice()[0].format, Format::Image);
    }

    #[test]
    fn object_spans_need_their_character() {
        let text = EditorRope::from_str("a\u{FFFC}b");
        let mut spans = set(&[Span::new(Format::Image, 1, 2), Span::new(Format::Video, 0, 1)]);
        spans.canonicalize(&text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans.as_slice()[0].format, Format::Image);
    }

    #[test]
    fn nested_identical_blocks_are_kept() {
        let text = EditorRope::from_str("x");
        let mut spans = set(&[
            Span::new(Format::UnorderedList, 0, 1),
            Span::new(Format::ListItem, 0, 1),
            Span::new(Format::UnorderedList, 0, 1),
            Span::new(Format::ListItem, 0, 1),
        ]);
        spans.canonicalize(&text);
        assert_eq!(spans.len(), 4);
    }

    #[test]
    fn canonical_order_puts_containers_first_and_keeps_their_order() {
        let text = EditorRope::from_str("abc");
        let mut spans = set(&[
            Span::new(Format::Bold, 0, 3),
            Span::new(Format::OrderedList, 0, 3),
            Span::new(Format::ListItem, 0, 3),
        ]);
        spans.canonicalize(&text);
        let formats: Vec<_> = spans.iter().map(|s| s.format).collect();
        assert_eq!(
            formats,
            vec![Format::OrderedList, Format::ListItem, Format::Bold]
        );
    }

    #[test]
    fn line_ranges_cover_touched_lines() {
        let text = EditorRope::from_str("ab\ncd\nef");
        assert_eq!(line_ranges(&text, 1, 4), vec![0..2, 3..5]);
        assert_eq!(line_ranges(&text, 0, 3), vec![0..2]);
        assert_eq!(line_ranges(&text, 3, 3), vec![3..5]);
        assert_eq!(line_ranges(&text, 8, 8), vec![6..8]);
        let empty = EditorRope::new();
        assert_eq!(line_ranges(&empty, 0, 0), vec![0..0]);
    }
}
