//! Lists and quotes: whole-line containers.
//!
//! Unordered lists, ordered lists and quotes exclude each other on a line.
//! Lists also exclude headings and paragraphs; quotes may hold them.
//! A list span is always accompanied by one list item span per item; items
//! normally cover one line but may span several when joined by `<br>`.

use std::fmt;
use std::ops::Range;

use crate::document::Document;
use crate::format::{ExclusionGroup, Format, ListKind};
use crate::formatter::{cut_block, touches_lines, whole_lines};
use crate::span::{Span, line_ranges};
use crate::text::TextBuffer;
use crate::types::TextChange;

/// Every line touched by `range` is covered by a span of `format`.
pub fn contains_block(doc: &Document, format: Format, range: Range<usize>) -> bool {
    line_ranges(doc.text(), range.start, range.end)
        .iter()
        .all(|line| {
            doc.spans()
                .of_format(format)
                .any(|s| s.start <= line.start && line.end <= s.end)
        })
}

/// Bullet or number shown in front of a list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListItemMarker {
    pub kind: ListKind,
    /// 1-based position, offset by the list's `start` attribute.
    pub number: usize,
}

impl fmt::Display for ListItemMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ListKind::Ordered => write!(f, "{}.", self.number),
            ListKind::Unordered => f.write_str("\u{2022}"),
        }
    }
}

/// Innermost list span holding `item`.
fn parent_list<'s>(spans: &'s [Span], item: &Span) -> Option<&'s Span> {
    spans
        .iter()
        .filter(|s| s.format.is_list() && s.start <= item.start && item.end <= s.end)
        .min_by_key(|s| s.len())
}

/// Marker for the list item at `offset`, numbered lazily from the items
/// that share its list.
pub fn list_item_marker(doc: &Document, offset: usize) -> Option<ListItemMarker> {
    let spans = doc.spans().as_slice();
    let item = doc.spans().block_at(offset, |f| f == Format::ListItem)?;
    let list = parent_list(spans, item)?;
    let kind = list.format.list_kind()?;

    let position = spans
        .iter()
        .filter(|s| s.format == Format::ListItem && s.start <= item.start)
        .filter(|s| parent_list(spans, s) == Some(list))
        .count();
    let first = list
        .attributes
        .get("start")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1);
    Some(ListItemMarker {
        kind,
        number: first + position.saturating_sub(1),
    })
}

pub struct BlockFormatter<'a> {
    doc: &'a mut Document,
}

impl<'a> BlockFormatter<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    pub fn toggle_list(&mut self, kind: ListKind, range: Range<usize>) {
        let format = kind.format();
        let lines = whole_lines(self.doc.text(), range.start, range.end);
        if contains_block(self.doc, format, range) {
            tracing::debug!(target: "weft::edit", %format, ?lines, "removing list");
            self.cut(&lines, |f| f == format || f == Format::ListItem);
        } else {
            tracing::debug!(target: "weft::edit", %format, ?lines, "applying list");
            self.clear_group(&lines, true);
            self.join_adjacent(format, lines.clone());
            let items: Vec<Span> = line_ranges(self.doc.text(), lines.start, lines.end)
                .into_iter()
                .map(|line| Span::new(Format::ListItem, line.start, line.end))
                .collect();
            self.doc.spans_mut().extend(items);
        }
        self.doc.canonicalize();
    }

    pub fn toggle_quote(&mut self, range: Range<usize>) {
        let lines = whole_lines(self.doc.text(), range.start, range.end);
        if contains_block(self.doc, Format::Quote, range) {
            tracing::debug!(target: "weft::edit", ?lines, "removing quote");
            self.cut(&lines, |f| f == Format::Quote);
        } else {
            tracing::debug!(target: "weft::edit", ?lines, "applying quote");
            self.clear_group(&lines, false);
            self.join_adjacent(Format::Quote, lines);
        }
        self.doc.canonicalize();
    }

    /// Remove the lines `lines` from every block span of a matching format;
    /// what remains above and below is kept with the same attributes.
    fn cut(&mut self, lines: &Range<usize>, pred: impl Fn(Format) -> bool) {
        self.doc
            .spans_mut()
            .replace_where(|s| pred(s.format) && touches_lines(s, lines), |s| cut_block(s, lines));
    }

    /// Clear the container group (and the items of any list) from `lines`,
    /// along with headings and paragraphs when `line_formats` is set.
    fn clear_group(&mut self, lines: &Range<usize>, line_formats: bool) {
        self.cut(lines, |f| match f.exclusion_group() {
            Some(ExclusionGroup::Container) => true,
            Some(ExclusionGroup::Line) => line_formats,
            None => f == Format::ListItem,
        });
    }

    /// Cover `lines` with `format`, merging with same-format blocks that end
    /// on the line above or start on the line below.
    fn join_adjacent(&mut self, format: Format, lines: Range<usize>) {
        let largest = |pred: &dyn Fn(&Span) -> bool| {
            self.doc
                .spans()
                .iter()
                .filter(|s| s.format == format && pred(s))
                .max_by_key(|s| s.len())
                .cloned()
        };
        let above = largest(&|s: &Span| s.end + 1 == lines.start);
        let below = largest(&|s: &Span| s.start == lines.end + 1);

        let spans = self.doc.spans_mut();
        match (above, below) {
            (Some(above), below) => {
                let end = below.as_ref().map_or(lines.end, |b| b.end);
                if let Some(below) = below {
                    spans.replace_first(&below, Vec::new());
                }
                let joined = Span {
                    end,
                    ..above.clone()
                };
                spans.replace_first(&above, vec![joined]);
            }
            (None, Some(below)) => {
                let joined = Span {
                    start: lines.start,
                    ..below.clone()
                };
                spans.replace_first(&below, vec![joined]);
            }
            (None, None) => spans.push(Span::new(format, lines.start, lines.end)),
        }
    }

    /// Re-shape blocks after a user edit inserted line breaks.
    ///
    /// Returns the new caret when a break typed on an empty last list item
    /// or quote line was consumed to leave the block.
    pub fn handle_line_breaks(&mut self, change: TextChange, inserted: &str) -> Option<usize> {
        if inserted == "\n" {
            if let Some(caret) = self.exit_empty_block(change.start) {
                return Some(caret);
            }
        }

        let breaks: Vec<usize> = inserted
            .chars()
            .enumerate()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| change.start + i)
            .collect();
        for at in breaks {
            self.split_item(at);
            crate::formatter::LineBlockFormatter::new(self.doc).split_at(at);
        }
        self.doc.canonicalize();
        None
    }

    /// Split the innermost list item containing the line break at `at`.
    fn split_item(&mut self, at: usize) {
        let Some(item) = self
            .doc
            .spans()
            .iter()
            .filter(|s| s.format == Format::ListItem && s.start <= at && at < s.end)
            .min_by_key(|s| s.len())
            .cloned()
        else {
            return;
        };
        let tail = Span::new(Format::ListItem, at + 1, item.end).with_tag(item.tag.clone());
        let head = Span {
            end: at,
            ..item.clone()
        };
        tracing::trace!(target: "weft::edit", at, "splitting list item");
        self.doc.spans_mut().replace_first(&item, vec![head, tail]);
    }

    /// A break typed on an empty line that is the last item of a list, or
    /// the last line of a quote, leaves the block: the item or line is
    /// dropped from it and the break is removed again.
    fn exit_empty_block(&mut self, at: usize) -> Option<usize> {
        let text = self.doc.text();
        if !text.is_line_start(at) || !text.is_line_end(at + 1) {
            return None;
        }
        let spans = self.doc.spans().as_slice();
        let item = spans
            .iter()
            .filter(|s| s.format == Format::ListItem && s.start == at && s.end == at + 1)
            .min_by_key(|s| s.len())
            .cloned();

        let (container, item) = match item {
            Some(item) => {
                let list = parent_list(spans, &item)?.clone();
                if list.end != item.end {
                    return None;
                }
                (list, Some(item))
            }
            None => {
                let quote = spans
                    .iter()
                    .filter(|s| s.format == Format::Quote && s.start <= at && s.end == at + 1)
                    .min_by_key(|s| s.len())?
                    .clone();
                (quote, None)
            }
        };

        tracing::debug!(
            target: "weft::edit",
            format = %container.format,
            at,
            "leaving block on empty last line"
        );
        let spans = self.doc.spans_mut();
        if let Some(item) = &item {
            spans.replace_first(item, Vec::new());
        }
        let shrunk = if container.start < at {
            vec![Span {
                end: at - 1,
                ..container.clone()
            }]
        } else {
            Vec::new()
        };
        spans.replace_first(&container, shrunk);
        self.doc.nested_replace(at..at + 1, "");
        Some(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::serialize;

    fn doc(text: &str, spans: Vec<Span>) -> Document {
        Document::from_parts(text, spans)
    }

    fn html(doc: &Document) -> String {
        serialize(&doc.content(), doc.spans().as_slice(), None)
    }

    fn ordered(text: &str) -> Document {
        let mut d = doc(text, vec![]);
        let len = d.len_chars();
        BlockFormatter::new(&mut d).toggle_list(ListKind::Ordered, 0..len);
        d
    }

    #[test]
    fn list_toggle_covers_whole_lines() {
        let mut d = doc("one\ntwo\nthree", vec![]);
        BlockFormatter::new(&mut d).toggle_list(ListKind::Unordered, 1..5);
        assert_eq!(html(&d), "<ul><li>one</li><li>two</li></ul>three");
        assert!(contains_block(&d, Format::UnorderedList, 0..0));
        assert!(!contains_block(&d, Format::UnorderedList, 8..8));
    }

    #[test]
    fn toggling_off_in_the_middle_splits_the_list() {
        let mut d = ordered("a\nb\nc");
        BlockFormatter::new(&mut d).toggle_list(ListKind::Ordered, 2..2);
        assert_eq!(
            html(&d),
            "<ol><li>a</li></ol>b<ol><li>c</li></ol>"
        );
    }

    #[test]
    fn toggling_on_between_lists_joins_them() {
        let mut d = ordered("a\nb\nc");
        BlockFormatter::new(&mut d).toggle_list(ListKind::Ordered, 2..2);
        BlockFormatter::new(&mut d).toggle_list(ListKind::Ordered, 2..2);
        assert_eq!(html(&d), "<ol><li>a</li><li>b</li><li>c</li></ol>");
        assert_eq!(d.spans().of_format(Format::OrderedList).count(), 1);
    }

    #[test]
    fn list_kinds_and_quotes_exclude_each_other() {
        let mut d = ordered("a\nb");
        BlockFormatter::new(&mut d).toggle_list(ListKind::Unordered, 0..0);
        assert_eq!(html(&d), "<ul><li>a</li></ul><ol><li>b</li></ol>");
        BlockFormatter::new(&mut d).toggle_quote(0..3);
        assert_eq!(html(&d), "<blockquote>a<br>b</blockquote>");
    }

    #[test]
    fn list_replaces_heading_but_quote_keeps_it() {
        let h1 = Format::Heading(crate::format::HeadingLevel::H1);
        let mut d = doc("a\nb", vec![Span::new(h1, 0, 1), Span::new(h1, 2, 3)]);
        BlockFormatter::new(&mut d).toggle_list(ListKind::Unordered, 0..0);
        assert_eq!(html(&d), "<ul><li>a</li></ul><h1>b</h1>");
        BlockFormatter::new(&mut d).toggle_quote(2..2);
        assert_eq!(html(&d), "<ul><li>a</li></ul><blockquote><h1>b</h1></blockquote>");
    }

    #[test]
    fn break_inside_item_splits_it() {
        let mut d = ordered("ab");
        d.splice(1..1, "\n");
        d.canonicalize();
        let caret = BlockFormatter::new(&mut d).handle_line_breaks(TextChange::insertion(1, 1), "\n");
        assert_eq!(caret, None);
        assert_eq!(html(&d), "<ol><li>a</li><li>b</li></ol>");
    }

    #[test]
    fn break_on_empty_last_item_leaves_the_list() {
        let mut d = doc(
            "a\n",
            vec![
                Span::new(Format::OrderedList, 0, 2),
                Span::new(Format::ListItem, 0, 1),
                Span::new(Format::ListItem, 2, 2),
            ],
        );
        assert_eq!(html(&d), "<ol><li>a</li><li></li></ol>");
        d.splice(2..2, "\n");
        d.canonicalize();
        let caret = BlockFormatter::new(&mut d).handle_line_breaks(TextChange::insertion(2, 1), "\n");
        assert_eq!(caret, Some(2));
        assert_eq!(d.content(), "a\n");
        assert_eq!(
            d.spans().iter().map(|s| (s.format, s.range())).collect::<Vec<_>>(),
            vec![(Format::OrderedList, 0..1), (Format::ListItem, 0..1)]
        );
        assert_eq!(d.take_nested_edits(), 1);
    }

    #[test]
    fn break_on_empty_last_quote_line_leaves_the_quote() {
        let mut d = doc("abc\n", vec![Span::new(Format::Quote, 0, 4)]);
        d.splice(4..4, "\n");
        d.canonicalize();
        let caret = BlockFormatter::new(&mut d).handle_line_breaks(TextChange::insertion(4, 1), "\n");
        assert_eq!(caret, Some(4));
        assert_eq!(d.content(), "abc\n");
        assert_eq!(d.spans().as_slice()[0].range(), 0..3);
    }

    #[test]
    fn markers_count_siblings_only() {
        let d = doc(
            "a\nb\nc\nd",
            vec![
                Span::new(Format::OrderedList, 0, 7)
                    .with_attributes(crate::attributes::AttributeBag::new().with("start", "3")),
                Span::new(Format::ListItem, 0, 5),
                Span::new(Format::UnorderedList, 2, 5),
                Span::new(Format::ListItem, 2, 3),
                Span::new(Format::ListItem, 4, 5),
                Span::new(Format::ListItem, 6, 7),
            ],
        );
        assert_eq!(list_item_marker(&d, 0).map(|m| m.to_string()), Some("3.".into()));
        assert_eq!(list_item_marker(&d, 4).map(|m| m.to_string()), Some("\u{2022}".into()));
        assert_eq!(list_item_marker(&d, 6).map(|m| m.number), Some(4));
    }
}
