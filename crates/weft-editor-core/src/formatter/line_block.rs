//! Headings and paragraphs.
//!
//! Each line carries at most one of them; unlike containers they are
//! applied per line, so toggling over three lines yields three spans.
//! Applying one takes its lines out of any list.

use std::ops::Range;

use crate::document::Document;
use crate::format::{ExclusionGroup, Format};
use crate::formatter::block::contains_block;
use crate::formatter::{cut_block, touches_lines, whole_lines};
use crate::span::{Span, line_ranges};

fn is_line_format(format: Format) -> bool {
    format.exclusion_group() == Some(ExclusionGroup::Line)
}

pub struct LineBlockFormatter<'a> {
    doc: &'a mut Document,
}

impl<'a> LineBlockFormatter<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    pub fn toggle(&mut self, format: Format, range: Range<usize>) {
        if !is_line_format(format) {
            return;
        }
        let lines = whole_lines(self.doc.text(), range.start, range.end);
        let remove_only = contains_block(self.doc, format, range.clone());
        let spans = self.doc.spans_mut();
        spans.replace_where(
            |s| is_line_format(s.format) && touches_lines(s, &lines),
            |s| cut_block(s, &lines),
        );
        if remove_only {
            tracing::debug!(target: "weft::edit", %format, ?lines, "removing line format");
        } else {
            tracing::debug!(target: "weft::edit", %format, ?lines, "applying line format");
            spans.replace_where(
                |s| (s.format.is_list() || s.format == Format::ListItem) && touches_lines(s, &lines),
                |s| cut_block(s, &lines),
            );
            let per_line: Vec<Span> = line_ranges(self.doc.text(), lines.start, lines.end)
                .into_iter()
                .map(|line| Span::new(format, line.start, line.end))
                .collect();
            self.doc.spans_mut().extend(per_line);
        }
        self.doc.canonicalize();
    }

    /// Split the heading or paragraph holding the line break at `at`. Parts
    /// left without text are dropped, so an empty tail line is plain.
    pub fn split_at(&mut self, at: usize) {
        self.doc.spans_mut().replace_where(
            |s| is_line_format(s.format) && s.start <= at && at < s.end,
            |s| {
                let head = Span {
                    end: at,
                    ..s.clone()
                };
                let tail = Span {
                    start: at + 1,
                    ..s.clone()
                };
                [head, tail].into_iter().filter(|p| !p.is_empty()).collect()
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HeadingLevel;
    use crate::html::serialize;
    use crate::types::TextChange;

    const H1: Format = Format::Heading(HeadingLevel::H1);
    const H2: Format = Format::Heading(HeadingLevel::H2);

    fn html(doc: &Document) -> String {
        serialize(&doc.content(), doc.spans().as_slice(), None)
    }

    #[test]
    fn toggle_applies_per_line_and_replaces_other_levels() {
        let mut doc = Document::from_parts("a\nb", vec![Span::new(H2, 0, 1)]);
        LineBlockFormatter::new(&mut doc).toggle(H1, 0..3);
        assert_eq!(html(&doc), "<h1>a</h1><h1>b</h1>");
        LineBlockFormatter::new(&mut doc).toggle(H1, 2..2);
        assert_eq!(html(&doc), "<h1>a</h1>b");
    }

    #[test]
    fn heading_takes_its_line_out_of_the_list() {
        let mut doc = Document::from_parts(
            "a\nb",
            vec![
                Span::new(Format::OrderedList, 0, 3),
                Span::new(Format::ListItem, 0, 1),
                Span::new(Format::ListItem, 2, 3),
            ],
        );
        LineBlockFormatter::new(&mut doc).toggle(H1, 0..0);
        assert_eq!(html(&doc), "<h1>a</h1><ol><li>b</li></ol>");

        let mut doc = Document::from_parts("a", vec![Span::new(Format::Quote, 0, 1)]);
        LineBlockFormatter::new(&mut doc).toggle(H2, 0..0);
        assert_eq!(html(&doc), "<blockquote><h2>a</h2></blockquote>");
    }

    #[test]
    fn break_splits_heading_and_tail_stays_plain() {
        let mut doc = Document::from_parts("title", vec![Span::new(H1, 0, 5)]);
        doc.splice(2..2, "\n");
        doc.canonicalize();
        LineBlockFormatter::new(&mut doc).split_at(2);
        doc.canonicalize();
        assert_eq!(html(&doc), "<h1>ti</h1><h1>tle</h1>");

        let mut doc = Document::from_parts("title", vec![Span::new(H1, 0, 5)]);
        let change = doc.splice(5..5, "\n");
        doc.canonicalize();
        crate::formatter::BlockFormatter::new(&mut doc).handle_line_breaks(change, "\n");
        assert_eq!(doc.content(), "title\n");
        assert_eq!(doc.spans().as_slice(), &[Span::new(H1, 0, 5)]);
        assert_eq!(change, TextChange::insertion(5, 1));
    }
}
