//! Media and comment markers: spans that own a single object character.

use std::ops::Range;

use crate::attributes::AttributeBag;
use crate::document::Document;
use crate::format::{CommentKind, Format, MediaKind, OBJECT_CHAR};
use crate::formatter::{cut_block, touches_lines};
use crate::span::Span;
use crate::text::TextBuffer;
use crate::types::TextChange;

pub struct ObjectFormatter<'a> {
    doc: &'a mut Document,
}

impl<'a> ObjectFormatter<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    /// Replace `range` with an image or video. Returns the caret after it.
    pub fn insert_media(
        &mut self,
        kind: MediaKind,
        attributes: AttributeBag,
        range: Range<usize>,
    ) -> usize {
        let format = match kind {
            MediaKind::Image => Format::Image,
            MediaKind::Video => Format::Video,
        };
        self.doc
            .nested_replace(range.clone(), OBJECT_CHAR.encode_utf8(&mut [0; 4]));
        let at = range.start.min(self.doc.len_chars().saturating_sub(1));
        tracing::debug!(target: "weft::edit", %format, at, "inserting media");
        self.doc
            .spans_mut()
            .push(Span::new(format, at, at + 1).with_attributes(attributes));
        self.doc.canonicalize();
        at + 1
    }

    /// Replace `range` with a comment marker on a line of its own. Block
    /// formatting is cleared from the marker's line. Returns the caret,
    /// placed at the start of the line after the marker.
    pub fn insert_comment(&mut self, kind: CommentKind, range: Range<usize>) -> usize {
        let format = match kind {
            CommentKind::More => Format::More,
            CommentKind::Page => Format::Page,
        };
        let text = self.doc.text();
        let leading = !text.is_line_start(range.start);
        let trailing = text.char_at(range.end) != Some('\n');

        let mut insertion = String::with_capacity(5);
        if leading {
            insertion.push('\n');
        }
        insertion.push(OBJECT_CHAR);
        if trailing {
            insertion.push('\n');
        }
        self.doc.nested_replace(range.clone(), &insertion);

        let at = range.start + usize::from(leading);
        let line = at..at + 1;
        tracing::debug!(target: "weft::edit", %format, at, "inserting comment marker");
        let spans = self.doc.spans_mut();
        spans.replace_where(
            |s| s.format.is_block() && touches_lines(s, &line),
            |s| cut_block(s, &line),
        );
        spans.push(Span::new(format, at, at + 1));
        self.doc.canonicalize();
        at + 2
    }

    /// Keep comment markers alone on their lines after a user edit. Text
    /// typed next to a marker is pushed onto its own line; a deletion that
    /// joins a marker's line with a neighbouring one removes the marker.
    /// Returns the adjusted caret.
    pub fn separate_markers(&mut self, change: TextChange, caret: usize) -> usize {
        let spans = self.doc.spans();
        let marker_at = |pos: usize| spans.comment_at(pos);
        let is_break = |pos: usize| self.doc.char_at(pos) == Some('\n');

        if change.inserted > 0 {
            let end = change.new_end();
            let before = end > 0 && marker_at(end) && !is_break(end - 1);
            let after = change.start > 0
                && marker_at(change.start - 1)
                && self.doc.char_at(change.start).is_some_and(|c| c != '\n');
            let mut caret = caret;
            if before {
                self.doc.nested_replace(end..end, "\n");
            }
            if after {
                self.doc.nested_replace(change.start..change.start, "\n");
                caret += 1;
            }
            if before || after {
                tracing::debug!(target: "weft::edit", ?change, "moved text off a marker line");
            }
            return caret;
        }

        let at = change.start;
        let joined_after = at > 0
            && marker_at(at - 1)
            && self.doc.char_at(at).is_some_and(|c| c != '\n');
        let joined_before = !joined_after && at > 0 && marker_at(at) && !is_break(at - 1);
        let marker = if joined_after {
            at - 1
        } else if joined_before {
            at
        } else {
            return caret;
        };
        tracing::debug!(target: "weft::edit", at = marker, "removing a marker joined with text");
        self.doc.nested_replace(marker..marker + 1, "");
        if caret > marker { caret - 1 } else { caret }
    }
}
