//! Character styles.

use std::ops::Range;

use smol_str::SmolStr;

use crate::attributes::AttributeBag;
use crate::document::Document;
use crate::format::Format;
use crate::formatter::{cut_inline, probe_range};
use crate::span::Span;

/// Every position of the probed range is covered by `format`, except line
/// breaks and comment markers, which never carry inline styles.
pub fn contains(doc: &Document, format: Format, range: Range<usize>) -> bool {
    let probe = probe_range(doc.text(), range.start, range.end);
    let mut checked = false;
    for pos in probe {
        if doc.char_at(pos) == Some('\n') || doc.spans().comment_at(pos) {
            continue;
        }
        if !doc.spans().covered_by(format, pos) {
            return false;
        }
        checked = true;
    }
    checked
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Remembered {
    format: Format,
    range: Range<usize>,
    tag: SmolStr,
    attributes: AttributeBag,
}

/// Tag and attributes of inline spans removed by a toggle, keyed by format
/// and range.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMemo {
    entries: Vec<Remembered>,
}

impl AttributeMemo {
    pub fn remember(
        &mut self,
        format: Format,
        range: Range<usize>,
        tag: SmolStr,
        attributes: AttributeBag,
    ) {
        self.entries.retain(|e| e.format != format);
        self.entries.push(Remembered {
            format,
            range,
            tag,
            attributes,
        });
    }

    pub fn recall(&self, format: Format, range: &Range<usize>) -> Option<(SmolStr, AttributeBag)> {
        self.entries
            .iter()
            .find(|e| e.format == format && e.range == *range)
            .map(|e| (e.tag.clone(), e.attributes.clone()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

pub struct InlineFormatter<'a> {
    doc: &'a mut Document,
    memo: &'a mut AttributeMemo,
}

impl<'a> InlineFormatter<'a> {
    pub fn new(doc: &'a mut Document, memo: &'a mut AttributeMemo) -> Self {
        Self { doc, memo }
    }

    /// Remove `format` from `range` if it covers it, otherwise apply it.
    /// Returns whether the format is now applied.
    pub fn toggle(&mut self, format: Format, range: Range<usize>) -> bool {
        if contains(self.doc, format, range.clone()) {
            self.remove(format, range);
            false
        } else {
            self.apply(format, range);
            true
        }
    }

    pub fn apply(&mut self, format: Format, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        // Continue the style of a span this one touches, then whatever was
        // removed from exactly this range.
        let (tag, attributes) = self
            .doc
            .spans()
            .of_format(format)
            .find(|s| s.start <= range.end && range.start <= s.end)
            .map(|s| (s.tag.clone(), s.attributes.clone()))
            .or_else(|| self.memo.recall(format, &range))
            .unwrap_or_else(|| (SmolStr::new_static(format.canonical_tag()), AttributeBag::new()));

        tracing::trace!(target: "weft::edit", %format, ?range, "applying inline style");
        self.doc.spans_mut().push(Span {
            format,
            tag,
            attributes,
            start: range.start,
            end: range.end,
        });
        self.doc.canonicalize();
    }

    pub fn remove(&mut self, format: Format, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let taken = self
            .doc
            .spans_mut()
            .take_where(|s| s.format == format && s.overlaps(&range));
        if let Some(first) = taken.first() {
            self.memo.remember(
                format,
                range.clone(),
                first.tag.clone(),
                first.attributes.clone(),
            );
        }
        let pieces: Vec<Span> = taken.iter().flat_map(|s| cut_inline(s, &range)).collect();
        tracing::trace!(
            target: "weft::edit",
            %format,
            ?range,
            removed = taken.len(),
            "removing inline style"
        );
        self.doc.spans_mut().extend(pieces);
        self.doc.canonicalize();
    }
}
