//! Hyperlinks.
//!
//! A link span carries its target in the `href` attribute. Links never
//! contain a line break and never start or end on whitespace.

use std::ops::Range;

use crate::attributes::AttributeBag;
use crate::document::Document;
use crate::format::Format;
use crate::formatter::{cut_inline, probe_range};
use crate::span::Span;

/// Every position of the probed range is covered by exactly one link.
pub fn contains_link(doc: &Document, range: Range<usize>) -> bool {
    let probe = probe_range(doc.text(), range.start, range.end);
    !probe.is_empty()
        && probe.clone().all(|pos| {
            doc.spans()
                .of_format(Format::Link)
                .filter(|s| s.covers(pos))
                .count()
                == 1
        })
}

/// The link under the caret or selection, if [`contains_link`] holds.
pub fn link_at(doc: &Document, range: Range<usize>) -> Option<&Span> {
    if !contains_link(doc, range.clone()) {
        return None;
    }
    let probe = probe_range(doc.text(), range.start, range.end);
    doc.spans()
        .of_format(Format::Link)
        .find(|s| s.covers(probe.start))
}

/// Bounds of the link under the caret or selection.
pub fn url_span_bounds(doc: &Document, range: Range<usize>) -> Option<Range<usize>> {
    link_at(doc, range).map(Span::range)
}

/// `(url, anchor)` to pre-fill a link dialog: the link under the selection,
/// or an empty url and the selected text.
pub fn selected_url_with_anchor(doc: &Document, range: Range<usize>) -> (String, String) {
    match link_at(doc, range.clone()) {
        Some(link) => (
            link.attributes.get("href").unwrap_or_default().to_owned(),
            doc.slice(link.range()).to_string(),
        ),
        None => (String::new(), doc.slice(range).to_string()),
    }
}

/// `range` without leading and trailing whitespace.
fn trim_range(doc: &Document, mut range: Range<usize>) -> Range<usize> {
    while range.start < range.end && doc.char_at(range.start).is_some_and(char::is_whitespace) {
        range.start += 1;
    }
    while range.end > range.start && doc.char_at(range.end - 1).is_some_and(char::is_whitespace) {
        range.end -= 1;
    }
    range
}

pub struct LinkFormatter<'a> {
    doc: &'a mut Document,
}

impl<'a> LinkFormatter<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    /// Link `range` to `url`.
    ///
    /// At a caret the anchor (or the url when the anchor is empty) is
    /// inserted first. A selection is wrapped as is, or replaced by `anchor`
    /// when a different non-empty anchor is given. Returns the end of the
    /// inserted or wrapped text.
    pub fn add_link(&mut self, url: &str, anchor: &str, range: Range<usize>) -> usize {
        let target = if range.is_empty() {
            let label = if anchor.trim().is_empty() { url } else { anchor };
            self.doc.nested_replace(range.start..range.start, label);
            range.start..range.start + label.chars().count()
        } else if !anchor.is_empty() && self.doc.slice(range.clone()).as_str() != anchor {
            self.doc.nested_replace(range.clone(), anchor);
            range.start..range.start + anchor.chars().count()
        } else {
            range
        };

        let linked = trim_range(self.doc, target.clone());
        if !linked.is_empty() {
            tracing::debug!(target: "weft::edit", url, range = ?linked, "adding link");
            self.unlink(&linked);
            let href = AttributeBag::new().with("href", url);
            self.doc
                .spans_mut()
                .push(Span::new(Format::Link, linked.start, linked.end).with_attributes(href));
            self.doc.canonicalize();
        }
        target.end
    }

    /// Point the link under `range` at `url`, replacing its text with a
    /// different non-empty `anchor`. Returns the link's new bounds.
    pub fn edit_link(&mut self, url: &str, anchor: &str, range: Range<usize>) -> Option<Range<usize>> {
        let link = link_at(self.doc, range)?.clone();
        let mut bounds = link.range();
        if !anchor.is_empty() && self.doc.slice(link.range()).as_str() != anchor {
            self.doc.nested_replace(link.range(), anchor);
            bounds = link.start..link.start + anchor.chars().count();
        }
        tracing::debug!(target: "weft::edit", url, range = ?bounds, "editing link");
        for span in self.doc.spans_mut().iter_mut() {
            if span.format == Format::Link && span.start == bounds.start {
                span.attributes.set("href", url);
            }
        }
        self.doc.canonicalize();
        Some(bounds)
    }

    /// At a caret, remove the whole link under it; with a selection, unlink
    /// just the selected part. Returns whether anything was unlinked.
    pub fn remove_link(&mut self, range: Range<usize>) -> bool {
        let cut = if range.is_empty() {
            match link_at(self.doc, range) {
                Some(link) => link.range(),
                None => return false,
            }
        } else {
            range
        };
        let removed = self.unlink(&cut);
        if removed > 0 {
            tracing::debug!(target: "weft::edit", range = ?cut, "removed link");
            self.doc.canonicalize();
        }
        removed > 0
    }

    fn unlink(&mut self, cut: &Range<usize>) -> usize {
        self.doc.spans_mut().replace_where(
            |s| s.format == Format::Link && s.overlaps(cut),
            |s| cut_inline(s, cut),
        )
    }
}
