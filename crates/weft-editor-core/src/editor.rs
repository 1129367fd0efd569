//! The editor: one document, its element tree, selection and history.
//!
//! Every text mutation runs in two phases. `on_text_will_change` snapshots
//! the document for undo; `on_text_changed` applies the edit to the text and
//! the spans, re-runs the line-break formatters and brings the element tree
//! back in sync. Mutations issued while handling a change carry
//! [`ChangeOrigin::Nested`] and skip both history and formatters.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeBag;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{EditorError, MarkupWarning};
use crate::format::{Format, FormatCategory, MediaKind};
use crate::formatter::{
    self, AttributeMemo, BlockFormatter, InlineFormatter, LineBlockFormatter, LinkFormatter,
    ListItemMarker, ObjectFormatter, link, probe_range,
};
use crate::history::{History, HistoryEntry, UndoManager};
use crate::html::{self, write_html};
use crate::span::{Span, SpanSet};
use crate::text::EditorRope;
use crate::tree::{ElementTree, TreeEdit};
use crate::types::{ChangeOrigin, Selection, TextChange, normalize_range};

/// Inline styles toggled at a caret, applied to the next insertion there.
#[derive(Clone, Debug, Default)]
struct PendingStyles {
    at: usize,
    formats: Vec<Format>,
}

impl PendingStyles {
    fn toggle(&mut self, at: usize, format: Format) {
        if self.at != at {
            self.formats.clear();
            self.at = at;
        }
        match self.formats.iter().position(|&f| f == format) {
            Some(i) => {
                self.formats.remove(i);
            }
            None => self.formats.push(format),
        }
    }

    fn at(&self, at: usize) -> &[Format] {
        if self.at == at { &self.formats } else { &[] }
    }

    /// Styles waiting at `at`; anything pending elsewhere is dropped.
    fn take_at(&mut self, at: usize) -> Vec<Format> {
        let formats = std::mem::take(&mut self.formats);
        if self.at == at { formats } else { Vec::new() }
    }

    fn clear(&mut self) {
        self.formats.clear();
    }
}

/// Everything a host needs to persist and later restore an editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub html: String,
    pub selection: Selection,
    pub history: History,
    pub has_media: bool,
}

#[derive(Clone, Debug)]
pub struct Editor {
    config: EditorConfig,
    doc: Document,
    tree: ElementTree,
    selection: Selection,
    history: History,
    pending_styles: PendingStyles,
    memo: AttributeMemo,
    warnings: Vec<MarkupWarning>,
}

impl Editor {
    /// An empty editor. Fails when the history configuration is invalid.
    pub fn new(config: EditorConfig) -> Result<Self, EditorError> {
        let history = History::new(&config)?;
        Ok(Self {
            config,
            doc: Document::new(),
            tree: ElementTree::new(),
            selection: Selection::default(),
            history,
            pending_styles: PendingStyles::default(),
            memo: AttributeMemo::default(),
            warnings: Vec::new(),
        })
    }

    pub fn from_html(markup: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let mut editor = Self::new(config)?;
        editor.load_from_html(markup);
        Ok(editor)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn text(&self) -> String {
        self.doc.content()
    }

    pub fn len_chars(&self) -> usize {
        self.doc.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn spans(&self) -> &SpanSet {
        self.doc.spans()
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Diagnostics from the last markup load.
    pub fn warnings(&self) -> &[MarkupWarning] {
        &self.warnings
    }

    pub fn has_media(&self) -> bool {
        self.doc.has_media()
    }

    // === Selection ===

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Out-of-range offsets are clamped. Moving the selection drops pending
    /// typing styles.
    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        let selection = Selection::new(anchor, head).clamped(self.doc.len_chars());
        if selection != self.selection {
            self.pending_styles.clear();
        }
        self.selection = selection;
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.set_selection(offset, offset);
    }

    pub fn select_all(&mut self) {
        self.set_selection(0, self.doc.len_chars());
    }

    // === Two-phase change notification ===

    /// First phase of a host edit: `full_text` is the text before the edit.
    pub fn on_text_will_change(
        &mut self,
        full_text: &str,
        start: usize,
        deleted: usize,
        inserted: usize,
    ) {
        let host_len = full_text.chars().count();
        if host_len != self.doc.len_chars() {
            tracing::warn!(
                target: "weft::edit",
                host_len,
                len = self.doc.len_chars(),
                "host text differs from the document before a change"
            );
        }
        tracing::trace!(target: "weft::edit", start, deleted, inserted, "text will change");
        self.begin_change(ChangeOrigin::User);
    }

    /// Second phase of a host edit: `full_text` is the text after the edit,
    /// in which `inserted` chars at `start` replaced `deleted` chars.
    pub fn on_text_changed(&mut self, full_text: &str, start: usize, deleted: usize, inserted: usize) {
        self.begin_change(ChangeOrigin::User);
        let len = self.doc.len_chars();
        let range = normalize_range(start, start.saturating_add(deleted), len);
        let host_len = full_text.chars().count();

        if host_len != len - range.len() + inserted {
            tracing::error!(
                target: "weft::edit",
                host_len,
                len,
                start,
                deleted,
                inserted,
                "host text diverged from the document; resynchronizing"
            );
            self.doc.reset_text(full_text);
            self.doc.take_nested_edits();
            self.rebuild_tree();
            self.selection = Selection::collapsed((start + inserted).min(host_len));
        } else {
            let text: String = full_text.chars().skip(range.start).take(inserted).collect();
            self.commit_change(range, &text, ChangeOrigin::User);
        }
        self.finish_change(ChangeOrigin::User);
    }

    /// Replace `range` with `text`, running both phases of a change. The
    /// caret ends up after the inserted text.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let range = normalize_range(range.start, range.end, self.doc.len_chars());
        self.begin_change(ChangeOrigin::User);
        self.commit_change(range, text, ChangeOrigin::User);
        self.finish_change(ChangeOrigin::User);
    }

    pub fn insert(&mut self, offset: usize, text: &str) {
        self.replace(offset..offset, text);
    }

    pub fn delete(&mut self, range: Range<usize>) {
        self.replace(range, "");
    }

    /// Replace the selection with `text`, as typing or pasting would.
    pub fn type_text(&mut self, text: &str) {
        self.replace(self.selection.to_range(), text);
    }

    /// Delete the selection, or the character before the caret.
    pub fn backspace(&mut self) {
        let selection = self.selection.clamped(self.doc.len_chars());
        if !selection.is_collapsed() {
            self.delete(selection.to_range());
        } else if selection.head > 0 {
            self.delete(selection.head - 1..selection.head);
        }
    }

    fn begin_change(&mut self, origin: ChangeOrigin) {
        if origin.records_history() && self.history.is_enabled() && !self.history.has_pending() {
            let snapshot = self.snapshot();
            self.history.before_text_changed(snapshot, origin);
        }
    }

    fn finish_change(&mut self, origin: ChangeOrigin) {
        if origin.records_history() && self.history.has_pending() {
            let snapshot = self.snapshot();
            self.history.handle_history(&snapshot);
        }
    }

    fn commit_change(&mut self, range: Range<usize>, text: &str, origin: ChangeOrigin) {
        self.commit_styled_change(range, text, Vec::new(), origin);
    }

    /// Like `commit_change`, with `styles` (offsets relative to `text`)
    /// applied to the inserted text.
    fn commit_styled_change(
        &mut self,
        range: Range<usize>,
        text: &str,
        styles: Vec<Span>,
        origin: ChangeOrigin,
    ) {
        let change = self.doc.splice(range, text);
        if change.is_noop() {
            return;
        }
        tracing::trace!(target: "weft::edit", ?change, ?origin, "text changed");
        self.doc.spans_mut().extend(styles.into_iter().map(|mut span| {
            span.start += change.start;
            span.end += change.start;
            span
        }));

        let styles = self.pending_styles.take_at(change.start);
        if origin == ChangeOrigin::User && change.inserted > 0 {
            let typed = change.start..change.new_end();
            let mut inline = InlineFormatter::new(&mut self.doc, &mut self.memo);
            for format in styles {
                inline.toggle(format, typed.clone());
            }
        }
        self.doc.canonicalize();

        let mut caret = change.new_end();
        let mut exited = false;
        if origin.runs_formatters() && text.contains('\n') {
            if let Some(exit) = BlockFormatter::new(&mut self.doc).handle_line_breaks(change, text)
            {
                caret = exit;
                exited = true;
            }
        }
        if origin.runs_formatters() && !exited {
            caret = ObjectFormatter::new(&mut self.doc).separate_markers(change, caret);
        }
        self.selection = Selection::collapsed(caret.min(self.doc.len_chars()));
        self.sync_tree(change, text);
    }

    /// Bring the tree up to date after `change`: in place when possible,
    /// otherwise rebuilt from the spans.
    fn sync_tree(&mut self, change: TextChange, inserted: &str) {
        if self.doc.take_nested_edits() == 0 {
            if let TreeEdit::Applied(_) = self.tree.apply_edit(change, inserted) {
                if self.tree.matches(self.doc.text(), self.doc.spans()) {
                    return;
                }
                tracing::debug!(target: "weft::tree", ?change, "in-place edit diverged from spans");
            }
        }
        self.rebuild_tree();
    }

    fn rebuild_tree(&mut self) {
        self.tree = ElementTree::from_spans(&self.doc.content(), self.doc.spans().as_slice());
        if !self.tree.matches(self.doc.text(), self.doc.spans()) {
            tracing::error!(
                target: "weft::tree",
                spans = self.doc.spans().len(),
                "rebuilt tree disagrees with the spans"
            );
        }
    }

    /// Run a formatting operation as one undoable user change.
    fn user_operation<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_change(ChangeOrigin::User);
        let out = op(self);
        self.doc.take_nested_edits();
        self.rebuild_tree();
        self.selection = self.selection.clamped(self.doc.len_chars());
        self.finish_change(ChangeOrigin::User);
        out
    }

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            html: self.to_html(false),
            selection: self.selection,
        }
    }

    // === Formatting ===

    /// Toggle `format` over the selection.
    ///
    /// Inline styles toggled at a caret apply to the next text typed there.
    /// Comment markers are inserted at the caret. Links need a target and go
    /// through [`Editor::link`]; media through [`Editor::insert_media`].
    pub fn toggle_format(&mut self, format: Format) {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        match format.category() {
            FormatCategory::Inline if range.is_empty() => {
                self.pending_styles.toggle(range.start, format);
                tracing::trace!(target: "weft::edit", %format, at = range.start, "typing style toggled");
            }
            FormatCategory::Inline => self.user_operation(|ed| {
                InlineFormatter::new(&mut ed.doc, &mut ed.memo).toggle(format, range);
            }),
            FormatCategory::Container => match format.list_kind() {
                Some(kind) => self.user_operation(|ed| {
                    BlockFormatter::new(&mut ed.doc).toggle_list(kind, range);
                }),
                None if format == Format::Quote => self.user_operation(|ed| {
                    BlockFormatter::new(&mut ed.doc).toggle_quote(range);
                }),
                None => {
                    tracing::debug!(target: "weft::edit", %format, "list items follow their list");
                }
            },
            FormatCategory::Line => self.user_operation(|ed| {
                LineBlockFormatter::new(&mut ed.doc).toggle(format, range);
            }),
            FormatCategory::Link => {
                if link::contains_link(&self.doc, range) {
                    self.remove_link();
                } else {
                    tracing::debug!(target: "weft::edit", "linking needs a target url");
                }
            }
            FormatCategory::Media => {
                tracing::debug!(target: "weft::edit", %format, "media is inserted, not toggled");
            }
            FormatCategory::Comment => {
                if let Some(kind) = format.comment_kind() {
                    self.user_operation(|ed| {
                        let caret = ObjectFormatter::new(&mut ed.doc).insert_comment(kind, range);
                        ed.selection = Selection::collapsed(caret);
                    });
                }
            }
        }
    }

    /// Whether `format` applies to `start..end`, or to the caret at `start`.
    pub fn contains(&self, format: Format, start: usize, end: usize) -> bool {
        formatter::contains(&self.doc, format, start, end)
    }

    /// Every format applying to `start..end`. At the caret, pending typing
    /// styles are folded in.
    pub fn applied_formats(&self, start: usize, end: usize) -> Vec<Format> {
        let range = normalize_range(start, end, self.doc.len_chars());
        let probe = probe_range(self.doc.text(), range.start, range.end);
        let mut candidates: Vec<Format> = Vec::new();
        for span in self.doc.spans() {
            if span.start <= probe.end && probe.start <= span.end && !candidates.contains(&span.format)
            {
                candidates.push(span.format);
            }
        }
        let mut applied: Vec<Format> = candidates
            .into_iter()
            .filter(|&f| formatter::contains(&self.doc, f, range.start, range.end))
            .collect();
        if range.is_empty() {
            for &format in self.pending_styles.at(range.start) {
                match applied.iter().position(|&f| f == format) {
                    Some(i) => {
                        applied.remove(i);
                    }
                    None => applied.push(format),
                }
            }
        }
        applied
    }

    /// Replace the selection with an image or video carrying `attributes`.
    pub fn insert_media(&mut self, kind: MediaKind, attributes: AttributeBag) {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        self.user_operation(|ed| {
            let caret = ObjectFormatter::new(&mut ed.doc).insert_media(kind, attributes, range);
            ed.selection = Selection::collapsed(caret);
        });
    }

    pub fn list_item_marker(&self, offset: usize) -> Option<ListItemMarker> {
        formatter::list_item_marker(&self.doc, offset)
    }

    // === Links ===

    pub fn add_link(&mut self, url: &str, anchor: &str) {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        self.user_operation(|ed| {
            let end = LinkFormatter::new(&mut ed.doc).add_link(url, anchor, range.clone());
            if range.is_empty() || end != range.end {
                ed.selection = Selection::collapsed(end);
            }
        });
    }

    /// Retarget the link under the selection. Returns false when there is
    /// no link there.
    pub fn edit_link(&mut self, url: &str, anchor: &str) -> bool {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        self.user_operation(|ed| {
            match LinkFormatter::new(&mut ed.doc).edit_link(url, anchor, range.clone()) {
                Some(bounds) => {
                    if !range.is_empty() {
                        ed.selection = Selection::new(bounds.start, bounds.end);
                    }
                    true
                }
                None => false,
            }
        })
    }

    pub fn remove_link(&mut self) -> bool {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        self.user_operation(|ed| LinkFormatter::new(&mut ed.doc).remove_link(range))
    }

    /// What a link dialog does on confirm: an empty url unlinks, a link
    /// under the selection is edited, anything else gets a new link.
    pub fn link(&mut self, url: &str, anchor: &str) {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        if url.trim().is_empty() {
            self.remove_link();
        } else if link::contains_link(&self.doc, range) {
            self.edit_link(url.trim(), anchor);
        } else {
            self.add_link(url.trim(), anchor);
        }
    }

    /// `(url, anchor)` to pre-fill a link dialog.
    pub fn selected_url_with_anchor(&self) -> (String, String) {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        link::selected_url_with_anchor(&self.doc, range)
    }

    pub fn url_span_bounds(&self) -> Option<Range<usize>> {
        let range = self.selection.clamped(self.doc.len_chars()).to_range();
        link::url_span_bounds(&self.doc, range)
    }

    // === Serialization ===

    /// Replace the document with `markup`. Source formatting is stripped
    /// first; a cursor marker in the markup becomes the caret. Returns the
    /// recoverable problems found.
    pub fn load_from_html(&mut self, markup: &str) -> &[MarkupWarning] {
        self.load(markup, None);
        &self.warnings
    }

    fn load(&mut self, markup: &str, selection: Option<Selection>) {
        let parsed = html::parse(&html::strip_formatting(markup));
        self.doc = Document::from_parts(&parsed.text, parsed.tree.to_spans());
        self.tree = parsed.tree;
        if !self.tree.matches(self.doc.text(), self.doc.spans()) {
            tracing::debug!(target: "weft::tree", "parsed tree is not canonical; rebuilding");
            self.rebuild_tree();
        }

        let len = self.doc.len_chars();
        self.selection = match (selection, parsed.cursor) {
            (Some(selection), _) => selection.clamped(len),
            (None, Some(cursor)) => Selection::collapsed(cursor),
            (None, None) => self.selection.clamped(len),
        };
        self.warnings = parsed.warnings;
        self.pending_styles.clear();
        self.memo.clear();
        self.history.discard_pending();
        tracing::debug!(
            target: "weft::html",
            len,
            spans = self.doc.spans().len(),
            warnings = self.warnings.len(),
            "loaded markup"
        );
    }

    /// Canonical markup, optionally with the cursor marker at the selection
    /// end.
    pub fn to_html(&self, include_cursor_marker: bool) -> String {
        let cursor = include_cursor_marker.then(|| self.selection.end().min(self.doc.len_chars()));
        write_html(&self.tree, cursor)
    }

    /// Canonical markup with block tags on indented lines.
    pub fn to_formatted_html(&self) -> String {
        html::to_formatted_html(&self.to_html(false))
    }

    pub fn strip_formatting(markup: &str) -> String {
        html::strip_formatting(markup)
    }

    /// Markup for the text in `range`, as a clipboard would take it: inline
    /// styles and links clipped to the range, block formatting left out.
    /// Objects are kept only when wholly inside.
    pub fn range_to_html(&self, range: Range<usize>) -> String {
        let range = normalize_range(range.start, range.end, self.doc.len_chars());
        let text = self.doc.slice(range.clone());
        let spans = self
            .doc
            .spans()
            .iter()
            .filter(|s| !s.format.is_block())
            .filter(|s| {
                if s.format.is_object() {
                    range.start <= s.start && s.end <= range.end
                } else {
                    s.start < range.end && range.start < s.end
                }
            })
            .map(|s| {
                let mut span = s.clone();
                span.start = s.start.max(range.start) - range.start;
                span.end = s.end.min(range.end) - range.start;
                span
            })
            .collect();
        let mut spans = SpanSet::from_spans(spans);
        spans.canonicalize(&EditorRope::from_str(&text));
        html::serialize(&text, spans.as_slice(), None)
    }

    /// Replace `range` with pasted `markup` as one undoable change. Inline
    /// styles, links and objects from the markup are kept; its block
    /// elements only contribute line breaks, which the surrounding blocks
    /// handle like typed ones. Returns the markup's warnings.
    pub fn paste_html(&mut self, range: Range<usize>, markup: &str) -> &[MarkupWarning] {
        let range = normalize_range(range.start, range.end, self.doc.len_chars());
        let parsed = html::parse(&html::strip_formatting(markup));
        let styles: Vec<Span> = parsed
            .tree
            .to_spans()
            .into_iter()
            .filter(|s| !s.format.is_block())
            .collect();
        tracing::debug!(
            target: "weft::edit",
            at = range.start,
            len = parsed.tree.len_chars(),
            styles = styles.len(),
            "pasting markup"
        );
        self.pending_styles.clear();
        self.begin_change(ChangeOrigin::User);
        self.commit_styled_change(range, &parsed.text, styles, ChangeOrigin::User);
        self.finish_change(ChangeOrigin::User);
        self.warnings = parsed.warnings;
        &self.warnings
    }

    // === History ===

    pub fn configure_history(&mut self, enabled: bool, capacity: usize) -> Result<(), EditorError> {
        self.history.configure(enabled, capacity)?;
        self.config.history_enabled = enabled;
        self.config.history_size = capacity;
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the state before the last recorded change.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(entry) => {
                self.replay(entry);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(entry) => {
                self.replay(entry);
                true
            }
            None => false,
        }
    }

    fn replay(&mut self, entry: HistoryEntry) {
        self.load(&entry.html, Some(entry.selection));
        tracing::debug!(
            target: "weft::history",
            len = self.doc.len_chars(),
            selection = ?self.selection,
            "replayed history entry"
        );
    }

    // === Persisted state ===

    pub fn save_state(&self) -> EditorState {
        EditorState {
            html: self.to_html(false),
            selection: self.selection,
            history: self.history.clone(),
            has_media: self.doc.has_media(),
        }
    }

    /// Load a saved state. The saved history is validated like a fresh
    /// configuration.
    pub fn restore_state(&mut self, state: EditorState) -> Result<(), EditorError> {
        let mut history = state.history;
        history.configure(history.is_enabled(), history.capacity())?;
        self.load(&state.html, Some(state.selection));
        if state.has_media != self.doc.has_media() {
            tracing::warn!(
                target: "weft::history",
                saved = state.has_media,
                "restored markup disagrees with the saved media flag"
            );
        }
        self.config.history_enabled = history.is_enabled();
        self.config.history_size = history.capacity();
        self.history = history;
        Ok(())
    }
}

impl UndoManager for Editor {
    fn can_undo(&self) -> bool {
        Editor::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        Editor::can_redo(self)
    }

    fn undo(&mut self) -> bool {
        Editor::undo(self)
    }

    fn redo(&mut self) -> bool {
        Editor::redo(self)
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(markup: &str) -> Editor {
        Editor::from_html(markup, EditorConfig::default()).unwrap()
    }

    #[test]
    fn typing_keeps_tree_and_spans_in_sync() {
        let mut ed = editor("<b>ab</b>c");
        ed.set_caret(2);
        ed.type_text("x");
        assert_eq!(ed.to_html(false), "<b>abx</b>c");
        ed.set_caret(0);
        ed.type_text("y");
        assert_eq!(ed.to_html(false), "y<b>abx</b>c");
        assert!(ed.tree().matches(ed.document().text(), ed.spans()));
    }

    #[test]
    fn caret_toggle_styles_the_next_insertion() {
        let mut ed = editor("ab");
        ed.set_caret(2);
        ed.toggle_format(Format::Italic);
        assert!(ed.applied_formats(2, 2).contains(&Format::Italic));
        assert_eq!(ed.to_html(false), "ab");
        ed.type_text("c");
        ed.type_text("d");
        assert_eq!(ed.to_html(false), "ab<i>cd</i>");

        ed.toggle_format(Format::Italic);
        ed.type_text("e");
        assert_eq!(ed.to_html(false), "ab<i>cd</i>e");
    }

    #[test]
    fn double_caret_toggle_cancels() {
        let mut ed = editor("ab");
        ed.set_caret(2);
        ed.toggle_format(Format::Bold);
        ed.toggle_format(Format::Bold);
        ed.type_text("c");
        assert_eq!(ed.to_html(false), "abc");
    }

    #[test]
    fn pending_styles_drop_when_the_caret_moves() {
        let mut ed = editor("ab");
        ed.set_caret(2);
        ed.toggle_format(Format::Bold);
        ed.set_caret(0);
        ed.type_text("c");
        assert_eq!(ed.to_html(false), "cab");
    }

    #[test]
    fn cursor_marker_round_trip() {
        let mut ed = editor("<p>ab</p>");
        ed.set_caret(1);
        let marked = ed.to_html(true);
        assert_eq!(marked, "<p>a<weft_cursor></weft_cursor>b</p>");
        let mut other = editor("");
        other.load_from_html(&marked);
        assert_eq!(other.selection(), Selection::collapsed(1));
        assert_eq!(other.to_html(false), "<p>ab</p>");
    }

    #[test]
    fn host_callbacks_apply_the_edit() {
        let mut ed = editor("<b>hello</b>");
        ed.on_text_will_change("hello", 5, 0, 1);
        ed.on_text_changed("hello!", 5, 0, 1);
        assert_eq!(ed.to_html(false), "<b>hello!</b>");
        assert!(ed.can_undo());
        assert_eq!(ed.selection(), Selection::collapsed(6));
    }

    #[test]
    fn diverged_host_text_resynchronizes() {
        let mut ed = editor("<i>abc</i>");
        ed.on_text_changed("xy", 0, 0, 1);
        assert_eq!(ed.text(), "xy");
        assert!(ed.tree().matches(ed.document().text(), ed.spans()));
    }

    #[test]
    fn out_of_range_selection_is_clamped() {
        let mut ed = editor("abc");
        ed.set_selection(10, 1);
        assert_eq!(ed.selection(), Selection::new(3, 1));
        ed.backspace();
        assert_eq!(ed.text(), "a");
    }

    #[test]
    fn comment_marker_toggle_inserts_and_moves_caret() {
        let mut ed = editor("ab");
        ed.set_caret(2);
        ed.toggle_format(Format::More);
        assert_eq!(ed.to_html(false), "ab<br><!--more--><br>");
        assert_eq!(ed.selection(), Selection::collapsed(5));
        ed.type_text("c");
        assert_eq!(ed.to_html(false), "ab<br><!--more--><br>c");
    }

    #[test]
    fn media_insertion_sets_flag() {
        let mut ed = editor("ab");
        ed.set_caret(1);
        ed.insert_media(MediaKind::Image, AttributeBag::new().with("src", "p.png"));
        assert_eq!(ed.to_html(false), r#"a<img src="p.png" />b"#);
        assert!(ed.has_media());
        assert!(ed.save_state().has_media);
    }

    #[test]
    fn heading_toggle_and_list_markers() {
        let mut ed = editor("<ol start=\"4\"><li>a</li><li>b</li></ol>title");
        assert_eq!(ed.list_item_marker(2).map(|m| m.to_string()), Some("5.".into()));
        ed.set_caret(5);
        ed.toggle_format(Format::Heading(crate::format::HeadingLevel::H3));
        assert_eq!(
            ed.to_html(false),
            "<ol start=\"4\"><li>a</li><li>b</li></ol><h3>title</h3>"
        );
    }
}
