//! Markup to element tree.
//!
//! A single pass over the token stream with an open-element stack and a
//! running char offset. Recoverable problems become [`MarkupWarning`]s.

use std::ops::Range;

use smol_str::SmolStr;

use crate::attributes::AttributeBag;
use crate::error::{MarkupWarning, MarkupWarningKind};
use crate::format::{CommentKind, Format};
use crate::html::CURSOR_TAG;
use crate::html::lexer::{Lexer, Token};
use crate::tree::{ElementKind, ElementTree, Node, TreeBuilder};

/// Result of parsing markup.
#[derive(Clone, Debug)]
pub struct ParsedHtml {
    pub text: String,
    pub tree: ElementTree,
    pub warnings: Vec<MarkupWarning>,
    /// Char offset of the cursor marker, if the markup carried one.
    pub cursor: Option<usize>,
}

/// Tags that never have content and are dropped when unsupported.
const VOID_TAGS: &[&str] = &[
    "area", "base", "col", "embed", "hr", "input", "link", "meta", "param", "source", "track",
    "wbr",
];

pub fn parse(markup: &str) -> ParsedHtml {
    let mut parser = Parser {
        builder: TreeBuilder::new(),
        pending_newline: false,
        after_marker: false,
        skipped: Vec::new(),
        warnings: Vec::new(),
        cursor: None,
    };

    for (token, range) in Lexer::new(markup) {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => parser.start_tag(name, attributes, self_closing, range),
            Token::EndTag { name } => parser.end_tag(name, range),
            Token::Text(text) => parser.text(&text),
            Token::Comment(body) => parser.comment(body, range),
            Token::Other => {}
            Token::Unterminated => {
                parser.warn(MarkupWarningKind::Unterminated, range);
                break;
            }
        }
    }

    parser.finish(markup.len())
}

struct Parser {
    builder: TreeBuilder,
    /// A block was closed; the next content starts on a new line.
    pending_newline: bool,
    /// A comment marker was just emitted; content after it starts a new line.
    after_marker: bool,
    /// Unknown tags whose content is being kept.
    skipped: Vec<SmolStr>,
    warnings: Vec<MarkupWarning>,
    cursor: Option<usize>,
}

impl Parser {
    fn warn(&mut self, kind: MarkupWarningKind, range: Range<usize>) {
        tracing::warn!(target: "weft::html", offset = range.start, "{kind}");
        self.warnings.push(MarkupWarning::new(kind, range));
    }

    fn flush_newline(&mut self) {
        if std::mem::take(&mut self.pending_newline) {
            self.builder.boundary();
            self.after_marker = false;
        }
    }

    fn line_break(&mut self) {
        self.builder
            .void(ElementKind::LineBreak, SmolStr::new_static("br"), AttributeBag::new());
    }

    /// Move content that directly follows a comment marker to the next line.
    fn leave_marker_line(&mut self) {
        if std::mem::take(&mut self.after_marker) {
            self.line_break();
        }
    }

    fn open_tag(&self, id: crate::tree::NodeId) -> SmolStr {
        self.builder
            .tree()
            .element(id)
            .map(|e| e.tag.clone())
            .unwrap_or_default()
    }

    /// Open element a new `format` element implicitly closes: an open
    /// paragraph for any block, an open item for a sibling item. Returns its
    /// index in the open-element stack.
    fn implicitly_closed(&self, format: Format) -> Option<usize> {
        let open = self.builder.open_elements();
        let tree = self.builder.tree();
        let (idx, kind) = open
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, &id)| match tree.element(id) {
                Some(e) if e.kind.is_block() => Some((i, &e.kind)),
                _ => None,
            })?;
        let closes = match kind {
            ElementKind::Styled(Format::Paragraph) => format.is_block(),
            ElementKind::ListItem => format == Format::ListItem,
            _ => false,
        };
        closes.then_some(idx)
    }

    fn current_is_list(&self) -> bool {
        self.builder.open_elements().last().is_some_and(|&id| {
            matches!(
                self.builder.tree().node(id),
                Node::Element(e) if matches!(e.kind, ElementKind::List(_))
            )
        })
    }

    fn start_tag(
        &mut self,
        name: SmolStr,
        attributes: AttributeBag,
        self_closing: bool,
        range: Range<usize>,
    ) {
        if name == CURSOR_TAG {
            self.cursor = Some(self.builder.offset() + usize::from(self.pending_newline || self.after_marker));
            return;
        }
        if let Some(idx) = Format::from_tag(&name).and_then(|f| self.implicitly_closed(f)) {
            self.close_from(idx, &name, range.clone());
        }
        self.flush_newline();

        if name == "br" {
            self.after_marker = false;
            self.line_break();
            return;
        }

        let Some(format) = Format::from_tag(&name) else {
            if !self_closing && !VOID_TAGS.contains(&name.as_str()) {
                self.skipped.push(name.clone());
            }
            self.warn(MarkupWarningKind::UnknownTag(name), range);
            return;
        };

        let kind = ElementKind::for_format(format);
        if format.is_block() {
            self.after_marker = false;
        } else {
            self.leave_marker_line();
        }
        if kind.void_char().is_some() {
            self.builder.void(kind, name, attributes);
            return;
        }
        if self_closing {
            return;
        }
        if format.is_block() && self.builder.offset() > 0 && self.builder.last_char() != Some('\n')
        {
            self.builder.boundary();
        }
        self.builder.open(kind, name, attributes);
    }

    fn end_tag(&mut self, name: SmolStr, range: Range<usize>) {
        if name == CURSOR_TAG || name == "br" {
            return;
        }
        let open = self.builder.open_elements().to_vec();
        let Some(idx) = open.iter().rposition(|&id| self.open_tag(id) == name) else {
            if let Some(pos) = self.skipped.iter().rposition(|s| *s == name) {
                self.skipped.remove(pos);
            } else if !matches!(Format::from_tag(&name), Some(Format::Image | Format::Video)) {
                self.warn(MarkupWarningKind::UnmatchedClose(name), range);
            }
            return;
        };

        self.close_from(idx, &name, range);
    }

    /// Close the open elements from stack index `idx` up, on behalf of the
    /// tag `closing`. Inner elements other than paragraphs and list items,
    /// whose end tags may be omitted, are reported.
    fn close_from(&mut self, idx: usize, closing: &SmolStr, range: Range<usize>) {
        let open = self.builder.open_elements().to_vec();
        for &inner in open[idx + 1..].iter().rev() {
            let open_tag = self.open_tag(inner);
            if !matches!(open_tag.as_str(), "p" | "li") {
                self.warn(
                    MarkupWarningKind::ImplicitClose {
                        open: open_tag,
                        closing: closing.clone(),
                    },
                    range.clone(),
                );
            }
            self.close_one();
        }
        self.close_one();
    }

    fn close_one(&mut self) {
        if let Some(id) = self.builder.close() {
            let is_block = self
                .builder
                .tree()
                .element(id)
                .is_some_and(|e| e.kind.is_block());
            if is_block {
                self.pending_newline = true;
            }
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.current_is_list() && text.trim().is_empty() {
            return;
        }
        self.flush_newline();
        if text.starts_with('\n') {
            self.after_marker = false;
        }
        self.leave_marker_line();
        self.builder.text(text);
    }

    /// Sentinel comments become markers on a line of their own.
    fn comment(&mut self, body: &str, range: Range<usize>) {
        self.flush_newline();
        match CommentKind::from_sentinel(body) {
            Some(kind) => {
                let format = match kind {
                    CommentKind::More => Format::More,
                    CommentKind::Page => Format::Page,
                };
                if self.builder.last_char().is_some_and(|c| c != '\n') {
                    self.line_break();
                }
                self.builder.void(
                    ElementKind::Styled(format),
                    SmolStr::new_static(kind.sentinel()),
                    AttributeBag::new(),
                );
                self.after_marker = true;
            }
            None => self.warn(MarkupWarningKind::UnknownComment, range),
        }
    }

    fn finish(mut self, markup_len: usize) -> ParsedHtml {
        let open = self.builder.open_elements().to_vec();
        for &id in open.iter().rev() {
            let tag = self.open_tag(id);
            self.warn(MarkupWarningKind::Truncated(tag), markup_len..markup_len);
        }
        let tree = self.builder.finish();
        let text = tree.text();
        let cursor = self.cursor.map(|c| c.min(tree.len_chars()));
        tracing::debug!(
            target: "weft::html",
            len = tree.len_chars(),
            warnings = self.warnings.len(),
            "parsed markup"
        );
        ParsedHtml {
            text,
            tree,
            warnings: self.warnings,
            cursor,
        }
    }
}
