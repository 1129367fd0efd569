//! HTML codec: markup to element tree and back.
//!
//! Canonical output uses double-quoted attributes in source order,
//! `<img ... />` and `<br>` for void elements, `<!--more-->` and
//! `<!--nextpage-->` for comment markers, and escapes `&`, `<`, `>` in text
//! (plus `"` in attributes).

pub mod entities;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod writer;

pub use parser::{ParsedHtml, parse};
pub use pretty::{strip_formatting, to_formatted_html};
pub use writer::write_html;

use crate::span::Span;
use crate::tree::ElementTree;

/// Element name of the cursor marker embedded by
/// [`Editor::to_html`](crate::Editor::to_html).
pub const CURSOR_TAG: &str = "weft_cursor";

impl ElementTree {
    /// Parse markup into a tree. See [`parse`].
    pub fn from_html(markup: &str) -> ParsedHtml {
        parse(markup)
    }

    pub fn to_html(&self) -> String {
        write_html(self, None)
    }
}

/// Serialize text plus canonical spans.
pub fn serialize(text: &str, spans: &[Span], cursor: Option<usize>) -> String {
    write_html(&ElementTree::from_spans(text, spans), cursor)
}
