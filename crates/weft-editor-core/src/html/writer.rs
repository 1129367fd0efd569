//! Element tree to markup.

use crate::format::Format;
use crate::html::CURSOR_TAG;
use crate::html::entities::escape_text;
use crate::tree::{ElementKind, ElementTree, Node, NodeId};

/// Serialize `tree`, optionally embedding the cursor marker at `cursor`.
pub fn write_html(tree: &ElementTree, cursor: Option<usize>) -> String {
    let mut writer = HtmlWriter {
        tree,
        out: String::new(),
        cursor,
    };
    writer.node(tree.root());
    writer.flush_cursor();
    writer.out
}

struct HtmlWriter<'a> {
    tree: &'a ElementTree,
    out: String,
    /// Cursor offset still waiting to be written.
    cursor: Option<usize>,
}

impl HtmlWriter<'_> {
    fn flush_cursor(&mut self) {
        if self.cursor.take().is_some() {
            self.out.push('<');
            self.out.push_str(CURSOR_TAG);
            self.out.push_str("></");
            self.out.push_str(CURSOR_TAG);
            self.out.push('>');
        }
    }

    fn cursor_at(&self, offset: usize) -> bool {
        self.cursor == Some(offset)
    }

    fn node(&mut self, id: NodeId) {
        match self.tree.node(id) {
            Node::Text(text) => {
                if text.synthetic {
                    return;
                }
                match self.cursor {
                    Some(c) if text.start <= c && c <= text.end => {
                        let split = text
                            .text
                            .char_indices()
                            .nth(c - text.start)
                            .map(|(b, _)| b)
                            .unwrap_or(text.text.len());
                        escape_text(&text.text[..split], &mut self.out);
                        self.flush_cursor();
                        escape_text(&text.text[split..], &mut self.out);
                    }
                    _ => escape_text(&text.text, &mut self.out),
                }
            }
            Node::Element(element) => {
                let content_start = element.content_range().start;
                match &element.kind {
                    ElementKind::Root => {
                        for &child in &element.children {
                            self.node(child);
                        }
                    }
                    ElementKind::LineBreak => {
                        if self.cursor_at(element.start) {
                            self.flush_cursor();
                        }
                        self.out.push_str("<br>");
                    }
                    ElementKind::Styled(format @ (Format::More | Format::Page)) => {
                        if self.cursor_at(element.start) {
                            self.flush_cursor();
                        }
                        self.out.push_str("<!--");
                        self.out
                            .push_str(format.comment_kind().map_or("", |k| k.sentinel()));
                        self.out.push_str("-->");
                    }
                    ElementKind::Styled(Format::Image) => {
                        if self.cursor_at(element.start) {
                            self.flush_cursor();
                        }
                        self.out.push('<');
                        self.out.push_str(&element.tag);
                        element.attributes.write_html(&mut self.out);
                        self.out.push_str(" />");
                    }
                    _ => {
                        self.out.push('<');
                        self.out.push_str(&element.tag);
                        element.attributes.write_html(&mut self.out);
                        self.out.push('>');
                        if element.children.is_empty() && self.cursor_at(content_start) {
                            self.flush_cursor();
                        }
                        for &child in &element.children {
                            self.node(child);
                        }
                        self.out.push_str("</");
                        self.out.push_str(&element.tag);
                        self.out.push('>');
                    }
                }
            }
        }
    }
}
