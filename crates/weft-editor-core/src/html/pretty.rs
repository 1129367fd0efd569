//! Source formatting for markup: indentation between block tags and its
//! inverse.

use crate::format::Format;
use crate::html::lexer::{Lexer, Token};

const INDENT: &str = "  ";

#[derive(Clone, Copy, PartialEq, Eq)]
enum TagClass {
    None,
    Inline,
    BlockOpen,
    BlockClose,
}

fn classify(token: &Token<'_>) -> TagClass {
    let block = |name: &str| Format::from_tag(name).is_some_and(Format::is_block);
    match token {
        Token::StartTag {
            name, self_closing, ..
        } if block(name.as_str()) && !*self_closing => TagClass::BlockOpen,
        Token::EndTag { name } if block(name.as_str()) => TagClass::BlockClose,
        Token::StartTag { .. } | Token::EndTag { .. } | Token::Comment(_) | Token::Other => {
            TagClass::Inline
        }
        Token::Text(_) | Token::Unterminated => TagClass::None,
    }
}

/// Put block tags on their own lines, indented two spaces per open block.
///
/// A line break goes between two adjacent tags when the second opens a block
/// or the first closes one. Text content is never altered.
pub fn to_formatted_html(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len() + markup.len() / 4);
    let mut depth: usize = 0;
    let mut previous = TagClass::None;

    for (token, range) in Lexer::new(markup) {
        let class = classify(&token);
        if class == TagClass::BlockClose {
            depth = depth.saturating_sub(1);
        }
        let adjacent_tags = previous != TagClass::None && class != TagClass::None;
        if adjacent_tags && (class == TagClass::BlockOpen || previous == TagClass::BlockClose) {
            out.push('\n');
            for _ in 0..depth {
                out.push_str(INDENT);
            }
        }
        out.push_str(&markup[range]);
        if class == TagClass::BlockOpen {
            depth += 1;
        }
        previous = class;
    }
    out
}

/// Undo source formatting: drop whitespace runs between tags that contain a
/// line break and turn any other line break run into one space.
pub fn strip_formatting(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    for (token, range) in Lexer::new(markup) {
        let raw = &markup[range];
        match token {
            Token::Text(_) => {
                if raw.trim_matches([' ', '\t', '\n', '\r']).is_empty() && raw.contains('\n') {
                    continue;
                }
                collapse_line_breaks(raw, &mut out);
            }
            _ => out.push_str(raw),
        }
    }
    out
}

fn collapse_line_breaks(raw: &str, out: &mut String) {
    let mut pending_ws = String::new();
    let mut saw_newline = false;
    for c in raw.chars() {
        match c {
            '\n' | '\r' => saw_newline = true,
            ' ' | '\t' => pending_ws.push(c),
            _ => {
                if saw_newline {
                    out.push(' ');
                } else {
                    out.push_str(&pending_ws);
                }
                pending_ws.clear();
                saw_newline = false;
                out.push(c);
            }
        }
    }
    if saw_newline {
        out.push(' ');
    } else {
        out.push_str(&pending_ws);
    }
}
