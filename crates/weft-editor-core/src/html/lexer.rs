//! A small forgiving HTML tokenizer.
//!
//! Produces tags, decoded text and comments with their byte ranges in the
//! source. It never fails: anything that does not look like markup is text.

use std::borrow::Cow;
use std::ops::Range;

use smol_str::SmolStr;

use crate::attributes::AttributeBag;
use crate::html::entities::decode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        name: SmolStr,
        attributes: AttributeBag,
        self_closing: bool,
    },
    EndTag {
        name: SmolStr,
    },
    /// Text with character references decoded.
    Text(Cow<'a, str>),
    /// Body of `<!-- ... -->`.
    Comment(&'a str),
    /// Doctype, processing instruction or CDATA section.
    Other,
    /// A construct the input ended in the middle of.
    Unterminated,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn bump_to_end(&mut self) -> (Token<'a>, Range<usize>) {
        let start = self.pos;
        self.pos = self.src.len();
        (Token::Unterminated, start..self.pos)
    }

    fn comment(&mut self) -> (Token<'a>, Range<usize>) {
        let src = self.src;
        let start = self.pos;
        let body_start = start + 4;
        match src[body_start..].find("-->") {
            Some(end) => {
                let body = &src[body_start..body_start + end];
                self.pos = body_start + end + 3;
                (Token::Comment(body), start..self.pos)
            }
            None => self.bump_to_end(),
        }
    }

    fn skip_to_gt(&mut self, token: Token<'a>) -> (Token<'a>, Range<usize>) {
        let start = self.pos;
        match self.rest().find('>') {
            Some(end) => {
                self.pos += end + 1;
                (token, start..self.pos)
            }
            None => self.bump_to_end(),
        }
    }

    fn end_tag(&mut self) -> (Token<'a>, Range<usize>) {
        let start = self.pos;
        let name_start = start + 2;
        let name_len = tag_name_len(&self.src[name_start..]);
        let name = SmolStr::new(self.src[name_start..name_start + name_len].to_ascii_lowercase());
        match self.src[name_start..].find('>') {
            Some(end) => {
                self.pos = name_start + end + 1;
                (Token::EndTag { name }, start..self.pos)
            }
            None => self.bump_to_end(),
        }
    }

    fn start_tag(&mut self) -> (Token<'a>, Range<usize>) {
        let src = self.src;
        let start = self.pos;
        let name_start = start + 1;
        let name_len = tag_name_len(&src[name_start..]);
        let name = SmolStr::new(src[name_start..name_start + name_len].to_ascii_lowercase());
        let mut attributes = AttributeBag::new();
        let bytes = src.as_bytes();
        let mut i = name_start + name_len;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return self.bump_to_end();
            }
            match bytes[i] {
                b'>' => {
                    self.pos = i + 1;
                    let token = Token::StartTag {
                        name,
                        attributes,
                        self_closing: false,
                    };
                    return (token, start..self.pos);
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self.pos = i + 2;
                    let token = Token::StartTag {
                        name,
                        attributes,
                        self_closing: true,
                    };
                    return (token, start..self.pos);
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let attr_name = &src[attr_start..i];
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if bytes.get(i) != Some(&b'=') {
                attributes.set(attr_name, "");
                continue;
            }
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = match bytes.get(i).copied() {
                Some(quote) if quote == b'"' || quote == b'\'' => {
                    let value_start = i + 1;
                    let Some(len) = src[value_start..].find(quote as char) else {
                        return self.bump_to_end();
                    };
                    i = value_start + len + 1;
                    &src[value_start..value_start + len]
                }
                _ => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>'
                    {
                        i += 1;
                    }
                    &src[value_start..i]
                }
            };
            attributes.set(attr_name, &decode(value));
        }
    }

    fn text(&mut self) -> (Token<'a>, Range<usize>) {
        let src = self.src;
        let start = self.pos;
        let mut end = src.len();
        let mut search = start + self.rest().chars().next().map_or(1, char::len_utf8);
        while let Some(lt) = src[search.min(src.len())..].find('<') {
            let at = search + lt;
            if starts_markup(&src[at..]) {
                end = at;
                break;
            }
            search = at + 1;
        }
        self.pos = end;
        (Token::Text(decode(&src[start..end])), start..end)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = (Token<'a>, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        let item = if rest.starts_with("<!--") {
            self.comment()
        } else if rest.starts_with("</") && starts_markup(rest) {
            self.end_tag()
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            self.skip_to_gt(Token::Other)
        } else if starts_markup(rest) {
            self.start_tag()
        } else {
            self.text()
        };
        Some(item)
    }
}

/// `<` followed by a letter, `/letter`, `!` or `?`.
fn starts_markup(s: &str) -> bool {
    let mut chars = s.chars();
    if chars.next() != Some('<') {
        return false;
    }
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '!' || c == '?' => true,
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

fn tag_name_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':'))
        .count()
}
