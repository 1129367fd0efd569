//! The closed set of formats a span can carry, with their HTML tags,
//! boundary behaviour and nesting order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// The object replacement character occupied by media and comment markers.
pub const OBJECT_CHAR: char = '\u{FFFC}';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub fn from_number(n: u8) -> Option<Self> {
        Some(match n {
            1 => Self::H1,
            2 => Self::H2,
            3 => Self::H3,
            4 => Self::H4,
            5 => Self::H5,
            6 => Self::H6,
            _ => return None,
        })
    }

    pub fn number(self) -> u8 {
        self as u8 + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn format(self) -> Format {
        match self {
            ListKind::Unordered => Format::UnorderedList,
            ListKind::Ordered => Format::OrderedList,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentKind {
    /// `<!--more-->`
    More,
    /// `<!--nextpage-->`
    Page,
}

impl CommentKind {
    pub fn sentinel(self) -> &'static str {
        match self {
            CommentKind::More => "more",
            CommentKind::Page => "nextpage",
        }
    }

    pub fn from_sentinel(body: &str) -> Option<Self> {
        match body.trim() {
            "more" => Some(CommentKind::More),
            "nextpage" => Some(CommentKind::Page),
            _ => None,
        }
    }
}

/// How a format behaves when spans are adjusted and toggled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatCategory {
    /// Character styles, freely composable.
    Inline,
    Link,
    /// Lists, list items and quotes: line-aligned containers.
    Container,
    /// Headings and paragraphs: line-aligned, never nested in each other.
    Line,
    Media,
    Comment,
}

/// Formats that are mutually exclusive on a given line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExclusionGroup {
    /// Unordered list, ordered list and quote.
    Container,
    /// Headings and paragraph.
    Line,
}

/// Whether typing at a span edge extends the span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryPolicy {
    pub start_inclusive: bool,
    pub end_inclusive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Subscript,
    Superscript,
    Big,
    Small,
    UnorderedList,
    OrderedList,
    ListItem,
    Quote,
    Heading(HeadingLevel),
    Paragraph,
    Link,
    Image,
    Video,
    More,
    Page,
}

impl Format {
    pub const INLINE: [Format; 9] = [
        Format::Bold,
        Format::Italic,
        Format::Underline,
        Format::Strikethrough,
        Format::Code,
        Format::Subscript,
        Format::Superscript,
        Format::Big,
        Format::Small,
    ];

    pub fn category(self) -> FormatCategory {
        match self {
            Format::Bold
            | Format::Italic
            | Format::Underline
            | Format::Strikethrough
            | Format::Code
            | Format::Subscript
            | Format::Superscript
            | Format::Big
            | Format::Small => FormatCategory::Inline,
            Format::UnorderedList | Format::OrderedList | Format::ListItem | Format::Quote => {
                FormatCategory::Container
            }
            Format::Heading(_) | Format::Paragraph => FormatCategory::Line,
            Format::Link => FormatCategory::Link,
            Format::Image | Format::Video => FormatCategory::Media,
            Format::More | Format::Page => FormatCategory::Comment,
        }
    }

    /// Occupies whole lines.
    pub fn is_block(self) -> bool {
        matches!(
            self.category(),
            FormatCategory::Container | FormatCategory::Line
        )
    }

    pub fn is_inline(self) -> bool {
        self.category() == FormatCategory::Inline
    }

    pub fn is_list(self) -> bool {
        matches!(self, Format::UnorderedList | Format::OrderedList)
    }

    pub fn list_kind(self) -> Option<ListKind> {
        match self {
            Format::UnorderedList => Some(ListKind::Unordered),
            Format::OrderedList => Some(ListKind::Ordered),
            _ => None,
        }
    }

    /// Media and comment markers own exactly one object character.
    pub fn is_object(self) -> bool {
        matches!(
            self.category(),
            FormatCategory::Media | FormatCategory::Comment
        )
    }

    pub fn media_kind(self) -> Option<MediaKind> {
        match self {
            Format::Image => Some(MediaKind::Image),
            Format::Video => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn comment_kind(self) -> Option<CommentKind> {
        match self {
            Format::More => Some(CommentKind::More),
            Format::Page => Some(CommentKind::Page),
            _ => None,
        }
    }

    pub fn exclusion_group(self) -> Option<ExclusionGroup> {
        match self {
            Format::UnorderedList | Format::OrderedList | Format::Quote => {
                Some(ExclusionGroup::Container)
            }
            Format::Heading(_) | Format::Paragraph => Some(ExclusionGroup::Line),
            _ => None,
        }
    }

    pub fn boundary(self) -> BoundaryPolicy {
        match self.category() {
            FormatCategory::Inline => BoundaryPolicy {
                start_inclusive: false,
                end_inclusive: true,
            },
            FormatCategory::Link | FormatCategory::Media | FormatCategory::Comment => {
                BoundaryPolicy {
                    start_inclusive: false,
                    end_inclusive: false,
                }
            }
            FormatCategory::Container | FormatCategory::Line => BoundaryPolicy {
                start_inclusive: true,
                end_inclusive: true,
            },
        }
    }

    /// Nesting order for spans covering the same range: lower ranks wrap
    /// higher ones. Containers share a rank so that nested lists and quotes
    /// keep their document order.
    pub fn rank(self) -> u8 {
        match self.category() {
            FormatCategory::Container => 0,
            FormatCategory::Line => 1,
            FormatCategory::Link => 2,
            FormatCategory::Inline => 3,
            FormatCategory::Media | FormatCategory::Comment => 4,
        }
    }

    /// Tag written for spans that were not parsed from markup.
    pub fn canonical_tag(self) -> &'static str {
        match self {
            Format::Bold => "b",
            Format::Italic => "i",
            Format::Underline => "u",
            Format::Strikethrough => "del",
            Format::Code => "code",
            Format::Subscript => "sub",
            Format::Superscript => "sup",
            Format::Big => "big",
            Format::Small => "small",
            Format::UnorderedList => "ul",
            Format::OrderedList => "ol",
            Format::ListItem => "li",
            Format::Quote => "blockquote",
            Format::Heading(HeadingLevel::H1) => "h1",
            Format::Heading(HeadingLevel::H2) => "h2",
            Format::Heading(HeadingLevel::H3) => "h3",
            Format::Heading(HeadingLevel::H4) => "h4",
            Format::Heading(HeadingLevel::H5) => "h5",
            Format::Heading(HeadingLevel::H6) => "h6",
            Format::Paragraph => "p",
            Format::Link => "a",
            Format::Image => "img",
            Format::Video => "video",
            Format::More => "more",
            Format::Page => "nextpage",
        }
    }

    /// Format for a lowercase element name, including tag aliases.
    pub fn from_tag(tag: &str) -> Option<Format> {
        Some(match tag {
            "b" | "strong" => Format::Bold,
            "i" | "em" | "cite" | "dfn" => Format::Italic,
            "u" | "ins" => Format::Underline,
            "del" | "strike" | "s" => Format::Strikethrough,
            "code" | "tt" => Format::Code,
            "sub" => Format::Subscript,
            "sup" => Format::Superscript,
            "big" => Format::Big,
            "small" => Format::Small,
            "ul" => Format::UnorderedList,
            "ol" => Format::OrderedList,
            "li" => Format::ListItem,
            "blockquote" => Format::Quote,
            "p" => Format::Paragraph,
            "a" => Format::Link,
            "img" => Format::Image,
            "video" => Format::Video,
            _ => {
                let level = tag
                    .strip_prefix('h')
                    .and_then(|n| n.parse::<u8>().ok())
                    .and_then(HeadingLevel::from_number)?;
                Format::Heading(level)
            }
        })
    }

    fn name(self) -> &'static str {
        match self {
            Format::Bold => "bold",
            Format::Italic => "italic",
            Format::Underline => "underline",
            Format::Strikethrough => "strikethrough",
            Format::Code => "code",
            Format::Subscript => "subscript",
            Format::Superscript => "superscript",
            Format::Big => "big",
            Format::Small => "small",
            Format::UnorderedList => "unordered_list",
            Format::OrderedList => "ordered_list",
            Format::ListItem => "list_item",
            Format::Quote => "quote",
            Format::Heading(_) => self.canonical_tag(),
            Format::Paragraph => "paragraph",
            Format::Link => "link",
            Format::Image => "image",
            Format::Video => "video",
            Format::More => "more",
            Format::Page => "page",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let format = match lower.as_str() {
            "bold" => Format::Bold,
            "italic" => Format::Italic,
            "underline" => Format::Underline,
            "strikethrough" => Format::Strikethrough,
            "code" => Format::Code,
            "subscript" => Format::Subscript,
            "superscript" => Format::Superscript,
            "big" => Format::Big,
            "small" => Format::Small,
            "unordered_list" | "ul" => Format::UnorderedList,
            "ordered_list" | "ol" => Format::OrderedList,
            "list_item" => Format::ListItem,
            "quote" => Format::Quote,
            "paragraph" => Format::Paragraph,
            "link" => Format::Link,
            "image" => Format::Image,
            "video" => Format::Video,
            "more" => Format::More,
            "page" => Format::Page,
            other => match other.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) {
                Some(n) => Format::Heading(
                    HeadingLevel::from_number(n)
                        .ok_or_else(|| EditorError::UnknownFormat(s.into()))?,
                ),
                None => return Err(EditorError::UnknownFormat(s.into())),
            },
        };
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_aliases_map_to_one_format() {
        assert_eq!(Format::from_tag("strong"), Some(Format::Bold));
        assert_eq!(Format::from_tag("b"), Some(Format::Bold));
        assert_eq!(Format::from_tag("strike"), Some(Format::Strikethrough));
        assert_eq!(
            Format::from_tag("h3"),
            Some(Format::Heading(HeadingLevel::H3))
        );
        assert_eq!(Format::from_tag("h7"), None);
        assert_eq!(Format::from_tag("span"), None);
    }

    #[test]
    fn ranks_nest_containers_outside_inline() {
        assert_eq!(Format::Quote.rank(), Format::OrderedList.rank());
        assert_eq!(Format::OrderedList.rank(), Format::ListItem.rank());
        assert!(Format::ListItem.rank() < Format::Paragraph.rank());
        assert!(Format::Link.rank() < Format::Bold.rank());
        assert!(Format::Bold.rank() < Format::Image.rank());
    }

    #[test]
    fn exclusion_groups() {
        assert_eq!(
            Format::Quote.exclusion_group(),
            Format::OrderedList.exclusion_group()
        );
        assert_eq!(
            Format::Paragraph.exclusion_group(),
            Format::Heading(HeadingLevel::H2).exclusion_group()
        );
        assert_eq!(Format::ListItem.exclusion_group(), None);
        assert_eq!(Format::Bold.exclusion_group(), None);
    }

    #[test]
    fn names_round_trip() {
        for format in [
            Format::Bold,
            Format::OrderedList,
            Format::Heading(HeadingLevel::H6),
            Format::Page,
        ] {
            assert_eq!(format.to_string().parse::<Format>(), Ok(format));
        }
        assert!("blink".parse::<Format>().is_err());
        assert!("h9".parse::<Format>().is_err());
    }
}
