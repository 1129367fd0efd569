//! weft-editor-core: a rich-text editing engine without UI dependencies.
//!
//! This crate provides:
//! - `TextBuffer` trait for text storage abstraction, `EditorRope` backing it
//! - `SpanSet` - formatting as character ranges over the plain text
//! - `ElementTree` - the same document as nested HTML elements
//! - `html` - a tolerant HTML reader and a canonical writer
//! - formatters for inline styles, lists, quotes, headings, links and objects
//! - `Editor` - the facade hosts drive, with snapshot undo/redo

pub mod attributes;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod format;
pub mod formatter;
pub mod history;
pub mod html;
pub mod span;
pub mod text;
pub mod tree;
pub mod types;

pub use attributes::AttributeBag;
pub use config::EditorConfig;
pub use document::Document;
pub use editor::{Editor, EditorState};
pub use error::{EditorError, MarkupWarning, MarkupWarningKind};
pub use format::{
    CommentKind, Format, FormatCategory, HeadingLevel, ListKind, MediaKind, OBJECT_CHAR,
};
pub use formatter::ListItemMarker;
pub use history::{History, HistoryEntry, UndoManager};
pub use smol_str::SmolStr;
pub use span::{Span, SpanSet};
pub use text::{EditorRope, TextBuffer};
pub use tree::ElementTree;
pub use types::{ChangeOrigin, Selection, TextChange};
