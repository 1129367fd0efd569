//! Error and diagnostic types.
//!
//! `EditorError` is returned from fallible operations. Malformed markup is
//! never an error: the parser recovers and reports `MarkupWarning`s instead.

use miette::{Diagnostic, SourceSpan};
use smol_str::SmolStr;

/// Errors surfaced by the editor API.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    /// Invalid editor configuration, such as an empty history while history is on.
    #[error("invalid configuration: {reason}")]
    #[diagnostic(
        code(weft::config),
        help("history_size must be at least 1 when history is enabled")
    )]
    Configuration { reason: String },

    /// A format name that does not correspond to any known format.
    #[error("unknown format `{0}`")]
    #[diagnostic(code(weft::format))]
    UnknownFormat(SmolStr),
}

impl EditorError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Recoverable problem found while parsing markup.
///
/// The span points into the markup that was handed to the parser (after
/// formatting whitespace was stripped). Attach the source with
/// `miette::Report::new(w).with_source_code(..)` to render it.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{kind}")]
#[diagnostic(code(weft::html::markup), severity(Warning))]
pub struct MarkupWarning {
    pub kind: MarkupWarningKind,
    #[label("here")]
    pub location: SourceSpan,
}

impl MarkupWarning {
    pub fn new(kind: MarkupWarningKind, byte_range: std::ops::Range<usize>) -> Self {
        Self {
            kind,
            location: SourceSpan::new(byte_range.start.into(), byte_range.len()),
        }
    }

    /// Byte offset of the offending construct in the parsed markup.
    pub fn offset(&self) -> usize {
        self.location.offset()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MarkupWarningKind {
    #[error("closing tag `</{0}>` has no matching open element")]
    UnmatchedClose(SmolStr),
    #[error("`</{closing}>` implicitly closed `<{open}>`")]
    ImplicitClose { open: SmolStr, closing: SmolStr },
    #[error("unknown tag `<{0}>` skipped, content kept")]
    UnknownTag(SmolStr),
    #[error("unsupported comment skipped")]
    UnknownComment,
    #[error("markup ended with `<{0}>` still open")]
    Truncated(SmolStr),
    #[error("unterminated markup construct")]
    Unterminated,
}
