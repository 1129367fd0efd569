//! Text buffer abstraction for editor storage.
//!
//! The `TextBuffer` trait is the single shared substrate of the editor: spans
//! and tree nodes only ever hold char offsets into it. `EditorRope` is the
//! ropey-backed implementation used by [`Editor`](crate::Editor).

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in bytes (UTF-8).
    fn len_bytes(&self) -> usize;

    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Append text at end.
    fn push(&mut self, text: &str) {
        self.insert(self.len_chars(), text);
    }

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Convert char offset to byte offset.
    fn char_to_byte(&self, char_offset: usize) -> usize;

    /// Convert byte offset to char offset.
    fn byte_to_char(&self, byte_offset: usize) -> usize;

    /// Start of the line containing `offset`.
    fn line_start(&self, offset: usize) -> usize {
        let mut pos = offset.min(self.len_chars());
        while pos > 0 {
            if let Some('\n') = self.char_at(pos - 1) {
                return pos;
            }
            pos -= 1;
        }
        0
    }

    /// End of the line containing `offset`: the position of its `\n`, or the
    /// buffer length for the last line.
    fn line_end(&self, offset: usize) -> usize {
        let len = self.len_chars();
        let mut pos = offset.min(len);
        while pos < len {
            if let Some('\n') = self.char_at(pos) {
                return pos;
            }
            pos += 1;
        }
        len
    }

    fn is_line_start(&self, offset: usize) -> bool {
        offset == 0 || self.char_at(offset.wrapping_sub(1)) == Some('\n')
    }

    fn is_line_end(&self, offset: usize) -> bool {
        offset >= self.len_chars() || self.char_at(offset) == Some('\n')
    }
}

/// Ropey-backed text buffer for local editing.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }

    /// Get a reference to the underlying rope (for advanced operations).
    pub fn rope(&self) -> &ropey::Rope {
        &self.rope
    }
}

impl std::fmt::Debug for EditorRope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorRope")
            .field("text", &self.rope.to_string())
            .finish()
    }
}

impl TextBuffer for EditorRope {
    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
    }

    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.rope.remove(char_range.clone());
        self.rope.insert(char_range.start, text);
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.rope.char_to_byte(char_offset)
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_char(byte_offset)
    }

    // Walk the rope's char iterator instead of indexing char by char.
    fn line_start(&self, offset: usize) -> usize {
        let offset = offset.min(self.rope.len_chars());
        let mut chars = self.rope.chars_at(offset);
        let mut pos = offset;
        while let Some(c) = chars.prev() {
            if c == '\n' {
                return pos;
            }
            pos -= 1;
        }
        0
    }

    fn line_end(&self, offset: usize) -> usize {
        let len = self.rope.len_chars();
        let offset = offset.min(len);
        self.rope
            .chars_at(offset)
            .position(|c| c == '\n')
            .map(|i| offset + i)
            .unwrap_or(len)
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut rope = EditorRope::from_str("hello world");
        assert_eq!(rope.len_chars(), 11);
        assert_eq!(rope.to_string(), "hello world");

        rope.insert(5, " beautiful");
        assert_eq!(rope.to_string(), "hello beautiful world");

        rope.delete(5..15);
        assert_eq!(rope.to_string(), "hello world");
    }

    #[test]
    fn test_char_at() {
        let rope = EditorRope::from_str("hello");
        assert_eq!(rope.char_at(0), Some('h'));
        assert_eq!(rope.char_at(4), Some('o'));
        assert_eq!(rope.char_at(5), None);
    }

    #[test]
    fn test_slice() {
        let rope = EditorRope::from_str("hello world");
        assert_eq!(rope.slice(0..5).as_deref(), Some("hello"));
        assert_eq!(rope.slice(6..11).as_deref(), Some("world"));
        assert_eq!(rope.slice(0..100), None);
    }

    #[test]
    fn test_offset_conversion() {
        // "hello 🌍" - emoji is 4 bytes, 1 char
        let rope = EditorRope::from_str("hello 🌍");
        assert_eq!(rope.len_chars(), 7);
        assert_eq!(rope.len_bytes(), 10);

        assert_eq!(rope.char_to_byte(6), 6);
        assert_eq!(rope.char_to_byte(7), 10);
        assert_eq!(rope.byte_to_char(10), 7);
    }

    #[test]
    fn test_replace_across_line_break() {
        let mut rope = EditorRope::from_str("hello\nworld");
        rope.replace(4..7, "X");
        assert_eq!(rope.to_string(), "hellXorld");
        rope.replace(0..0, "\n");
        assert!(rope.is_line_start(1));
    }

    #[test]
    fn test_line_bounds() {
        let rope = EditorRope::from_str("ab\n\ncd");
        assert_eq!(rope.line_start(1), 0);
        assert_eq!(rope.line_end(1), 2);
        // Empty line in the middle.
        assert_eq!(rope.line_start(3), 3);
        assert_eq!(rope.line_end(3), 3);
        assert_eq!(rope.line_start(6), 4);
        assert_eq!(rope.line_end(4), 6);
        assert!(rope.is_line_start(4));
        assert!(rope.is_line_end(2));
        assert!(!rope.is_line_end(1));
    }

    #[test]
    fn test_trait_line_helpers_match_rope_overrides() {
        struct Plain(String);
        impl TextBuffer for Plain {
            fn len_bytes(&self) -> usize {
                self.0.len()
            }
            fn len_chars(&self) -> usize {
                self.0.chars().count()
            }
            fn insert(&mut self, _: usize, _: &str) {}
            fn delete(&mut self, _: Range<usize>) {}
            fn slice(&self, _: Range<usize>) -> Option<SmolStr> {
                None
            }
            fn char_at(&self, i: usize) -> Option<char> {
                self.0.chars().nth(i)
            }
            fn to_string(&self) -> String {
                self.0.clone()
            }
            fn char_to_byte(&self, c: usize) -> usize {
                c
            }
            fn byte_to_char(&self, b: usize) -> usize {
                b
            }
        }

        let text = "one\ntwo\n\nthree";
        let plain = Plain(text.to_string());
        let rope = EditorRope::from_str(text);
        for offset in 0..=text.len() {
            assert_eq!(plain.line_start(offset), rope.line_start(offset), "{offset}");
            assert_eq!(plain.line_end(offset), rope.line_end(offset), "{offset}");
        }
    }
}
