//! Text buffer abstraction for the editor.
//!
//! The `TextBuffer` trait gives the orchestrator a common interface over the
//! text it owns, so a surface can back it with whatever storage suits it.
//! Every mutation bumps a version counter which check requests are tagged
//! with.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

/// A text buffer that supports editing by char range.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// True when the buffer holds nothing but whitespace.
    fn is_blank(&self) -> bool {
        self.to_string().trim().is_empty()
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Replace the whole contents.
    fn set_text(&mut self, text: &str) {
        self.replace(0..self.len_chars(), text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Compare contents against a string without materializing the buffer.
    fn content_eq(&self, other: &str) -> bool {
        self.to_string() == other
    }

    /// Monotonic counter, incremented on every mutation.
    fn version(&self) -> u64;
}

/// Ropey-backed text buffer.
#[derive(Clone, Debug, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
    version: u64,
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
            version: 0,
        }
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn is_blank(&self) -> bool {
        self.rope.chars().all(char::is_whitespace)
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
        self.version += 1;
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
        self.version += 1;
    }

    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        // One version bump for the whole splice.
        self.rope.remove(char_range.clone());
        self.rope.insert(char_range.start, text);
        self.version += 1;
    }

    fn set_text(&mut self, text: &str) {
        self.rope = ropey::Rope::from_str(text);
        self.version += 1;
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn content_eq(&self, other: &str) -> bool {
        self.rope == other
    }

    fn version(&self) -> u64 {
        self.version
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
