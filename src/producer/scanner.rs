//! SIMD-accelerated XML scanning using memchr
//!
//! Every delimiter the scanner searches for is ASCII, so positions it
//! returns are always UTF-8 char boundaries and slicing the input there
//! cannot panic.

use memchr::{memchr, memchr2, memmem};

/// Scanner for XML delimiter detection
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if at end of input
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    /// Advance position by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip whitespace characters
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Check if input starts with a string at current position
    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Consume `needle` if it is next
    #[inline]
    pub fn eat(&mut self, needle: &str) -> bool {
        if self.starts_with(needle) {
            self.pos += needle.len();
            return true;
        }
        false
    }

    /// Text up to the next '<', advancing to it (or to the end)
    pub fn read_text(&mut self) -> &'a str {
        let start = self.pos;
        self.pos = memchr(b'<', &self.bytes()[start..]).map_or(self.input.len(), |i| start + i);
        &self.input[start..self.pos]
    }

    /// Read up to a terminator, advancing past it
    pub fn read_until_str(&mut self, terminator: &str) -> Option<&'a str> {
        let start = self.pos;
        let end = memmem::find(&self.bytes()[start..], terminator.as_bytes())?;
        self.pos = start + end + terminator.len();
        Some(&self.input[start..start + end])
    }

    /// Read a quoted attribute value, advancing past the closing quote
    pub fn read_quoted(&mut self) -> Option<&'a str> {
        let quote = self.peek().filter(|q| matches!(q, b'"' | b'\''))?;
        let start = self.pos + 1;
        let end = memchr(quote, &self.bytes()[start..])?;
        self.pos = start + end + 1;
        Some(&self.input[start..start + end])
    }

    /// Skip a DOCTYPE body, including an internal subset, up to its closing '>'
    pub fn skip_doctype(&mut self) -> Option<()> {
        loop {
            let found = self.pos + memchr2(b'[', b'>', &self.bytes()[self.pos..])?;
            self.pos = found + 1;
            if self.bytes()[found] == b'>' {
                return Some(());
            }
            // Internal subset runs to the next ']'
            self.pos += memchr(b']', &self.bytes()[self.pos..])? + 1;
        }
    }

    /// Read an XML name (starts with letter/underscore, continues with letters/digits/hyphens/underscores/periods)
    pub fn read_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start_char) {
            return None;
        }
        self.pos += 1;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
/// Allows ASCII alphanumeric, punctuation, and non-ASCII (UTF-8 Unicode)
#[inline]
fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
