//! Word representation and tokenization.
//!
//! Words are 1 to [`MAX_WORD_LENGTH`] bytes of lowercase ASCII letters,
//! stored inline so that they can be copied into indexes and join snapshots
//! without allocation.

use std::fmt;

use crate::error::{Error, Result};

/// Maximum number of bytes in a word.
pub const MAX_WORD_LENGTH: usize = 31;

/// Maximum number of words in a query.
pub const MAX_QUERY_WORDS: usize = 5;

/// Largest distance tracked by the join, and largest query threshold.
pub const MAX_DISTANCE: u8 = 3;

/// 26-bit set with one bit per letter present in a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LetterMask(u32);

impl LetterMask {
    /// Builds the mask for `bytes`. Bytes outside `a-z` are ignored.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(
            bytes
                .iter()
                .filter(|b| b.is_ascii_lowercase())
                .fold(0u32, |mask, &b| mask | (1 << (b - b'a'))),
        )
    }

    /// Number of letters present in one mask but not the other.
    ///
    /// Every edit operation flips at most two bits, so a flip count above
    /// `2 * k` proves the distance exceeds `k`.
    #[must_use]
    #[inline]
    pub const fn flips(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// An owned, validated word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordText {
    bytes: [u8; MAX_WORD_LENGTH],
    len: u8,
    mask: LetterMask,
}

impl WordText {
    /// Validates and copies `token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWord`] if the token is empty, longer than
    /// [`MAX_WORD_LENGTH`], or contains anything other than `a-z`.
    pub fn new(token: &str) -> Result<Self> {
        let raw = token.as_bytes();
        if raw.is_empty() {
            return Err(invalid(token, "empty word"));
        }
        if raw.len() > MAX_WORD_LENGTH {
            return Err(invalid(token, "longer than 31 bytes"));
        }
        if !raw.iter().all(u8::is_ascii_lowercase) {
            return Err(invalid(token, "not lowercase ascii"));
        }
        let mut bytes = [0u8; MAX_WORD_LENGTH];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            bytes,
            len: raw.len() as u8,
            mask: LetterMask::of(raw),
        })
    }

    /// The word's bytes.
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The word as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Validated as ASCII in `new`.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Length in bytes.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; empty words are rejected at construction.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Letter-presence mask.
    #[must_use]
    #[inline]
    pub const fn mask(&self) -> LetterMask {
        self.mask
    }
}

impl fmt::Debug for WordText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WordText").field(&self.as_str()).finish()
    }
}

impl fmt::Display for WordText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WordText {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

fn invalid(token: &str, reason: &'static str) -> Error {
    let word: String = token.chars().take(40).collect();
    Error::InvalidWord { word, reason }
}

/// Splits `text` on spaces, skipping runs of separators.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|t| !t.is_empty())
}

/// Tokenizes and validates every word in `text`.
///
/// Repeated words are kept; deduplication happens after interning.
///
/// # Errors
///
/// Returns the first [`Error::InvalidWord`] encountered.
pub fn parse_words(text: &str) -> Result<Vec<WordText>> {
    tokens(text).map(WordText::new).collect()
}
