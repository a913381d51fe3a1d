//! Error types for `lexwatch`.
//!
//! Only boundary operations fail: document ingestion and query
//! (de)registration. The join, distance and aggregation code paths are total
//! over validated input and never return errors.

use thiserror::Error;

/// Result type alias for `lexwatch` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `lexwatch` operations.
///
/// Error codes follow the pattern `LEXW-XXX` for easy debugging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed word (LEXW-001).
    ///
    /// Words are 1 to 31 bytes of lowercase ASCII letters.
    #[error("[LEXW-001] Invalid word '{word}': {reason}")]
    InvalidWord {
        /// Offending token, truncated for display.
        word: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Query holds more words than allowed (LEXW-002).
    #[error("[LEXW-002] Query {query_id} has {count} words, at most {max} are allowed")]
    TooManyWords {
        /// Query id.
        query_id: u32,
        /// Number of words found.
        count: usize,
        /// Fixed per-query bound.
        max: usize,
    },

    /// Query text contains no words (LEXW-003).
    #[error("[LEXW-003] Query {0} contains no words")]
    EmptyQuery(u32),

    /// Threshold outside `0..=3` (LEXW-004).
    #[error("[LEXW-004] Match threshold {threshold} is out of range [0, {max}]")]
    InvalidThreshold {
        /// Requested threshold.
        threshold: u32,
        /// Largest supported threshold.
        max: u8,
    },

    /// Query id already active (LEXW-005).
    #[error("[LEXW-005] Query {0} is already active")]
    QueryExists(u32),

    /// Unknown or already-ended query id (LEXW-006).
    #[error("[LEXW-006] Query {0} not found")]
    QueryNotFound(u32),

    /// Document text exceeds the configured size limit (LEXW-007).
    #[error("[LEXW-007] Document {doc_id} is {size} bytes, limit is {limit}")]
    DocumentTooLarge {
        /// Document id.
        doc_id: u32,
        /// Document size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Engine has been shut down (LEXW-008).
    #[error("[LEXW-008] Engine is shut down")]
    ShutDown,

    /// No result is pending and none will arrive (LEXW-009).
    #[error("[LEXW-009] No results available")]
    NoResults,

    /// Configuration error (LEXW-010).
    #[error("[LEXW-010] Configuration error: {0}")]
    Config(String),

    /// Internal error (LEXW-011).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[LEXW-011] Internal error: {0}")]
    Internal(String),

    /// Unknown match type code (LEXW-012).
    #[error("[LEXW-012] Unknown match type code {0}, expected 0 (exact), 1 (hamming) or 2 (edit)")]
    InvalidMatchType(u32),
}

impl Error {
    /// Returns the error code (e.g., "LEXW-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidWord { .. } => "LEXW-001",
            Self::TooManyWords { .. } => "LEXW-002",
            Self::EmptyQuery(_) => "LEXW-003",
            Self::InvalidThreshold { .. } => "LEXW-004",
            Self::QueryExists(_) => "LEXW-005",
            Self::QueryNotFound(_) => "LEXW-006",
            Self::DocumentTooLarge { .. } => "LEXW-007",
            Self::ShutDown => "LEXW-008",
            Self::NoResults => "LEXW-009",
            Self::Config(_) => "LEXW-010",
            Self::Internal(_) => "LEXW-011",
            Self::InvalidMatchType(_) => "LEXW-012",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Once the engine is shut down or has failed internally no further
    /// call can succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ShutDown | Self::NoResults | Self::Internal(_))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
