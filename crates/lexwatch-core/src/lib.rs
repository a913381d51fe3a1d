//! # `lexwatch` Core
//!
//! Continuous matching of documents against standing queries.
//!
//! Clients register long-lived queries (up to five words with one match
//! type) and stream documents; for each document the engine reports which
//! queries match it.
//!
//! ## Features
//!
//! - **Three match types**: exact word containment, Hamming distance and
//!   edit (Levenshtein) distance, with per-query thresholds up to 3
//! - **Incremental join**: word pairs are compared once, ever; each batch
//!   only pays for the words it introduces
//! - **Automaton path**: Levenshtein DFA walked over a document-word trie as
//!   an alternative to pairwise distances
//! - **Batch pipeline**: fixed worker pool moving through
//!   ingest, match and drain phases behind barriers
//! - **Sharded interning**: independently locked open-addressed shards
//!
//! ## Quick Start
//!
//! ```rust
//! use lexwatch_core::{Engine, LexwatchConfig, MatchType};
//!
//! let engine = Engine::new(LexwatchConfig::default())?;
//! engine.start_query(3, "hello", MatchType::Edit, 2)?;
//! engine.match_document(12, "helo world")?;
//!
//! let result = engine.next_result()?;
//! assert_eq!(result.doc_id, 12);
//! assert_eq!(result.query_ids, vec![3]);
//! # Ok::<(), lexwatch_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// Ordinals, word lengths and distances are bounded far below the cast limits.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::significant_drop_in_scrutinee)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::redundant_pub_crate)]

pub mod automaton;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod context;
pub mod distance;
pub mod engine;
pub mod error;
pub mod interner;
#[cfg(test)]
mod interner_tests;
pub mod join;
pub mod logging;
pub mod membership;
pub mod pipeline;
pub mod query;
pub mod stats;
pub mod text;

pub use config::{JoinStrategy, LexwatchConfig};
pub use distance::Metric;
pub use engine::Engine;
pub use error::{Error, Result};
pub use interner::{Interner, WordId};
pub use pipeline::{DocResult, Phase};
pub use query::{DocId, MatchType, QueryId};
pub use stats::EngineStats;
pub use text::{WordText, MAX_DISTANCE, MAX_QUERY_WORDS, MAX_WORD_LENGTH};
