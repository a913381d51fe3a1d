//! Shared engine state.
//!
//! One [`Context`] per engine instance holds the interning table, the
//! membership indexes and the query registry. Entry points and workers hold
//! it by `Arc`, so independent engines never share state.

use std::sync::atomic::Ordering;

use parking_lot::RwLock;
use roaring::RoaringBitmap;

use crate::config::LexwatchConfig;
use crate::distance::Metric;
use crate::error::{Error, Result};
use crate::interner::{Interner, WordId};
use crate::join::DocumentWords;
use crate::membership::MembershipIndex;
use crate::query::{
    check_threshold, DocId, Generation, MatchType, Query, QueryId, QueryRegistry, QueryTerm,
};
use crate::stats::{EngineMetrics, EngineStats};
use crate::text::{parse_words, WordText, MAX_QUERY_WORDS};

/// Interning table, membership indexes and query registry of one engine.
#[derive(Debug)]
pub struct Context {
    interner: Interner,
    /// Query words per approximate metric, indexed by [`Metric::index`].
    query_words: [MembershipIndex; 2],
    doc_words: MembershipIndex,
    registry: RwLock<QueryRegistry>,
    metrics: EngineMetrics,
    max_document_bytes: usize,
}

impl Context {
    /// Creates empty state sized from `config`.
    #[must_use]
    pub fn new(config: &LexwatchConfig) -> Self {
        Self {
            interner: Interner::new(&config.interner),
            query_words: [MembershipIndex::new(), MembershipIndex::new()],
            doc_words: MembershipIndex::new(),
            registry: RwLock::new(QueryRegistry::new()),
            metrics: EngineMetrics::new(),
            max_document_bytes: config.limits.max_document_bytes,
        }
    }

    /// Interning table.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Query-word index for `metric`.
    #[must_use]
    pub fn query_words(&self, metric: Metric) -> &MembershipIndex {
        &self.query_words[metric.index()]
    }

    /// Document-word corpus.
    #[must_use]
    pub fn doc_words(&self) -> &MembershipIndex {
        &self.doc_words
    }

    /// Engine counters.
    #[must_use]
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Current registry generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.registry.read().generation()
    }

    /// Tokenizes, interns and registers a standing query.
    ///
    /// Repeated words count toward the word limit but are registered once.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidThreshold`] for a threshold above 3
    /// - [`Error::InvalidWord`] for a malformed token
    /// - [`Error::EmptyQuery`] / [`Error::TooManyWords`] for word counts
    ///   outside `1..=5`
    /// - [`Error::QueryExists`] if `id` is active
    pub fn start_query(
        &self,
        id: QueryId,
        text: &str,
        match_type: MatchType,
        threshold: u32,
    ) -> Result<Generation> {
        let threshold = check_threshold(threshold)?;
        let words = parse_words(text)?;
        if words.is_empty() {
            return Err(Error::EmptyQuery(id));
        }
        if words.len() > MAX_QUERY_WORDS {
            return Err(Error::TooManyWords {
                query_id: id,
                count: words.len(),
                max: MAX_QUERY_WORDS,
            });
        }

        let mut registry = self.registry.write();
        if registry.contains(id) {
            return Err(Error::QueryExists(id));
        }

        let mut resolved: Vec<(WordId, WordText)> = Vec::with_capacity(words.len());
        for text in &words {
            let (word, _) = self.interner.insert(text)?;
            if resolved.iter().all(|(seen, _)| *seen != word) {
                resolved.push((word, *text));
            }
        }

        let index = match_type.metric().map(|m| &self.query_words[m.index()]);
        let terms = resolved
            .iter()
            .map(|(word, text)| QueryTerm {
                word: *word,
                ordinal: index.map(|index| index.acquire(*word, text).0),
            })
            .collect();

        let generation = registry.start(id, match_type, threshold, terms)?;
        self.metrics.queries_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            query_id = id,
            ?match_type,
            threshold,
            words = resolved.len(),
            generation,
            "query started"
        );
        Ok(generation)
    }

    /// Deactivates a standing query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryNotFound`] for unknown or already-ended ids.
    pub fn end_query(&self, id: QueryId) -> Result<Generation> {
        let generation = self.registry.write().end(id)?;
        self.metrics.queries_ended.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(query_id = id, generation, "query ended");
        Ok(generation)
    }

    /// Releases the index registrations of ended queries that no document
    /// submitted at or after `oldest_pending` can see.
    ///
    /// Returns the number of queries retired.
    pub fn retire_queries(&self, oldest_pending: Generation) -> usize {
        let retired = self.registry.write().retire(oldest_pending);
        let mut dead_words = 0usize;
        for query in &retired {
            let Some(metric) = query.match_type.metric() else {
                continue;
            };
            let index = &self.query_words[metric.index()];
            for ordinal in query.terms.iter().filter_map(|t| t.ordinal) {
                if index.release(ordinal) {
                    dead_words += 1;
                }
            }
        }
        if !retired.is_empty() {
            self.metrics
                .queries_retired
                .fetch_add(retired.len() as u64, Ordering::Relaxed);
            tracing::debug!(
                queries = retired.len(),
                dead_words,
                oldest_pending,
                "retired ended queries"
            );
        }
        retired.len()
    }

    /// Every query a pending document may be matched against.
    #[must_use]
    pub fn snapshot_queries(&self) -> Vec<Query> {
        self.registry.read().snapshot()
    }

    /// Validates a document synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentTooLarge`] above the configured size and
    /// [`Error::InvalidWord`] for a malformed token.
    pub fn parse_document(&self, doc_id: DocId, text: &str) -> Result<Vec<WordText>> {
        if text.len() > self.max_document_bytes {
            return Err(Error::DocumentTooLarge {
                doc_id,
                size: text.len(),
                limit: self.max_document_bytes,
            });
        }
        parse_words(text)
    }

    /// Interns a parsed document's words and registers each distinct one in
    /// the document corpus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the interning table is exhausted.
    pub fn ingest(&self, generation: Generation, words: &[WordText]) -> Result<DocumentWords> {
        let mut set = RoaringBitmap::new();
        let mut ordinals = Vec::with_capacity(words.len());
        for text in words {
            let (word, _) = self.interner.insert(text)?;
            if set.insert(word.get()) {
                ordinals.push(self.doc_words.ensure(word, text).0);
            }
        }
        Ok(DocumentWords {
            generation,
            words: set,
            ordinals,
        })
    }

    /// Index sizes plus counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let registry = self.registry.read();
        EngineStats {
            words_interned: self.interner.len(),
            document_words: self.doc_words.len(),
            hamming_query_words: self.query_words(Metric::Hamming).live_len(),
            edit_query_words: self.query_words(Metric::Edit).live_len(),
            active_queries: registry.len(),
            retiring_queries: registry.retiring_len(),
            ..EngineStats::default()
        }
        .with_metrics(&self.metrics)
    }
}
