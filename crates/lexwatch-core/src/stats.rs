//! Engine counters.
//!
//! Counters are bumped with relaxed atomics from the worker pool and the
//! entry points; [`EngineStats`] is the point-in-time view returned by
//! `Engine::stats`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Monotonic counters shared by the entry points and workers.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Documents accepted by `match_document`.
    pub documents_submitted: AtomicU64,
    /// Documents whose result reached the result queue.
    pub documents_matched: AtomicU64,
    /// Documents dropped during ingestion.
    pub documents_dropped: AtomicU64,
    /// Completed batches.
    pub batches: AtomicU64,
    /// Sum of batch wall-clock times in nanoseconds.
    pub batch_time_ns: AtomicU64,
    /// Successful `start_query` calls.
    pub queries_started: AtomicU64,
    /// Successful `end_query` calls.
    pub queries_ended: AtomicU64,
    /// Ended queries whose index registrations were released.
    pub queries_retired: AtomicU64,
    /// Word pairs that reached a distance computation.
    pub pairs_compared: AtomicU64,
    /// Word pairs rejected by the length or letter-mask filters.
    pub pairs_filtered: AtomicU64,
    /// Automaton product walks.
    pub automaton_walks: AtomicU64,
}

impl EngineMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished batch.
    pub fn record_batch(&self, documents: usize, elapsed: Duration) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.documents_matched
            .fetch_add(documents as u64, Ordering::Relaxed);
        self.batch_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records one worker's join work.
    pub fn record_join(&self, compared: u64, filtered: u64, walks: u64) {
        self.pairs_compared.fetch_add(compared, Ordering::Relaxed);
        self.pairs_filtered.fetch_add(filtered, Ordering::Relaxed);
        self.automaton_walks.fetch_add(walks, Ordering::Relaxed);
    }

    /// Average batch time in milliseconds.
    #[must_use]
    pub fn avg_batch_ms(&self) -> f64 {
        let batches = self.batches.load(Ordering::Relaxed);
        if batches == 0 {
            return 0.0;
        }
        let sum_ns = self.batch_time_ns.load(Ordering::Relaxed);
        (sum_ns as f64) / (batches as f64) / 1_000_000.0
    }
}

/// Snapshot of engine counters and index sizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Distinct words interned.
    pub words_interned: usize,
    /// Distinct document words seen.
    pub document_words: usize,
    /// Live Hamming query words.
    pub hamming_query_words: usize,
    /// Live edit query words.
    pub edit_query_words: usize,
    /// Active queries.
    pub active_queries: usize,
    /// Ended queries still visible to pending documents.
    pub retiring_queries: usize,
    /// Documents accepted.
    pub documents_submitted: u64,
    /// Documents delivered.
    pub documents_matched: u64,
    /// Documents dropped during ingestion.
    pub documents_dropped: u64,
    /// Completed batches.
    pub batches: u64,
    /// Successful `start_query` calls.
    pub queries_started: u64,
    /// Successful `end_query` calls.
    pub queries_ended: u64,
    /// Ended queries released from the indexes.
    pub queries_retired: u64,
    /// Average batch time in milliseconds.
    pub avg_batch_ms: f64,
    /// Word pairs that reached a distance computation.
    pub pairs_compared: u64,
    /// Word pairs rejected by cheap filters.
    pub pairs_filtered: u64,
    /// Automaton product walks.
    pub automaton_walks: u64,
}

impl EngineStats {
    /// Fills the counter fields from `metrics`; size fields are left as is.
    #[must_use]
    pub fn with_metrics(mut self, metrics: &EngineMetrics) -> Self {
        self.documents_submitted = metrics.documents_submitted.load(Ordering::Relaxed);
        self.documents_matched = metrics.documents_matched.load(Ordering::Relaxed);
        self.documents_dropped = metrics.documents_dropped.load(Ordering::Relaxed);
        self.batches = metrics.batches.load(Ordering::Relaxed);
        self.queries_started = metrics.queries_started.load(Ordering::Relaxed);
        self.queries_ended = metrics.queries_ended.load(Ordering::Relaxed);
        self.queries_retired = metrics.queries_retired.load(Ordering::Relaxed);
        self.avg_batch_ms = metrics.avg_batch_ms();
        self.pairs_compared = metrics.pairs_compared.load(Ordering::Relaxed);
        self.pairs_filtered = metrics.pairs_filtered.load(Ordering::Relaxed);
        self.automaton_walks = metrics.automaton_walks.load(Ordering::Relaxed);
        self
    }
}
