//! Public entry points.
//!
//! | Operation          | Method                                        |
//! |--------------------|-----------------------------------------------|
//! | `InitializeIndex`  | [`Engine::new`], [`Engine::with_defaults`]    |
//! | `DestroyIndex`     | [`Engine::shutdown`] (also on drop)           |
//! | `StartQuery`       | [`Engine::start_query`]                       |
//! | `EndQuery`         | [`Engine::end_query`]                         |
//! | `MatchDocument`    | [`Engine::match_document`]                    |
//! | `GetNextAvailRes`  | [`Engine::next_result`]                       |
//!
//! # Example
//!
//! ```rust
//! use lexwatch_core::{Engine, LexwatchConfig, MatchType};
//!
//! let engine = Engine::new(LexwatchConfig::default().with_workers(2))?;
//! engine.start_query(1, "cat", MatchType::Exact, 0)?;
//! engine.start_query(2, "kat", MatchType::Hamming, 1)?;
//! engine.match_document(10, "the cat sat")?;
//!
//! let result = engine.next_result()?;
//! assert_eq!(result.doc_id, 10);
//! assert_eq!(result.query_ids, vec![1, 2]);
//!
//! engine.shutdown()?;
//! # Ok::<(), lexwatch_core::Error>(())
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LexwatchConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::pipeline::{DocResult, Phase, Pipeline};
use crate::query::{DocId, MatchType, QueryId};
use crate::stats::EngineStats;

/// A standing-query matching engine.
///
/// All methods take `&self`; an engine can be shared across threads behind
/// an `Arc`.
#[derive(Debug)]
pub struct Engine {
    ctx: Arc<Context>,
    pipeline: Pipeline,
    config: LexwatchConfig,
    stopped: AtomicBool,
}

impl Engine {
    /// Validates `config`, allocates shared structures and starts the
    /// worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration and
    /// [`Error::Internal`] if workers cannot be spawned.
    pub fn new(config: LexwatchConfig) -> Result<Self> {
        config.validate()?;
        let ctx = Arc::new(Context::new(&config));
        let pipeline = Pipeline::start(Arc::clone(&ctx), &config.engine)?;
        tracing::info!(
            workers = pipeline.workers(),
            shards = ctx.interner().shard_count(),
            "engine initialized"
        );
        Ok(Self {
            ctx,
            pipeline,
            config,
            stopped: AtomicBool::new(false),
        })
    }

    /// Engine with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Engine::new`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(LexwatchConfig::default())
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &LexwatchConfig {
        &self.config
    }

    /// Registers a standing query.
    ///
    /// Documents submitted after this call returns are matched against it.
    ///
    /// # Errors
    ///
    /// [`Error::ShutDown`] after shutdown, otherwise the validation errors
    /// of malformed words, word counts outside `1..=5`, thresholds above 3
    /// and ids that are already active.
    pub fn start_query(
        &self,
        query_id: QueryId,
        text: &str,
        match_type: MatchType,
        threshold: u32,
    ) -> Result<()> {
        self.ensure_running()?;
        self.ctx
            .start_query(query_id, text, match_type, threshold)
            .inspect_err(|err| {
                tracing::warn!(query_id, error = %err, "query rejected");
            })?;
        Ok(())
    }

    /// Deactivates a standing query.
    ///
    /// Documents submitted before this call are still matched against it.
    ///
    /// # Errors
    ///
    /// [`Error::ShutDown`] after shutdown, [`Error::QueryNotFound`] for an
    /// unknown or already-ended id.
    pub fn end_query(&self, query_id: QueryId) -> Result<()> {
        self.ensure_running()?;
        self.ctx.end_query(query_id)?;
        Ok(())
    }

    /// Validates and queues a document. The text is not retained.
    ///
    /// # Errors
    ///
    /// [`Error::ShutDown`] after shutdown, [`Error::DocumentTooLarge`] or
    /// [`Error::InvalidWord`] for malformed input. A rejected document
    /// produces no result.
    pub fn match_document(&self, doc_id: DocId, text: &str) -> Result<()> {
        self.ensure_running()?;
        let words = self
            .ctx
            .parse_document(doc_id, text)
            .inspect_err(|err| {
                tracing::warn!(doc_id, error = %err, "document rejected");
            })?;
        self.pipeline.submit(doc_id, words)?;
        self.ctx
            .metrics()
            .documents_submitted
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Blocks until a result is ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] once the engine is shut down and every
    /// result has been taken.
    pub fn next_result(&self) -> Result<DocResult> {
        self.pipeline.results().next()
    }

    /// Returns a ready result without blocking, `None` if none is ready yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] once the engine is shut down and every
    /// result has been taken.
    pub fn try_next_result(&self) -> Result<Option<DocResult>> {
        self.pipeline.results().try_next()
    }

    /// Waits at most `timeout` for a result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] once the engine is shut down and every
    /// result has been taken.
    pub fn next_result_timeout(&self, timeout: Duration) -> Result<Option<DocResult>> {
        self.pipeline.results().next_timeout(timeout)
    }

    /// Stops accepting work, matches every pending document, joins the
    /// workers and closes the result queue. Queued results stay
    /// retrievable. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a worker panicked.
    pub fn shutdown(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.pipeline.shutdown()?;
        tracing::info!(
            matched = self.ctx.metrics().documents_matched.load(Ordering::Relaxed),
            "engine shut down"
        );
        Ok(())
    }

    /// Returns true once [`Engine::shutdown`] was called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.pipeline.is_shut_down()
    }

    /// Current pipeline phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.pipeline.phase()
    }

    /// Documents accepted but not yet in a batch.
    #[must_use]
    pub fn pending_documents(&self) -> usize {
        self.pipeline.pending()
    }

    /// Counters and index sizes.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.ctx.stats()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.pipeline.is_shut_down() {
            return Err(Error::ShutDown);
        }
        Ok(())
    }
}
