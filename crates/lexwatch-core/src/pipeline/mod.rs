//! Batch orchestrator.
//!
//! A fixed pool of worker threads, created once and joined at shutdown,
//! moves through a shared phase machine:
//!
//! ```text
//! IDLE --docs pending--> INGEST --barrier--> MATCH --barrier--> DRAIN --> IDLE
//!   \                                                                     |
//!    `--shutdown, nothing pending--> FINISHED <---------------------------'
//! ```
//!
//! - **INGEST**: workers pull documents from the pending queue, intern them
//!   and append them to the batch. The batch closes when the queue stays
//!   empty for `batch_linger_ms` or `max_batch_documents` were taken.
//! - **MATCH**: worker 0 pulls new words into the join and snapshots the
//!   registry; then every worker joins and aggregates its stride of the
//!   work, with a barrier between sub-phases.
//! - **DRAIN**: worker 0 hands completed results to the [`ResultQueue`] and
//!   resets batch state while the others wait.
//!
//! Documents keep arriving in the pending queue during MATCH and DRAIN.

mod results;
mod worker;

pub use results::{DocResult, ResultQueue};

use std::collections::VecDeque;
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::join::{DocumentWords, JoinState};
use crate::query::{DocId, Generation, Query};
use crate::text::WordText;

/// Pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No batch in progress.
    #[default]
    Idle,
    /// Pulling and interning documents.
    Ingest,
    /// Joining and aggregating the batch.
    Match,
    /// Publishing results.
    Drain,
    /// Workers have exited.
    Finished,
}

/// Validated document waiting for a batch.
#[derive(Debug)]
struct PendingDocument {
    id: DocId,
    generation: Generation,
    words: Vec<WordText>,
}

/// Pending queue and round bookkeeping, guarded together.
#[derive(Debug, Default)]
struct Intake {
    docs: VecDeque<PendingDocument>,
    /// Rounds started so far.
    round: u64,
    /// Documents taken in the current round.
    taken: usize,
    phase: Phase,
    shutdown: bool,
}

/// Batch snapshot built at the start of MATCH.
#[derive(Debug, Default)]
struct Round {
    docs: Vec<(DocId, DocumentWords)>,
    queries: Vec<Query>,
    started: Option<Instant>,
}

/// State shared by the pool.
#[derive(Debug)]
struct Shared {
    ctx: Arc<Context>,
    workers: usize,
    max_batch: usize,
    linger: Duration,
    intake: Mutex<Intake>,
    signal: Condvar,
    barrier: Barrier,
    batch: Mutex<Vec<(DocId, DocumentWords)>>,
    round: RwLock<Round>,
    join: RwLock<JoinState>,
    completed: Mutex<Vec<DocResult>>,
    results: ResultQueue,
}

/// Worker pool plus the queues around it.
#[derive(Debug)]
pub struct Pipeline {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    /// Spawns `config.effective_workers()` workers, all starting IDLE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a worker thread cannot be spawned.
    pub fn start(ctx: Arc<Context>, config: &EngineConfig) -> Result<Self> {
        let workers = config.effective_workers();
        let shared = Arc::new(Shared {
            ctx,
            workers,
            max_batch: config.max_batch_documents.max(1),
            linger: Duration::from_millis(config.batch_linger_ms),
            intake: Mutex::new(Intake::default()),
            signal: Condvar::new(),
            barrier: Barrier::new(workers),
            batch: Mutex::new(Vec::new()),
            round: RwLock::new(Round::default()),
            join: RwLock::new(JoinState::new(config.join_strategy)),
            completed: Mutex::new(Vec::new()),
            results: ResultQueue::new(),
        });

        let pipeline = Self {
            shared: Arc::clone(&shared),
            handles: Mutex::new(Vec::with_capacity(workers)),
        };
        for index in 0..workers {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("lexwatch-worker-{index}"))
                .spawn(move || worker::run(&worker_shared, index));
            match spawned {
                Ok(handle) => pipeline.handles.lock().push(handle),
                Err(err) => {
                    // Workers already running exit once they see shutdown.
                    let _ = pipeline.shutdown();
                    return Err(Error::Internal(format!(
                        "failed to spawn worker {index}: {err}"
                    )));
                }
            }
        }

        tracing::info!(
            workers,
            max_batch = shared.max_batch,
            linger_ms = config.batch_linger_ms,
            strategy = ?config.join_strategy,
            "pipeline started"
        );
        Ok(pipeline)
    }

    /// Queues a validated document.
    ///
    /// The document is stamped with the registry generation while the
    /// queue lock is held, so queue order and generation order agree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutDown`] after [`Pipeline::shutdown`].
    pub fn submit(&self, id: DocId, words: Vec<WordText>) -> Result<()> {
        let mut intake = self.shared.intake.lock();
        if intake.shutdown {
            return Err(Error::ShutDown);
        }
        let generation = self.shared.ctx.generation();
        intake.docs.push_back(PendingDocument {
            id,
            generation,
            words,
        });
        drop(intake);
        self.shared.signal.notify_one();
        Ok(())
    }

    /// Result queue fed by the drain phase.
    #[must_use]
    pub fn results(&self) -> &ResultQueue {
        &self.shared.results
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.intake.lock().phase
    }

    /// Documents waiting for a batch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.intake.lock().docs.len()
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.shared.workers
    }

    /// Returns true once shutdown has been requested.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.intake.lock().shutdown
    }

    /// Stops accepting documents, lets workers finish every pending
    /// document, joins them and closes the result queue.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a worker panicked.
    pub fn shutdown(&self) -> Result<()> {
        self.shared.intake.lock().shutdown = true;
        self.shared.signal.notify_all();

        let handles = std::mem::take(&mut *self.handles.lock());
        let panicked = handles
            .into_iter()
            .map(JoinHandle::join)
            .filter(std::result::Result::is_err)
            .count();
        self.shared.results.close();

        if panicked > 0 {
            return Err(Error::Internal(format!("{panicked} worker(s) panicked")));
        }
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::error!(error = %err, "pipeline shutdown failed");
        }
    }
}
