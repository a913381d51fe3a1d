//! Worker loop and phase steps.
//!
//! Every worker runs every round; barriers separate the sub-phases so the
//! single-writer steps (prepare, drain) never overlap the parallel ones.

use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::join::Scratch;

use super::{DocResult, Phase, Round, Shared};

/// Worker that performs the single-threaded steps.
const LEADER: usize = 0;

pub(super) fn run(shared: &Shared, index: usize) {
    let mut scratch = Scratch::new();
    let mut seen = 0u64;
    tracing::debug!(worker = index, "worker started");

    while let Some(round) = await_round(shared, seen) {
        seen = round;

        ingest(shared, index);
        shared.barrier.wait();

        if index == LEADER {
            prepare(shared, round);
        }
        shared.barrier.wait();

        join(shared, index);
        shared.barrier.wait();

        aggregate(shared, index, &mut scratch);
        shared.barrier.wait();

        if index == LEADER {
            drain(shared, round);
        }
        shared.barrier.wait();
    }

    tracing::debug!(worker = index, "worker finished");
}

/// IDLE: joins a round another worker started, starts one if documents are
/// pending, or returns `None` once shut down with nothing pending.
fn await_round(shared: &Shared, seen: u64) -> Option<u64> {
    let mut intake = shared.intake.lock();
    loop {
        if intake.round > seen {
            return Some(intake.round);
        }
        if !intake.docs.is_empty() {
            intake.round += 1;
            intake.taken = 0;
            intake.phase = Phase::Ingest;
            shared.signal.notify_all();
            return Some(intake.round);
        }
        if intake.shutdown {
            intake.phase = Phase::Finished;
            return None;
        }
        shared.signal.wait(&mut intake);
    }
}

/// INGEST: pulls documents until the batch is full or the queue stays empty.
fn ingest(shared: &Shared, index: usize) {
    loop {
        let doc = {
            let mut intake = shared.intake.lock();
            if intake.taken >= shared.max_batch {
                break;
            }
            if intake.docs.is_empty() && !intake.shutdown && !shared.linger.is_zero() {
                shared.signal.wait_for(&mut intake, shared.linger);
                if intake.taken >= shared.max_batch {
                    break;
                }
            }
            let Some(doc) = intake.docs.pop_front() else {
                break;
            };
            intake.taken += 1;
            doc
        };

        match shared.ctx.ingest(doc.generation, &doc.words) {
            Ok(words) => shared.batch.lock().push((doc.id, words)),
            Err(err) => {
                shared
                    .ctx
                    .metrics()
                    .documents_dropped
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(worker = index, doc_id = doc.id, error = %err, "document dropped");
            }
        }
    }
}

/// MATCH setup on the leader: retire invisible queries, pull new words into
/// the join and snapshot the registry.
fn prepare(shared: &Shared, round: u64) {
    let started = Instant::now();
    shared.intake.lock().phase = Phase::Match;

    let docs = std::mem::take(&mut *shared.batch.lock());
    // Queue order follows generation order, so nothing still pending is
    // older than the oldest document of this batch.
    if let Some(oldest) = docs.iter().map(|(_, words)| words.generation).min() {
        shared.ctx.retire_queries(oldest);
    }

    let advance = shared.join.write().advance(&shared.ctx);
    let queries = shared.ctx.snapshot_queries();
    tracing::debug!(
        round,
        documents = docs.len(),
        new_doc_words = advance.doc_words,
        new_hamming_words = advance.query_words[0],
        new_edit_words = advance.query_words[1],
        pruned = advance.pruned,
        queries = queries.len(),
        "batch prepared"
    );

    *shared.round.write() = Round {
        docs,
        queries,
        started: Some(started),
    };
}

/// MATCH: this worker's stride of the incremental join.
fn join(shared: &Shared, index: usize) {
    let counters = shared.join.read().join(index, shared.workers);
    shared
        .ctx
        .metrics()
        .record_join(counters.compared, counters.filtered, counters.walks);
}

/// MATCH: this worker's stride of the documents, each result published to
/// the completed list as soon as it is known.
fn aggregate(shared: &Shared, index: usize, scratch: &mut Scratch) {
    let join = shared.join.read();
    let round = shared.round.read();
    for (doc_id, words) in round.docs.iter().skip(index).step_by(shared.workers) {
        let query_ids = join.aggregate(words, &round.queries, scratch);
        shared.completed.lock().push(DocResult {
            doc_id: *doc_id,
            query_ids,
        });
    }
}

/// DRAIN on the leader: publish results and reset batch state.
fn drain(shared: &Shared, round: u64) {
    shared.intake.lock().phase = Phase::Drain;

    let results = std::mem::take(&mut *shared.completed.lock());
    let delivered = results.len();
    let finished = std::mem::take(&mut *shared.round.write());
    let elapsed = finished.started.map(|t| t.elapsed()).unwrap_or_default();
    // Counted before publishing.
    shared.ctx.metrics().record_batch(delivered, elapsed);
    shared.results.push_batch(results);
    tracing::debug!(round, delivered, elapsed_us = elapsed.as_micros() as u64, "batch drained");

    shared.intake.lock().phase = Phase::Idle;
}
