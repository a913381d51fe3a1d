//! Result queue between the drain phase and the consumer.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::query::{DocId, QueryId};

/// Matching queries of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocResult {
    /// Document id passed to `match_document`.
    pub doc_id: DocId,
    /// Ids of every matching query, ascending.
    pub query_ids: Vec<QueryId>,
}

impl DocResult {
    /// Number of matching queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.query_ids.len()
    }

    /// Returns true if no query matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_ids.is_empty()
    }
}

#[derive(Debug, Default)]
struct State {
    ready: VecDeque<DocResult>,
    closed: bool,
}

/// FIFO of completed results.
///
/// Once closed, consumers still drain what is queued, then get
/// [`Error::NoResults`] instead of blocking.
#[derive(Debug, Default)]
pub struct ResultQueue {
    state: Mutex<State>,
    available: Condvar,
}

impl ResultQueue {
    /// Creates an open, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one batch's results in order.
    pub fn push_batch(&self, results: Vec<DocResult>) {
        if results.is_empty() {
            return;
        }
        self.state.lock().ready.extend(results);
        self.available.notify_all();
    }

    /// Marks that no further results will arrive and wakes every waiter.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Blocks until a result is ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] once the queue is closed and empty.
    pub fn next(&self) -> Result<DocResult> {
        let mut state = self.state.lock();
        loop {
            if let Some(result) = state.ready.pop_front() {
                return Ok(result);
            }
            if state.closed {
                return Err(Error::NoResults);
            }
            self.available.wait(&mut state);
        }
    }

    /// Returns a ready result without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] once the queue is closed and empty.
    pub fn try_next(&self) -> Result<Option<DocResult>> {
        let mut state = self.state.lock();
        match state.ready.pop_front() {
            Some(result) => Ok(Some(result)),
            None if state.closed => Err(Error::NoResults),
            None => Ok(None),
        }
    }

    /// Blocks for at most `timeout` waiting for a result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] once the queue is closed and empty.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<DocResult>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(result) = state.ready.pop_front() {
                return Ok(Some(result));
            }
            if state.closed {
                return Err(Error::NoResults);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return Ok(state.ready.pop_front());
            }
        }
    }

    /// Number of queued results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().ready.is_empty()
    }

    /// Returns true once [`ResultQueue::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
