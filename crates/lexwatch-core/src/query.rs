//! Standing queries and their registry.
//!
//! The registry is generational: every start or end bumps a counter, and a
//! document remembers the counter value at submission. A document is matched
//! against exactly the queries that were active at that moment, wherever
//! the batch boundaries happen to fall.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::distance::Metric;
use crate::error::{Error, Result};
use crate::interner::WordId;
use crate::membership::Ordinal;
use crate::text::MAX_DISTANCE;

/// Query identifier chosen by the caller.
pub type QueryId = u32;

/// Document identifier chosen by the caller.
pub type DocId = u32;

/// Registry generation counter value.
pub type Generation = u64;

/// How a query's words are compared against document words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Word must appear verbatim.
    Exact,
    /// Equal-length word within the Hamming threshold.
    Hamming,
    /// Word within the edit (Levenshtein) threshold.
    Edit,
}

impl MatchType {
    /// Distance metric for approximate types, `None` for [`MatchType::Exact`].
    #[must_use]
    pub const fn metric(self) -> Option<Metric> {
        match self {
            Self::Exact => None,
            Self::Hamming => Some(Metric::Hamming),
            Self::Edit => Some(Metric::Edit),
        }
    }
}

impl TryFrom<u32> for MatchType {
    type Error = Error;

    /// Decodes the conventional numeric codes `0` (exact), `1` (Hamming)
    /// and `2` (edit).
    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Exact),
            1 => Ok(Self::Hamming),
            2 => Ok(Self::Edit),
            other => Err(Error::InvalidMatchType(other)),
        }
    }
}

/// Validates a threshold against [`MAX_DISTANCE`].
///
/// # Errors
///
/// Returns [`Error::InvalidThreshold`] above the supported maximum.
pub fn check_threshold(threshold: u32) -> Result<u8> {
    u8::try_from(threshold)
        .ok()
        .filter(|&t| t <= MAX_DISTANCE)
        .ok_or(Error::InvalidThreshold {
            threshold,
            max: MAX_DISTANCE,
        })
}

/// One resolved query word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTerm {
    /// Interned word id, used for exact containment.
    pub word: WordId,
    /// Ordinal in the type's membership index; `None` for exact queries.
    pub ordinal: Option<Ordinal>,
}

/// A registered standing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Caller-chosen id.
    pub id: QueryId,
    /// Match semantics applied uniformly to every term.
    pub match_type: MatchType,
    /// Largest accepted distance per word.
    pub threshold: u8,
    /// Distinct words, in first-occurrence order.
    pub terms: Vec<QueryTerm>,
    /// Generation at which the query became visible.
    pub started_at: Generation,
    /// Generation at which the query stopped being visible.
    pub ended_at: Option<Generation>,
}

impl Query {
    /// Returns true until [`QueryRegistry::end`] is called for this query.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Whether a document submitted at `generation` must be matched
    /// against this query.
    #[must_use]
    #[inline]
    pub fn visible_at(&self, generation: Generation) -> bool {
        self.started_at <= generation && self.ended_at.map_or(true, |end| generation < end)
    }
}

/// Active queries plus ended ones that pending documents may still see.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    active: FxHashMap<QueryId, Query>,
    retiring: Vec<Query>,
    generation: Generation,
}

impl QueryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns true if `id` is active.
    #[must_use]
    pub fn contains(&self, id: QueryId) -> bool {
        self.active.contains_key(&id)
    }

    /// Active query by id.
    #[must_use]
    pub fn get(&self, id: QueryId) -> Option<&Query> {
        self.active.get(&id)
    }

    /// Registers a query whose terms are already resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryExists`] if `id` is already active.
    pub fn start(
        &mut self,
        id: QueryId,
        match_type: MatchType,
        threshold: u8,
        terms: Vec<QueryTerm>,
    ) -> Result<Generation> {
        if self.active.contains_key(&id) {
            return Err(Error::QueryExists(id));
        }
        self.generation += 1;
        let query = Query {
            id,
            match_type,
            threshold,
            terms,
            started_at: self.generation,
            ended_at: None,
        };
        self.active.insert(id, query);
        Ok(self.generation)
    }

    /// Deactivates a query.
    ///
    /// The record is kept until [`QueryRegistry::retire`] proves no pending
    /// document can still see it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryNotFound`] for unknown or already-ended ids.
    pub fn end(&mut self, id: QueryId) -> Result<Generation> {
        let mut query = self.active.remove(&id).ok_or(Error::QueryNotFound(id))?;
        self.generation += 1;
        query.ended_at = Some(self.generation);
        self.retiring.push(query);
        Ok(self.generation)
    }

    /// Removes ended queries invisible to every document submitted at or
    /// after `oldest_pending`, returning them so their index registrations
    /// can be released.
    pub fn retire(&mut self, oldest_pending: Generation) -> Vec<Query> {
        let (gone, keep): (Vec<Query>, Vec<Query>) = std::mem::take(&mut self.retiring)
            .into_iter()
            .partition(|q| q.ended_at.is_some_and(|end| end <= oldest_pending));
        self.retiring = keep;
        gone
    }

    /// Every query some document may still be matched against, sorted by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Query> {
        let mut queries: Vec<Query> = self
            .active
            .values()
            .chain(self.retiring.iter())
            .cloned()
            .collect();
        queries.sort_by_key(|q| (q.id, q.started_at));
        queries
    }

    /// Number of active queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true if no query is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of ended queries awaiting retirement.
    #[must_use]
    pub fn retiring_len(&self) -> usize {
        self.retiring.len()
    }
}
