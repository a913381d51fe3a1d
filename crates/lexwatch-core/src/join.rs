//! Incremental bounded-distance join.
//!
//! For every document word `d` and query word `q` of an approximate type,
//! the join records whether `distance(d, q) <= 3`, and at which distance.
//! Nothing is ever recomputed: each document word keeps, per metric, a
//! cursor into the query-word corpus of that metric. A batch only compares
//!
//! - new document words against every live query word, and
//! - old document words against query words registered since the last batch,
//!
//! so total work stays `O(new_doc_words * query_words + doc_words *
//! new_query_words)`.
//!
//! # Strategies
//!
//! [`JoinStrategy::Pairwise`] runs the length and letter-mask filters, then
//! the bounded distance, for every pair. [`JoinStrategy::Automaton`] handles
//! new edit query words with one Levenshtein DFA walk over the trie of all
//! document words instead; Hamming and the new-document side stay pairwise.
//!
//! # Concurrency
//!
//! [`JoinState::advance`] runs alone, between barriers. [`JoinState::join`]
//! and [`JoinState::aggregate`] run on every worker at once, partitioned by
//! index stride. Each document word's state sits behind its own mutex,
//! which is only contended when automaton walks from different workers
//! reach the same word.

use std::ops::Range;

use parking_lot::Mutex;
use roaring::RoaringBitmap;

use crate::automaton::{LevenshteinDfa, WordTrie};
use crate::config::JoinStrategy;
use crate::context::Context;
use crate::distance::{Metric, EXCEEDED};
use crate::membership::{Member, Ordinal};
use crate::query::{Generation, Query, QueryId};
use crate::text::{WordText, MAX_DISTANCE};

const BUCKETS: usize = MAX_DISTANCE as usize + 1;

/// Interned view of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWords {
    /// Registry generation at submission.
    pub generation: Generation,
    /// Distinct word ids, for exact containment.
    pub words: RoaringBitmap,
    /// Document-corpus ordinal of each distinct word.
    pub ordinals: Vec<Ordinal>,
}

/// Join progress and matches of one document word.
#[derive(Debug, Default)]
struct DocWordState {
    /// Query-corpus prefix already compared, per metric.
    cursors: [usize; 2],
    /// Query ordinals found at each distance, per metric.
    buckets: [[Vec<Ordinal>; BUCKETS]; 2],
}

/// Batch-local copy of one query-word corpus.
#[derive(Debug, Default)]
struct CorpusView {
    members: Vec<Member>,
    dead: RoaringBitmap,
    /// Corpus length at the previous batch.
    previous: usize,
}

impl CorpusView {
    fn is_live(&self, ordinal: Ordinal) -> bool {
        self.dead.is_empty() || !self.dead.contains(ordinal)
    }
}

/// Work done by one worker in one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinCounters {
    /// Pairs that reached a distance computation.
    pub compared: u64,
    /// Pairs rejected by the length or letter-mask filter.
    pub filtered: u64,
    /// Automaton walks over the document trie.
    pub walks: u64,
}

impl std::ops::AddAssign for JoinCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.compared += rhs.compared;
        self.filtered += rhs.filtered;
        self.walks += rhs.walks;
    }
}

/// Words pulled in by [`JoinState::advance`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// New document words.
    pub doc_words: usize,
    /// New query words per metric, indexed by [`Metric::index`].
    pub query_words: [usize; 2],
    /// Matches against newly dead query words dropped from document words.
    pub pruned: usize,
}

/// Per-worker aggregation buffers, reused across documents.
#[derive(Debug, Default)]
pub struct Scratch {
    distances: [Vec<u8>; 2],
    touched: [Vec<Ordinal>; 2],
}

impl Scratch {
    /// Creates empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&mut self, lens: [usize; 2]) {
        for (distances, len) in self.distances.iter_mut().zip(lens) {
            if distances.len() < len {
                distances.resize(len, EXCEEDED);
            }
        }
    }

    fn record(&mut self, metric: usize, ordinal: Ordinal, distance: u8) {
        if let Some(slot) = self.distances[metric].get_mut(ordinal as usize) {
            if *slot == EXCEEDED {
                self.touched[metric].push(ordinal);
            }
            *slot = (*slot).min(distance);
        }
    }

    fn distance(&self, metric: usize, ordinal: Ordinal) -> u8 {
        self.distances[metric]
            .get(ordinal as usize)
            .copied()
            .unwrap_or(EXCEEDED)
    }

    fn clear(&mut self) {
        for (distances, touched) in self.distances.iter_mut().zip(self.touched.iter_mut()) {
            for ordinal in touched.drain(..) {
                distances[ordinal as usize] = EXCEEDED;
            }
        }
    }
}

/// Accumulated join results across batches.
#[derive(Debug)]
pub struct JoinState {
    strategy: JoinStrategy,
    doc_words: Vec<WordText>,
    states: Vec<Mutex<DocWordState>>,
    corpora: [CorpusView; 2],
    trie: WordTrie<Ordinal>,
}

impl JoinState {
    /// Creates an empty join.
    #[must_use]
    pub fn new(strategy: JoinStrategy) -> Self {
        Self {
            strategy,
            doc_words: Vec::new(),
            states: Vec::new(),
            corpora: [CorpusView::default(), CorpusView::default()],
            trie: WordTrie::new(),
        }
    }

    /// Strategy in use.
    #[must_use]
    pub const fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// Document words known to the join.
    #[must_use]
    pub fn doc_word_count(&self) -> usize {
        self.doc_words.len()
    }

    /// Query words (live and dead) known to the join for `metric`.
    #[must_use]
    pub fn query_word_count(&self, metric: Metric) -> usize {
        self.corpora[metric.index()].members.len()
    }

    /// Pulls words registered since the previous call.
    ///
    /// Must not run concurrently with [`JoinState::join`] or
    /// [`JoinState::aggregate`].
    pub fn advance(&mut self, ctx: &Context) -> Advance {
        let first = self.doc_words.len();
        let fresh = ctx.doc_words().members_from(first);
        for (offset, member) in fresh.iter().enumerate() {
            if self.strategy == JoinStrategy::Automaton {
                self.trie
                    .insert(member.text.as_bytes(), (first + offset) as Ordinal);
            }
            self.doc_words.push(member.text);
            self.states.push(Mutex::new(DocWordState::default()));
        }

        let mut query_words = [0; 2];
        let mut newly_dead = [RoaringBitmap::new(), RoaringBitmap::new()];
        for metric in Metric::ALL {
            let index = ctx.query_words(metric);
            let corpus = &mut self.corpora[metric.index()];
            corpus.previous = corpus.members.len();
            corpus.members.extend(index.members_from(corpus.previous));
            let dead = index.dead();
            newly_dead[metric.index()] = &dead - &corpus.dead;
            corpus.dead = dead;
            query_words[metric.index()] = corpus.members.len() - corpus.previous;
        }

        Advance {
            doc_words: fresh.len(),
            query_words,
            pruned: self.prune(&newly_dead),
        }
    }

    /// Drops bucket entries that point at `newly_dead` query ordinals.
    ///
    /// Dead ordinals are never reused, so each entry is removed once.
    fn prune(&mut self, newly_dead: &[RoaringBitmap; 2]) -> usize {
        if newly_dead.iter().all(RoaringBitmap::is_empty) {
            return 0;
        }
        let mut pruned = 0;
        for slot in &mut self.states {
            let state = slot.get_mut();
            for (buckets, dead) in state.buckets.iter_mut().zip(newly_dead) {
                if dead.is_empty() {
                    continue;
                }
                for bucket in buckets.iter_mut() {
                    let before = bucket.len();
                    bucket.retain(|ordinal| !dead.contains(*ordinal));
                    pruned += before - bucket.len();
                }
            }
        }
        pruned
    }

    /// Runs this worker's share of the batch join.
    ///
    /// Worker `worker` of `workers` owns document words whose ordinal is
    /// congruent to `worker`, and, for the automaton strategy, new edit
    /// query words likewise.
    pub fn join(&self, worker: usize, workers: usize) -> JoinCounters {
        let workers = workers.max(1);
        let mut counters = JoinCounters::default();
        let automaton = self.strategy == JoinStrategy::Automaton;

        for (ordinal, slot) in self.states.iter().enumerate().skip(worker).step_by(workers) {
            let text = &self.doc_words[ordinal];
            let mut state = slot.lock();
            for metric in Metric::ALL {
                let m = metric.index();
                let corpus = &self.corpora[m];
                let end = if automaton && metric == Metric::Edit {
                    corpus.previous
                } else {
                    corpus.members.len()
                };
                let from = state.cursors[m];
                if from < end {
                    self.compare(metric, text, from..end, &mut state, &mut counters);
                }
                state.cursors[m] = corpus.members.len();
            }
        }

        if automaton {
            counters += self.walk_new_edit_words(worker, workers);
        }
        counters
    }

    fn compare(
        &self,
        metric: Metric,
        text: &WordText,
        range: Range<usize>,
        state: &mut DocWordState,
        counters: &mut JoinCounters,
    ) {
        let m = metric.index();
        let corpus = &self.corpora[m];
        let start = range.start;
        for (offset, member) in corpus.members[range].iter().enumerate() {
            let ordinal = (start + offset) as Ordinal;
            if !corpus.is_live(ordinal) {
                continue;
            }
            if !metric.admits(text, &member.text) {
                counters.filtered += 1;
                continue;
            }
            counters.compared += 1;
            let distance = metric.bounded(text.as_bytes(), member.text.as_bytes());
            if distance <= MAX_DISTANCE {
                state.buckets[m][usize::from(distance)].push(ordinal);
            }
        }
    }

    fn walk_new_edit_words(&self, worker: usize, workers: usize) -> JoinCounters {
        let m = Metric::Edit.index();
        let corpus = &self.corpora[m];
        let mut counters = JoinCounters::default();
        for ordinal in (corpus.previous..corpus.members.len())
            .skip(worker)
            .step_by(workers)
        {
            let query_ordinal = ordinal as Ordinal;
            if !corpus.is_live(query_ordinal) {
                continue;
            }
            let dfa = LevenshteinDfa::new(corpus.members[ordinal].text.as_bytes(), MAX_DISTANCE);
            counters.walks += 1;
            self.trie.intersect(&dfa, |doc_ordinal, distance| {
                if let Some(slot) = self.states.get(doc_ordinal as usize) {
                    slot.lock().buckets[m][usize::from(distance)].push(query_ordinal);
                }
            });
        }
        counters
    }

    /// Ids of the `queries` that match `doc`, ascending.
    ///
    /// Only queries visible at the document's generation are considered.
    /// Exact queries need every word id in the document; approximate ones
    /// need every word's minimum distance over the document's words within
    /// the query threshold.
    pub fn aggregate(
        &self,
        doc: &DocumentWords,
        queries: &[Query],
        scratch: &mut Scratch,
    ) -> Vec<QueryId> {
        scratch.reserve([
            self.corpora[0].members.len(),
            self.corpora[1].members.len(),
        ]);

        for &ordinal in &doc.ordinals {
            let Some(slot) = self.states.get(ordinal as usize) else {
                continue;
            };
            let state = slot.lock();
            for (m, buckets) in state.buckets.iter().enumerate() {
                for (distance, bucket) in buckets.iter().enumerate().rev() {
                    for &query_ordinal in bucket {
                        scratch.record(m, query_ordinal, distance as u8);
                    }
                }
            }
        }

        let mut matched: Vec<QueryId> = queries
            .iter()
            .filter(|query| query.visible_at(doc.generation) && matches(query, doc, scratch))
            .map(|query| query.id)
            .collect();
        matched.sort_unstable();
        matched.dedup();

        scratch.clear();
        matched
    }
}

fn matches(query: &Query, doc: &DocumentWords, scratch: &Scratch) -> bool {
    match query.match_type.metric() {
        None => query
            .terms
            .iter()
            .all(|term| doc.words.contains(term.word.get())),
        Some(metric) => query.terms.iter().all(|term| {
            term.ordinal
                .is_some_and(|ordinal| scratch.distance(metric.index(), ordinal) <= query.threshold)
        }),
    }
}
