//! Deterministic Levenshtein automaton built by subset construction.

use rustc_hash::FxHashMap;

use super::nfa::{LevenshteinNfa, StateSet};

/// Index of a DFA state.
pub type DfaStateId = u32;

/// Letters of the word alphabet.
pub const ALPHABET_SIZE: usize = 26;

const NO_TRANSITION: DfaStateId = DfaStateId::MAX;

#[derive(Debug, Clone)]
struct DfaState {
    next: [DfaStateId; ALPHABET_SIZE],
    accept: Option<u8>,
}

/// Deterministic automaton accepting every word within a threshold of a
/// pattern, reporting the smallest distance reached.
///
/// The empty NFA set is not materialized: a missing transition means no
/// continuation can come back within the threshold.
#[derive(Debug, Clone)]
pub struct LevenshteinDfa {
    states: Vec<DfaState>,
    threshold: u8,
}

impl LevenshteinDfa {
    /// Start state.
    pub const START: DfaStateId = 0;

    /// Builds the DFA for `pattern` within `threshold` edits.
    #[must_use]
    pub fn new(pattern: &[u8], threshold: u8) -> Self {
        Self::from_nfa(&LevenshteinNfa::new(pattern, threshold))
    }

    /// Determinizes `nfa` over `a..=z`.
    #[must_use]
    pub fn from_nfa(nfa: &LevenshteinNfa) -> Self {
        let start = nfa.start();
        let mut ids: FxHashMap<StateSet, DfaStateId> = FxHashMap::default();
        let mut sets: Vec<StateSet> = vec![start];
        let mut states: Vec<DfaState> = vec![DfaState {
            next: [NO_TRANSITION; ALPHABET_SIZE],
            accept: nfa.min_accept(start),
        }];
        ids.insert(start, Self::START);

        let mut cursor = 0;
        while cursor < sets.len() {
            let set = sets[cursor];
            for (letter, byte) in (b'a'..=b'z').enumerate() {
                let target = nfa.step(set, byte);
                if target == 0 {
                    continue;
                }
                let id = *ids.entry(target).or_insert_with(|| {
                    let id = sets.len() as DfaStateId;
                    sets.push(target);
                    states.push(DfaState {
                        next: [NO_TRANSITION; ALPHABET_SIZE],
                        accept: nfa.min_accept(target),
                    });
                    id
                });
                states[cursor].next[letter] = id;
            }
            cursor += 1;
        }

        tracing::trace!(states = states.len(), "levenshtein dfa built");
        Self {
            states,
            threshold: nfa.threshold(),
        }
    }

    /// Threshold the automaton was built for.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; the start state is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Transition on a letter index in `0..26`.
    #[inline]
    #[must_use]
    pub fn next(&self, state: DfaStateId, letter: usize) -> Option<DfaStateId> {
        let target = self.states[state as usize].next[letter];
        (target != NO_TRANSITION).then_some(target)
    }

    /// Distance carried by `state` if accepting.
    #[inline]
    #[must_use]
    pub fn distance(&self, state: DfaStateId) -> Option<u8> {
        self.states[state as usize].accept
    }

    /// Runs `input` and returns its distance to the pattern if within
    /// threshold. Bytes outside `a..=z` reject.
    #[must_use]
    pub fn evaluate(&self, input: &[u8]) -> Option<u8> {
        let mut state = Self::START;
        for &byte in input {
            if !byte.is_ascii_lowercase() {
                return None;
            }
            state = self.next(state, usize::from(byte - b'a'))?;
        }
        self.distance(state)
    }
}
