//! Levenshtein NFA.
//!
//! States are laid out on a grid of `(consumed, errors)` with
//! `consumed in 0..=len(pattern)` and `errors in 0..=threshold`, indexed
//! `errors * (len + 1) + consumed`:
//!
//! ```text
//!  errors
//!    2   o--a-->o--b-->o--c-->[o]
//!        ^ \    ^ \    ^ \    ^
//!    1   o--a-->o--b-->o--c-->[o]
//!        ^ \    ^ \    ^ \    ^
//!    0   o--a-->o--b-->o--c-->[o]
//!        consumed ->
//! ```
//!
//! - letter: the expected next pattern byte, no error.
//! - wildcard: any byte, one error, either staying in the column (extra
//!   input byte) or advancing it (substitution).
//! - epsilon: no input, one error, advancing the column (pattern byte skipped).
//!
//! The right-most column is accepting, tagged with its error level.

use crate::text::MAX_WORD_LENGTH;

/// Set of NFA states, one bit per state.
///
/// The grid never exceeds `(31 + 1) * (3 + 1) = 128` states.
pub type StateSet = u128;

/// Largest supported threshold.
pub const MAX_NFA_THRESHOLD: u8 = 3;

/// Transitions out of one NFA state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NfaState {
    /// `(byte, target)` consumed without error.
    pub letter: Option<(u8, u8)>,
    /// Targets reachable on any byte with one error.
    pub wildcard: [Option<u8>; 2],
    /// Target reachable without input with one error.
    pub epsilon: Option<u8>,
    /// Error level when this state is accepting.
    pub accept: Option<u8>,
}

/// Nondeterministic automaton accepting every string within `threshold`
/// edits of a pattern.
#[derive(Debug, Clone)]
pub struct LevenshteinNfa {
    states: Vec<NfaState>,
    threshold: u8,
}

impl LevenshteinNfa {
    /// Builds the automaton for `pattern`.
    ///
    /// `pattern` is truncated to [`MAX_WORD_LENGTH`] bytes and `threshold`
    /// clamped to [`MAX_NFA_THRESHOLD`].
    #[must_use]
    pub fn new(pattern: &[u8], threshold: u8) -> Self {
        let pattern = &pattern[..pattern.len().min(MAX_WORD_LENGTH)];
        let threshold = threshold.min(MAX_NFA_THRESHOLD);
        let width = pattern.len() + 1;
        let index = |consumed: usize, errors: u8| (usize::from(errors) * width + consumed) as u8;

        let mut states = vec![NfaState::default(); width * (usize::from(threshold) + 1)];
        for errors in 0..=threshold {
            for consumed in 0..width {
                let state = &mut states[usize::from(index(consumed, errors))];
                if consumed < pattern.len() {
                    state.letter = Some((pattern[consumed], index(consumed + 1, errors)));
                }
                if errors < threshold {
                    if consumed < pattern.len() {
                        state.wildcard = [
                            Some(index(consumed, errors + 1)),
                            Some(index(consumed + 1, errors + 1)),
                        ];
                        state.epsilon = Some(index(consumed + 1, errors + 1));
                    } else {
                        state.wildcard = [Some(index(consumed, errors + 1)), None];
                    }
                }
                if consumed == pattern.len() {
                    state.accept = Some(errors);
                }
            }
        }

        Self { states, threshold }
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; the start state exists even for an empty pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Threshold the automaton was built for.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// State by index.
    #[must_use]
    pub fn state(&self, index: u8) -> &NfaState {
        &self.states[usize::from(index)]
    }

    /// Adds every state reachable through epsilon transitions.
    #[must_use]
    pub fn epsilon_closure(&self, mut set: StateSet) -> StateSet {
        let mut frontier = set;
        while frontier != 0 {
            let index = frontier.trailing_zeros() as u8;
            frontier &= frontier - 1;
            if let Some(target) = self.states[usize::from(index)].epsilon {
                let bit = 1u128 << target;
                if set & bit == 0 {
                    set |= bit;
                    frontier |= bit;
                }
            }
        }
        set
    }

    /// Epsilon-closed start set.
    #[must_use]
    pub fn start(&self) -> StateSet {
        self.epsilon_closure(1)
    }

    /// Epsilon-closed set reached from `set` on `byte`.
    #[must_use]
    pub fn step(&self, set: StateSet, byte: u8) -> StateSet {
        let mut next: StateSet = 0;
        let mut remaining = set;
        while remaining != 0 {
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            let state = &self.states[index];
            if let Some((expected, target)) = state.letter {
                if expected == byte {
                    next |= 1u128 << target;
                }
            }
            for target in state.wildcard.into_iter().flatten() {
                next |= 1u128 << target;
            }
        }
        self.epsilon_closure(next)
    }

    /// Smallest error level among accepting states in `set`.
    #[must_use]
    pub fn min_accept(&self, set: StateSet) -> Option<u8> {
        let mut remaining = set;
        let mut best: Option<u8> = None;
        while remaining != 0 {
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            if let Some(errors) = self.states[index].accept {
                best = Some(best.map_or(errors, |b| b.min(errors)));
            }
        }
        best
    }

    /// Distance of `input` to the pattern if within threshold.
    #[must_use]
    pub fn evaluate(&self, input: &[u8]) -> Option<u8> {
        let mut set = self.start();
        for &byte in input {
            set = self.step(set, byte);
            if set == 0 {
                return None;
            }
        }
        self.min_accept(set)
    }
}
