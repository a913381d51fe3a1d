//! Levenshtein automata and the corpus trie.
//!
//! For a query word and threshold, [`LevenshteinDfa`] accepts exactly the
//! words within that edit distance and reports the distance on acceptance.
//! Walking it in product with a [`WordTrie`] of document words enumerates
//! every document word within the threshold in one pass, instead of one
//! banded edit-distance computation per pair.
//!
//! # Example
//!
//! ```rust
//! use lexwatch_core::automaton::{LevenshteinDfa, WordTrie};
//!
//! let mut trie = WordTrie::new();
//! trie.insert(b"hello", 0u32);
//! trie.insert(b"hallo", 1);
//! trie.insert(b"help", 2);
//! trie.insert(b"world", 3);
//!
//! let dfa = LevenshteinDfa::new(b"hello", 1);
//! let mut found = trie.within(&dfa);
//! found.sort_unstable();
//! assert_eq!(found, vec![(0, 0), (1, 1)]);
//! ```

mod dfa;
mod nfa;
mod trie;

pub use dfa::{DfaStateId, LevenshteinDfa, ALPHABET_SIZE};
pub use nfa::{LevenshteinNfa, NfaState, StateSet, MAX_NFA_THRESHOLD};
pub use trie::{Accept, WordTrie};
