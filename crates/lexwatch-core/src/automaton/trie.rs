//! Corpus trie: one automaton spelling every distinct word once.

use super::dfa::{DfaStateId, LevenshteinDfa, ALPHABET_SIZE};

type NodeId = u32;

const NO_CHILD: NodeId = NodeId::MAX;

/// Payload of a trie node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accept<T> {
    /// No word ends here.
    #[default]
    Unmatched,
    /// A word ends here and carries `T`.
    Matched(T),
}

impl<T: Copy> Accept<T> {
    /// Payload if matched.
    #[must_use]
    pub const fn matched(self) -> Option<T> {
        match self {
            Self::Unmatched => None,
            Self::Matched(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    children: [NodeId; ALPHABET_SIZE],
    accept: Accept<T>,
}

impl<T> Node<T> {
    const fn empty() -> Self {
        Self {
            children: [NO_CHILD; ALPHABET_SIZE],
            accept: Accept::Unmatched,
        }
    }
}

/// Byte trie over `a..=z`, each word tagged with a payload.
#[derive(Debug, Clone)]
pub struct WordTrie<T> {
    nodes: Vec<Node<T>>,
    words: usize,
}

impl<T: Copy> Default for WordTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> WordTrie<T> {
    /// Creates a trie holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::empty()],
            words: 0,
        }
    }

    /// Number of distinct words.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.words
    }

    /// Returns true if no word was inserted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.words == 0
    }

    /// Number of nodes including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Inserts `word` with `value`. Returns false, leaving the existing
    /// payload untouched, if the word is already present.
    ///
    /// Bytes outside `a..=z` are skipped; callers only pass validated words.
    pub fn insert(&mut self, word: &[u8], value: T) -> bool {
        let mut node: NodeId = 0;
        for letter in letters(word) {
            let child = self.nodes[node as usize].children[letter];
            node = if child == NO_CHILD {
                let id = self.nodes.len() as NodeId;
                self.nodes.push(Node::empty());
                self.nodes[node as usize].children[letter] = id;
                id
            } else {
                child
            };
        }
        let slot = &mut self.nodes[node as usize].accept;
        if matches!(slot, Accept::Matched(_)) {
            return false;
        }
        *slot = Accept::Matched(value);
        self.words += 1;
        true
    }

    /// Payload stored for `word`.
    #[must_use]
    pub fn get(&self, word: &[u8]) -> Option<T> {
        let mut node: NodeId = 0;
        for letter in letters(word) {
            node = self.nodes[node as usize].children[letter];
            if node == NO_CHILD {
                return None;
            }
        }
        self.nodes[node as usize].accept.matched()
    }

    /// Returns true if `word` was inserted.
    #[must_use]
    pub fn contains(&self, word: &[u8]) -> bool {
        self.get(word).is_some()
    }

    /// Walks the trie in product with `dfa`, calling `visit` with the
    /// payload and distance of every word the DFA accepts.
    ///
    /// Branches are cut as soon as the DFA has no transition, so the work is
    /// bounded by the part of the trie within the threshold.
    pub fn intersect<F>(&self, dfa: &LevenshteinDfa, mut visit: F)
    where
        F: FnMut(T, u8),
    {
        let mut stack: Vec<(NodeId, DfaStateId)> = vec![(0, LevenshteinDfa::START)];
        while let Some((node, state)) = stack.pop() {
            let node = &self.nodes[node as usize];
            if let (Accept::Matched(value), Some(distance)) = (node.accept, dfa.distance(state)) {
                visit(value, distance);
            }
            for (letter, &child) in node.children.iter().enumerate() {
                if child == NO_CHILD {
                    continue;
                }
                if let Some(next) = dfa.next(state, letter) {
                    stack.push((child, next));
                }
            }
        }
    }

    /// Collects [`WordTrie::intersect`] into a vector.
    #[must_use]
    pub fn within(&self, dfa: &LevenshteinDfa) -> Vec<(T, u8)> {
        let mut found = Vec::new();
        self.intersect(dfa, |value, distance| found.push((value, distance)));
        found
    }
}

fn letters(word: &[u8]) -> impl Iterator<Item = usize> + '_ {
    word.iter()
        .filter(|b| b.is_ascii_lowercase())
        .map(|&b| usize::from(b - b'a'))
}
