//! Dense ordinal membership indexes.
//!
//! One index exists per approximate match type (Hamming, Edit) for query
//! words, plus one for the document-word corpus. Ordinals are dense,
//! assigned in first-seen order, and index the compact per-document scratch
//! arrays used during aggregation.
//!
//! Entries are reference counted by the queries that use them. An entry
//! whose count drops to zero is marked dead: the join stops comparing
//! against it, and its ordinal is never handed out again. Re-registering
//! the same word later allocates a fresh ordinal so that document words
//! compare against it as new work.

use parking_lot::RwLock;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

use crate::interner::WordId;
use crate::text::WordText;

/// Dense, index-scoped sequence number of a member word.
pub type Ordinal = u32;

/// A member word as seen by the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    /// Interned id.
    pub word: WordId,
    /// Word text, copied so the join never touches the interner.
    pub text: WordText,
}

#[derive(Debug, Default)]
struct Inner {
    /// Current (live or most recent) ordinal of each word.
    by_word: FxHashMap<WordId, Ordinal>,
    members: Vec<Member>,
    refs: Vec<u32>,
    dead: RoaringBitmap,
}

/// Thread-safe insert-or-get of ordinals for words.
#[derive(Debug, Default)]
pub struct MembershipIndex {
    inner: RwLock<Inner>,
}

impl MembershipIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more reference to `word`.
    ///
    /// Returns the word's ordinal and whether a new ordinal was allocated,
    /// which happens on first registration and when the previous entry is
    /// dead.
    pub fn acquire(&self, word: WordId, text: &WordText) -> (Ordinal, bool) {
        let mut inner = self.inner.write();
        if let Some(&ordinal) = inner.by_word.get(&word) {
            let slot = ordinal as usize;
            if inner.refs[slot] > 0 {
                inner.refs[slot] += 1;
                return (ordinal, false);
            }
        }

        let ordinal = inner.members.len() as Ordinal;
        inner.members.push(Member { word, text: *text });
        inner.refs.push(1);
        inner.by_word.insert(word, ordinal);
        (ordinal, true)
    }

    /// Returns the live ordinal of `word`, allocating one with a single
    /// reference if needed. Existing entries keep their count.
    ///
    /// Used for the document corpus, whose entries are never released.
    pub fn ensure(&self, word: WordId, text: &WordText) -> (Ordinal, bool) {
        if let Some(ordinal) = self.ordinal_of(word) {
            return (ordinal, false);
        }
        let mut inner = self.inner.write();
        if let Some(&ordinal) = inner.by_word.get(&word) {
            if inner.refs[ordinal as usize] > 0 {
                return (ordinal, false);
            }
        }
        let ordinal = inner.members.len() as Ordinal;
        inner.members.push(Member { word, text: *text });
        inner.refs.push(1);
        inner.by_word.insert(word, ordinal);
        (ordinal, true)
    }

    /// Drops one reference to `ordinal`.
    ///
    /// Returns true if this was the last reference and the entry is now dead.
    pub fn release(&self, ordinal: Ordinal) -> bool {
        let mut inner = self.inner.write();
        let slot = ordinal as usize;
        match inner.refs.get(slot).copied() {
            Some(1) => {
                inner.refs[slot] = 0;
                inner.dead.insert(ordinal);
                true
            }
            Some(n) if n > 1 => {
                inner.refs[slot] = n - 1;
                false
            }
            _ => false,
        }
    }

    /// Live ordinal of `word`, if any.
    #[must_use]
    pub fn ordinal_of(&self, word: WordId) -> Option<Ordinal> {
        let inner = self.inner.read();
        inner
            .by_word
            .get(&word)
            .copied()
            .filter(|&o| inner.refs[o as usize] > 0)
    }

    /// Members with ordinals in `from..`.
    #[must_use]
    pub fn members_from(&self, from: usize) -> Vec<Member> {
        let inner = self.inner.read();
        inner.members.get(from..).map(<[Member]>::to_vec).unwrap_or_default()
    }

    /// Ordinals whose entries are dead.
    #[must_use]
    pub fn dead(&self) -> RoaringBitmap {
        self.inner.read().dead.clone()
    }

    /// Total ordinals ever allocated (live and dead).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().members.len()
    }

    /// Returns true if no ordinal was ever allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().members.is_empty()
    }

    /// Number of live entries.
    #[must_use]
    pub fn live_len(&self) -> usize {
        let inner = self.inner.read();
        inner.members.len() - inner.dead.len() as usize
    }
}

// Tests moved to membership_tests.rs per project rules
