//! Sharded word interning table.
//!
//! Canonicalizes word text to a stable [`WordId`]. Identical text always
//! resolves to the same id, and exactly one caller observes `is_new` for a
//! given text.
//!
//! # Layout
//!
//! - **N shards** (power of two): the top bits of the text hash pick a shard,
//!   each with its own lock, so concurrent ingestion rarely contends.
//! - **Open addressing**: inside a shard, slots are probed linearly from the
//!   low hash bits.
//! - **Growth**: a shard doubles its slot array once the load factor
//!   crosses the configured threshold. Insertion never fails for lack of
//!   slots; only exhausting the 32-bit id space is reported.

use std::hash::Hasher;

use parking_lot::Mutex;
use rustc_hash::FxHasher;

use crate::config::InternerConfig;
use crate::error::{Error, Result};
use crate::text::WordText;

/// Stable identifier of an interned word.
///
/// Encodes `(entry index within shard, shard)`; ids are unique across the
/// whole table and never change once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(u32);

impl WordId {
    /// Raw id value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Rebuilds an id from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

const EMPTY: u32 = 0;

/// One independently locked open-addressed table.
#[derive(Debug)]
struct Shard {
    /// `EMPTY` or entry index + 1.
    slots: Vec<u32>,
    /// Interned texts in insertion order.
    entries: Vec<WordText>,
    /// Cached hash per entry, reused when growing.
    hashes: Vec<u64>,
}

impl Shard {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![EMPTY; capacity.next_power_of_two().max(2)],
            entries: Vec::new(),
            hashes: Vec::new(),
        }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Finds the slot holding `text`, or the empty slot where it belongs.
    fn probe(&self, hash: u64, text: &WordText) -> usize {
        let mask = self.mask();
        let mut slot = (hash as usize) & mask;
        loop {
            match self.slots[slot] {
                EMPTY => return slot,
                occupied => {
                    let entry = (occupied - 1) as usize;
                    if self.hashes[entry] == hash && self.entries[entry] == *text {
                        return slot;
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
    }

    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        let mut slots = vec![EMPTY; capacity];
        let mask = capacity - 1;
        for (entry, &hash) in self.hashes.iter().enumerate() {
            let mut slot = (hash as usize) & mask;
            while slots[slot] != EMPTY {
                slot = (slot + 1) & mask;
            }
            slots[slot] = entry as u32 + 1;
        }
        self.slots = slots;
        tracing::trace!(capacity, "interner shard grew");
    }
}

/// Thread-safe insert-or-get table mapping word text to [`WordId`].
#[derive(Debug)]
pub struct Interner {
    shards: Box<[Mutex<Shard>]>,
    shard_bits: u32,
    max_load_percent: usize,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new(&InternerConfig::default())
    }
}

impl Interner {
    /// Creates an empty table.
    ///
    /// `config.shards` is rounded up to a power of two.
    #[must_use]
    pub fn new(config: &InternerConfig) -> Self {
        let shard_count = config.shards.max(1).next_power_of_two();
        let shards = (0..shard_count)
            .map(|_| Mutex::new(Shard::with_capacity(config.initial_capacity)))
            .collect();
        Self {
            shards,
            shard_bits: shard_count.trailing_zeros(),
            max_load_percent: usize::from(config.max_load_percent.clamp(10, 90)),
        }
    }

    fn hash(text: &WordText) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write(text.as_bytes());
        hasher.finish()
    }

    #[inline]
    fn shard_of(&self, hash: u64) -> usize {
        if self.shard_bits == 0 {
            0
        } else {
            (hash >> (64 - self.shard_bits)) as usize
        }
    }

    /// Interns `text`, returning its id and whether this call created it.
    ///
    /// Only the target shard is locked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the shard's share of the 32-bit id
    /// space is exhausted.
    pub fn insert(&self, text: &WordText) -> Result<(WordId, bool)> {
        let hash = Self::hash(text);
        let shard_idx = self.shard_of(hash);
        let mut shard = self.shards[shard_idx].lock();

        let slot = shard.probe(hash, text);
        if shard.slots[slot] != EMPTY {
            let entry = shard.slots[slot] - 1;
            return Ok((self.encode(entry, shard_idx), false));
        }

        let entry = shard.entries.len();
        if entry as u64 >= (u64::from(u32::MAX) >> self.shard_bits) {
            return Err(Error::Internal(format!(
                "interner shard {shard_idx} exhausted its id space"
            )));
        }
        shard.entries.push(*text);
        shard.hashes.push(hash);
        shard.slots[slot] = entry as u32 + 1;

        if shard.entries.len() * 100 > shard.slots.len() * self.max_load_percent {
            shard.grow();
        }

        Ok((self.encode(entry as u32, shard_idx), true))
    }

    /// Looks up the id of `text` without interning it.
    #[must_use]
    pub fn get(&self, text: &WordText) -> Option<WordId> {
        let hash = Self::hash(text);
        let shard_idx = self.shard_of(hash);
        let shard = self.shards[shard_idx].lock();
        let slot = shard.probe(hash, text);
        match shard.slots[slot] {
            EMPTY => None,
            occupied => Some(self.encode(occupied - 1, shard_idx)),
        }
    }

    /// Returns the text behind `id`.
    #[must_use]
    pub fn resolve(&self, id: WordId) -> Option<WordText> {
        let shard_idx = (id.0 & ((1 << self.shard_bits) - 1)) as usize;
        let entry = (id.0 >> self.shard_bits) as usize;
        self.shards
            .get(shard_idx)
            .and_then(|shard| shard.lock().entries.get(entry).copied())
    }

    #[inline]
    fn encode(&self, entry: u32, shard_idx: usize) -> WordId {
        WordId((entry << self.shard_bits) | shard_idx as u32)
    }

    /// Number of distinct words interned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().entries.len()).sum()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().entries.is_empty())
    }

    /// Number of shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

// Tests moved to interner_tests.rs per project rules
