//! Bounded string distances for word matching.
//!
//! The join only needs to know whether a distance is at most
//! [`MAX_DISTANCE`], so both primitives stop as soon as that bound is
//! provably exceeded and report [`EXCEEDED`] instead of the true value.
//!
//! # Filters
//!
//! Before paying for a distance computation the join rejects pairs that
//! cannot be within bound:
//! - **Length**: Hamming needs equal lengths, edit distance is at least the
//!   length difference.
//! - **Letter mask**: each edit flips at most two letter-presence bits, so
//!   more than `2 * MAX_DISTANCE` flipped bits proves the distance is too large.

use serde::{Deserialize, Serialize};

use crate::text::{WordText, MAX_DISTANCE, MAX_WORD_LENGTH};

/// Sentinel for "distance exceeds [`MAX_DISTANCE`]".
pub const EXCEEDED: u8 = MAX_DISTANCE + 1;

const BOUND: usize = MAX_DISTANCE as usize;

/// Distance used by an approximate match type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Substitutions only, equal lengths.
    Hamming,
    /// Insertions, deletions and substitutions (Levenshtein).
    Edit,
}

impl Metric {
    /// Both metrics, in index order.
    pub const ALL: [Self; 2] = [Self::Hamming, Self::Edit];

    /// Dense index for per-metric arrays.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Hamming => 0,
            Self::Edit => 1,
        }
    }

    /// Returns false when the pair is provably farther apart than
    /// [`MAX_DISTANCE`] under this metric.
    #[must_use]
    #[inline]
    pub fn admits(self, a: &WordText, b: &WordText) -> bool {
        let length_ok = match self {
            Self::Hamming => a.len() == b.len(),
            Self::Edit => a.len().abs_diff(b.len()) <= BOUND,
        };
        length_ok && a.mask().flips(b.mask()) <= 2 * u32::from(MAX_DISTANCE)
    }

    /// Bounded distance between two words, or [`EXCEEDED`].
    #[must_use]
    #[inline]
    pub fn bounded(self, a: &[u8], b: &[u8]) -> u8 {
        match self {
            Self::Hamming => hamming_bounded(a, b),
            Self::Edit => edit_bounded(a, b),
        }
    }
}

/// Hamming distance capped at [`MAX_DISTANCE`].
///
/// Unequal lengths always report [`EXCEEDED`].
#[must_use]
pub fn hamming_bounded(a: &[u8], b: &[u8]) -> u8 {
    if a.len() != b.len() {
        return EXCEEDED;
    }
    let mut mismatches = 0u8;
    for (x, y) in a.iter().zip(b) {
        if x != y {
            mismatches += 1;
            if mismatches > MAX_DISTANCE {
                return EXCEEDED;
            }
        }
    }
    mismatches
}

/// Levenshtein distance capped at [`MAX_DISTANCE`].
///
/// Only the diagonal band of half-width [`MAX_DISTANCE`] is evaluated, and
/// the computation stops once every cell of a row exceeds the bound (row
/// minima never decrease along the table).
#[must_use]
pub fn edit_bounded(a: &[u8], b: &[u8]) -> u8 {
    let (n, m) = (a.len(), b.len());
    if n.abs_diff(m) > BOUND || n > MAX_WORD_LENGTH || m > MAX_WORD_LENGTH {
        return EXCEEDED;
    }

    let mut prev = [EXCEEDED; MAX_WORD_LENGTH + 1];
    let mut cur = [EXCEEDED; MAX_WORD_LENGTH + 1];
    for (j, cell) in prev.iter_mut().enumerate().take(m.min(BOUND) + 1) {
        *cell = j as u8;
    }

    for i in 1..=n {
        cur.fill(EXCEEDED);
        let lo = i.saturating_sub(BOUND);
        let hi = (i + BOUND).min(m);
        let mut row_min = EXCEEDED;

        if lo == 0 {
            cur[0] = i as u8;
            row_min = cur[0];
        }

        for j in lo.max(1)..=hi {
            let substitute = prev[j - 1] + u8::from(a[i - 1] != b[j - 1]);
            let delete = prev[j] + 1;
            let insert = cur[j - 1] + 1;
            let cell = substitute.min(delete).min(insert).min(EXCEEDED);
            cur[j] = cell;
            row_min = row_min.min(cell);
        }

        if row_min > MAX_DISTANCE {
            return EXCEEDED;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[m].min(EXCEEDED)
}

/// Unbounded Hamming distance, `None` for unequal lengths.
#[must_use]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Option<usize> {
    (a.len() == b.len()).then(|| a.iter().zip(b).filter(|(x, y)| x != y).count())
}

/// Unbounded Levenshtein distance (two-row dynamic program).
#[must_use]
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, &x) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &y) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(x != y);
            cur[j + 1] = substitute.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
