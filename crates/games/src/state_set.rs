//! Fixed-universe sets of state indices.

use serde::{Deserialize, Serialize};
use std::fmt;

const WORD: usize = 64;

/// A set of state indices drawn from `0..universe`, stored as a bit vector.
///
/// Qualitative precomputation works almost entirely in terms of these sets,
/// so the set operations are word-at-a-time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSet {
    words: Vec<u64>,
    universe: usize,
}

impl StateSet {
    /// The empty set over `0..universe`.
    pub fn new(universe: usize) -> Self {
        Self {
            words: vec![0; universe.div_ceil(WORD)],
            universe,
        }
    }

    /// Every state in `0..universe`.
    pub fn full(universe: usize) -> Self {
        let mut set = Self::new(universe);
        for w in &mut set.words {
            *w = u64::MAX;
        }
        set.clear_tail();
        set
    }

    /// The set containing `indices`; indices outside the universe are
    /// ignored.
    pub fn from_indices(universe: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::new(universe);
        for i in indices {
            set.insert(i);
        }
        set
    }

    /// Size of the universe, not the number of members.
    pub fn universe(&self) -> usize {
        self.universe
    }

    pub fn contains(&self, i: usize) -> bool {
        i < self.universe && self.words[i / WORD] & (1 << (i % WORD)) != 0
    }

    /// Add `i`; returns whether it was newly added.
    pub fn insert(&mut self, i: usize) -> bool {
        if i >= self.universe {
            return false;
        }
        let mask = 1 << (i % WORD);
        let word = &mut self.words[i / WORD];
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    pub fn remove(&mut self, i: usize) {
        if i < self.universe {
            self.words[i / WORD] &= !(1 << (i % WORD));
        }
    }

    pub fn set(&mut self, i: usize, member: bool) {
        if member {
            self.insert(i);
        } else {
            self.remove(i);
        }
    }

    /// Number of members.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(k, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(k * WORD + bit)
            })
        })
    }

    pub fn union_with(&mut self, other: &StateSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    pub fn intersect_with(&mut self, other: &StateSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
        }
    }

    /// Remove every member of `other`.
    pub fn difference_with(&mut self, other: &StateSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
    }

    /// The complement within the universe.
    pub fn complement(&self) -> StateSet {
        let mut out = Self {
            words: self.words.iter().map(|w| !w).collect(),
            universe: self.universe,
        };
        out.clear_tail();
        out
    }

    pub fn is_subset_of(&self, other: &StateSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & !b == 0)
    }

    fn clear_tail(&mut self) {
        let rem = self.universe % WORD;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, i) in self.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{i}")?;
        }
        write!(f, "}}")
    }
}
