//! Sparse probability distributions over state indices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ProbError;
use crate::PROB_TOLERANCE;

/// A sparse distribution over successor states: state index → probability.
///
/// One `Distribution` is one choice of one state in an explicit game model.
/// Entries are kept ordered by successor index so that every iteration over
/// a model visits transitions in the same order.
///
/// # Example
///
/// ```rust
/// use gamecheck_prob::Distribution;
///
/// let mut d = Distribution::new();
/// d.add(3, 0.25).unwrap();
/// d.add(1, 0.5).unwrap();
/// d.add(3, 0.25).unwrap(); // merged with the first entry
/// assert_eq!(d.len(), 2);
/// assert_eq!(d.get(3), 0.5);
/// assert!((d.sum() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    map: BTreeMap<usize, f64>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point mass on `j`.
    pub fn point(j: usize) -> Self {
        let mut map = BTreeMap::new();
        map.insert(j, 1.0);
        Self { map }
    }

    /// Build from `(successor, probability)` pairs, merging duplicates.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ProbError>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut d = Self::new();
        for (j, p) in pairs {
            d.add(j, p)?;
        }
        Ok(d)
    }

    /// Add probability `p` to successor `j`. Zero adds no edge.
    pub fn add(&mut self, j: usize, p: f64) -> Result<(), ProbError> {
        check_probability(p)?;
        if p == 0.0 {
            return Ok(());
        }
        *self.map.entry(j).or_insert(0.0) += p;
        Ok(())
    }

    /// Overwrite the probability of successor `j`; zero removes it.
    pub fn set(&mut self, j: usize, p: f64) -> Result<(), ProbError> {
        check_probability(p)?;
        if p == 0.0 {
            self.map.remove(&j);
        } else {
            self.map.insert(j, p);
        }
        Ok(())
    }

    /// Probability of successor `j` (zero if absent).
    pub fn get(&self, j: usize) -> f64 {
        self.map.get(&j).copied().unwrap_or(0.0)
    }

    /// Number of successors with an entry.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.map.values().sum()
    }

    /// `(successor, probability)` pairs in successor order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.map.iter().map(|(&j, &p)| (j, p))
    }

    /// Successor indices in order.
    pub fn support(&self) -> impl Iterator<Item = usize> + '_ {
        self.map.keys().copied()
    }

    /// Do all successors satisfy `pred`?
    pub fn all_successors(&self, mut pred: impl FnMut(usize) -> bool) -> bool {
        self.map.keys().all(|&j| pred(j))
    }

    /// Does some successor satisfy `pred`?
    pub fn any_successor(&self, mut pred: impl FnMut(usize) -> bool) -> bool {
        self.map.keys().any(|&j| pred(j))
    }

    /// Fail unless the probabilities sum to one within tolerance.
    pub fn check_normalized(&self) -> Result<(), ProbError> {
        if self.map.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            return Err(ProbError::NotNormalized { sum });
        }
        Ok(())
    }

    /// Apply a state renumbering (`permut[old] = new`).
    pub fn permuted(&self, permut: &[usize]) -> Result<Self, ProbError> {
        let mut map = BTreeMap::new();
        for (&j, &p) in &self.map {
            let target = *permut.get(j).ok_or(ProbError::IndexOutOfBounds {
                index: j,
                size: permut.len(),
            })?;
            map.insert(target, p);
        }
        Ok(Self { map })
    }
}

fn check_probability(p: f64) -> Result<(), ProbError> {
    if !p.is_finite() {
        return Err(ProbError::NonFinite { value: p });
    }
    if p < 0.0 {
        return Err(ProbError::NegativeProbability);
    }
    Ok(())
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (j, p)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{j}={p}")?;
        }
        write!(f, "}}")
    }
}
