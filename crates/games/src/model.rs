//! The MDP capability: the read-only interface every explicit game exposes.
//!
//! Models only have to answer structural questions (how many states, which
//! choices, which distribution). The numeric and qualitative single-step
//! operations used by the solver are provided methods built from those
//! answers, so an MDP, a two-player game and a multiplayer game all share one
//! implementation of each step.
//!
//! Every step takes its optimisation direction (or choice quantifier) as a
//! [`PerState`] value. A plain `MinMax` or `bool` applies the same direction
//! everywhere, which is the MDP reading; a [`ByPlayer`](crate::ByPlayer)
//! picks the direction from the owner of each state, which is the
//! turn-based game reading.

use gamecheck_prob::Distribution;
use serde::{Deserialize, Serialize};

use crate::ops;
use crate::state_set::StateSet;

// ============================================================================
// Directions and filters
// ============================================================================

/// Minimise or maximise over the choices of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinMax {
    Min,
    Max,
}

impl MinMax {
    pub fn from_min(min: bool) -> Self {
        if min {
            MinMax::Min
        } else {
            MinMax::Max
        }
    }

    pub fn is_min(&self) -> bool {
        matches!(self, MinMax::Min)
    }

    pub fn opposite(&self) -> Self {
        match self {
            MinMax::Min => MinMax::Max,
            MinMax::Max => MinMax::Min,
        }
    }

    /// Is `a` strictly preferable to `b`?
    pub fn better(&self, a: f64, b: f64) -> bool {
        match self {
            MinMax::Min => a < b,
            MinMax::Max => a > b,
        }
    }
}

/// How the change between two iterates is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffMeasure {
    #[default]
    Absolute,
    /// Change relative to the new value (absolute where the new value is 0).
    Relative,
}

impl DiffMeasure {
    pub fn diff(&self, old: f64, new: f64) -> f64 {
        if old == new {
            return 0.0;
        }
        let abs = (new - old).abs();
        match self {
            DiffMeasure::Absolute => abs,
            DiffMeasure::Relative if new != 0.0 => abs / new.abs(),
            DiffMeasure::Relative => abs,
        }
    }
}

/// Which rows a whole-vector step touches.
#[derive(Debug, Clone, Copy)]
pub enum RowFilter<'a> {
    All,
    Only(&'a StateSet),
    Except(&'a StateSet),
}

impl RowFilter<'_> {
    pub fn includes(&self, s: usize) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Only(set) => set.contains(s),
            RowFilter::Except(set) => !set.contains(s),
        }
    }
}

/// A value chosen per state.
pub trait PerState<T> {
    fn at(&self, s: usize) -> T;
}

impl PerState<MinMax> for MinMax {
    fn at(&self, _s: usize) -> MinMax {
        *self
    }
}

impl PerState<bool> for bool {
    fn at(&self, _s: usize) -> bool {
        *self
    }
}

// ============================================================================
// Mdp
// ============================================================================

/// Read-only access to an explicit-state MDP.
///
/// Choice `i` of state `s` is a [`Distribution`] over successor indices.
/// Accessors panic on out-of-range indices, like slice indexing.
pub trait Mdp {
    fn num_states(&self) -> usize;

    fn initial_states(&self) -> &[usize];

    fn num_choices(&self, s: usize) -> usize;

    fn distribution(&self, s: usize, i: usize) -> &Distribution;

    /// Action label of choice `i` of state `s`, if any.
    fn action(&self, s: usize, i: usize) -> Option<&str>;

    /// Reward attached to taking choice `i` in state `s` (0 if none).
    fn transition_reward(&self, s: usize, i: usize) -> f64;

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    fn num_transitions(&self, s: usize, i: usize) -> usize {
        self.distribution(s, i).len()
    }

    /// `(successor, probability)` pairs of choice `i` of state `s`.
    fn transitions(&self, s: usize, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.distribution(s, i).iter()
    }

    fn num_transitions_total(&self) -> usize {
        (0..self.num_states())
            .map(|s| {
                (0..self.num_choices(s))
                    .map(|i| self.num_transitions(s, i))
                    .sum::<usize>()
            })
            .sum()
    }

    /// States with no choices.
    fn deadlocks(&self) -> Vec<usize> {
        (0..self.num_states())
            .filter(|&s| self.num_choices(s) == 0)
            .collect()
    }

    // ------------------------------------------------------------------
    // Qualitative steps
    // ------------------------------------------------------------------

    /// One step of Prob0: for `s` in `subset`, `result[s]` holds iff for
    /// all (`forall`) or some choices there is a transition into `u`.
    fn prob0_step(
        &self,
        subset: &StateSet,
        u: &StateSet,
        forall: impl PerState<bool>,
        result: &mut StateSet,
    ) {
        for s in subset.iter() {
            let hit = ops::quantify(self.num_choices(s), forall.at(s), |i| {
                self.distribution(s, i).any_successor(|j| u.contains(j))
            });
            result.set(s, hit);
        }
    }

    /// One step of Prob1: for `s` in `subset`, `result[s]` holds iff for
    /// all (`forall`) or some choices every transition stays in `u` and
    /// some transition reaches `v`.
    fn prob1_step(
        &self,
        subset: &StateSet,
        u: &StateSet,
        v: &StateSet,
        forall: impl PerState<bool>,
        result: &mut StateSet,
    ) {
        for s in subset.iter() {
            let hit = ops::quantify(self.num_choices(s), forall.at(s), |i| {
                let d = self.distribution(s, i);
                d.all_successors(|j| u.contains(j)) && d.any_successor(|j| v.contains(j))
            });
            result.set(s, hit);
        }
    }

    // ------------------------------------------------------------------
    // Numeric steps
    // ------------------------------------------------------------------

    /// `Σ_j P_i(s,j)·vect[j]`.
    fn mv_mult_single(&self, s: usize, i: usize, vect: &[f64]) -> f64 {
        ops::row_value(self.distribution(s, i), vect)
    }

    /// `min/max_i Σ_j P_i(s,j)·vect[j]`.
    fn mv_mult_min_max_single(
        &self,
        s: usize,
        vect: &[f64],
        dir: impl PerState<MinMax>,
    ) -> f64 {
        ops::best(self.num_choices(s), dir.at(s), |i| self.mv_mult_single(s, i, vect))
    }

    /// Every choice of `s` whose value equals `val`.
    fn mv_mult_min_max_single_choices(&self, s: usize, vect: &[f64], val: f64) -> Vec<usize> {
        ops::ties(self.num_choices(s), val, |i| self.mv_mult_single(s, i, vect))
    }

    /// One Jacobi step of value iteration: `result[s]` for every row the
    /// filter admits. Other entries of `result` are left untouched.
    fn mv_mult_min_max(
        &self,
        vect: &[f64],
        dir: impl PerState<MinMax>,
        result: &mut [f64],
        filter: RowFilter<'_>,
    ) {
        for (s, slot) in result.iter_mut().enumerate() {
            if filter.includes(s) {
                *slot = self.mv_mult_min_max_single(s, vect, &dir);
            }
        }
    }

    /// `(Σ_{j≠s} P_i(s,j)·vect[j]) / (1 - P_i(s,s))`. A pure self-loop never
    /// leaves `s` and is worth 0.
    fn mv_mult_jac_single(&self, s: usize, i: usize, vect: &[f64]) -> f64 {
        ops::jacobi_value(s, self.distribution(s, i), vect, 0.0).unwrap_or(0.0)
    }

    fn mv_mult_jac_min_max_single(
        &self,
        s: usize,
        vect: &[f64],
        dir: impl PerState<MinMax>,
    ) -> f64 {
        ops::best(self.num_choices(s), dir.at(s), |i| self.mv_mult_jac_single(s, i, vect))
    }

    /// One Gauss-Seidel pass: rows are updated in place, in index order,
    /// each reading the values already written in this pass. Returns the
    /// largest change.
    fn mv_mult_gs_min_max(
        &self,
        vect: &mut [f64],
        dir: impl PerState<MinMax>,
        filter: RowFilter<'_>,
        measure: DiffMeasure,
    ) -> f64 {
        let mut max_diff: f64 = 0.0;
        for s in 0..vect.len() {
            if !filter.includes(s) {
                continue;
            }
            let new = self.mv_mult_jac_min_max_single(s, vect, &dir);
            max_diff = max_diff.max(measure.diff(vect[s], new));
            vect[s] = new;
        }
        max_diff
    }

    // ------------------------------------------------------------------
    // Reward steps
    // ------------------------------------------------------------------

    /// `reward(s,i) + Σ_j P_i(s,j)·vect[j]`.
    fn mv_mult_rew_single(&self, s: usize, i: usize, vect: &[f64]) -> f64 {
        self.transition_reward(s, i) + ops::row_value(self.distribution(s, i), vect)
    }

    fn mv_mult_rew_min_max_single(
        &self,
        s: usize,
        vect: &[f64],
        dir: impl PerState<MinMax>,
    ) -> f64 {
        ops::best(self.num_choices(s), dir.at(s), |i| self.mv_mult_rew_single(s, i, vect))
    }

    fn mv_mult_rew_min_max_single_choices(&self, s: usize, vect: &[f64], val: f64) -> Vec<usize> {
        ops::ties(self.num_choices(s), val, |i| self.mv_mult_rew_single(s, i, vect))
    }

    fn mv_mult_rew_min_max(
        &self,
        vect: &[f64],
        dir: impl PerState<MinMax>,
        result: &mut [f64],
        filter: RowFilter<'_>,
    ) {
        for (s, slot) in result.iter_mut().enumerate() {
            if filter.includes(s) {
                *slot = self.mv_mult_rew_min_max_single(s, vect, &dir);
            }
        }
    }

    /// Jacobi form of [`mv_mult_rew_single`](Self::mv_mult_rew_single). A
    /// pure self-loop never reaches a target and is worth infinity.
    fn mv_mult_rew_jac_single(&self, s: usize, i: usize, vect: &[f64]) -> f64 {
        let reward = self.transition_reward(s, i);
        ops::jacobi_value(s, self.distribution(s, i), vect, reward).unwrap_or(f64::INFINITY)
    }

    fn mv_mult_rew_jac_min_max_single(
        &self,
        s: usize,
        vect: &[f64],
        dir: impl PerState<MinMax>,
    ) -> f64 {
        ops::best(self.num_choices(s), dir.at(s), |i| self.mv_mult_rew_jac_single(s, i, vect))
    }

    fn mv_mult_rew_gs_min_max(
        &self,
        vect: &mut [f64],
        dir: impl PerState<MinMax>,
        filter: RowFilter<'_>,
        measure: DiffMeasure,
    ) -> f64 {
        let mut max_diff: f64 = 0.0;
        for s in 0..vect.len() {
            if !filter.includes(s) {
                continue;
            }
            let new = self.mv_mult_rew_jac_min_max_single(s, vect, &dir);
            max_diff = max_diff.max(measure.diff(vect[s], new));
            vect[s] = new;
        }
        max_diff
    }
}

impl<T, P: PerState<T> + ?Sized> PerState<T> for &P {
    fn at(&self, s: usize) -> T {
        (**self).at(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax() {
        assert!(MinMax::Min.better(0.1, 0.2));
        assert!(!MinMax::Min.better(0.2, 0.2));
        assert_eq!(MinMax::from_min(false), MinMax::Max);
        assert_eq!(MinMax::Max.opposite(), MinMax::Min);
    }

    #[test]
    fn test_diff_measure() {
        assert!((DiffMeasure::Absolute.diff(0.5, 0.75) - 0.25).abs() < 1e-12);
        assert!((DiffMeasure::Relative.diff(0.5, 0.25) - 1.0).abs() < 1e-12);
        assert_eq!(DiffMeasure::Relative.diff(0.5, 0.0), 0.5);
        assert_eq!(DiffMeasure::Absolute.diff(f64::INFINITY, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_row_filter() {
        let set = StateSet::from_indices(4, [1, 2]);
        assert!(RowFilter::All.includes(3));
        assert!(RowFilter::Only(&set).includes(1));
        assert!(!RowFilter::Only(&set).includes(0));
        assert!(RowFilter::Except(&set).includes(0));
        assert!(!RowFilter::Except(&set).includes(2));
    }
}
