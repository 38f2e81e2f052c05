//! # Qualitative Precomputation
//!
//! Graph fixpoints that find the states whose reachability probability is
//! exactly 0 or exactly 1, before any numeric iteration. Both are computed
//! over booleans and so are exact.
//!
//! Each state's owner quantifies over its own choices: a player trying to
//! reach the target needs *some* good choice, a player trying to avoid it
//! needs *every* choice to be good for the other side. [`Quantifier`] turns
//! a per-state direction into that per-state quantifier.

use gamecheck_games::{Mdp, MinMax, PerState, StateSet};
use tracing::debug;

/// Per-state "for all choices" flag, derived from a per-state direction.
///
/// A state is universally quantified when its direction equals `universal`.
#[derive(Debug, Clone, Copy)]
pub struct Quantifier<D> {
    dir: D,
    universal: MinMax,
}

impl<D: PerState<MinMax>> Quantifier<D> {
    /// Quantifiers for reaching the target: maximisers choose, minimisers
    /// must cope with every choice.
    pub fn reach(dir: D) -> Self {
        Self {
            dir,
            universal: MinMax::Min,
        }
    }

    /// Quantifiers for reaching the target when the minimiser is the one
    /// who wants to get there (expected reward until the target).
    pub fn reach_for_min(dir: D) -> Self {
        Self {
            dir,
            universal: MinMax::Max,
        }
    }
}

impl<D: PerState<MinMax>> PerState<bool> for Quantifier<D> {
    fn at(&self, s: usize) -> bool {
        self.dir.at(s) == self.universal
    }
}

/// States outside `target` that iteration may change: all of them, or
/// those in `remain`.
fn candidates(n: usize, remain: Option<&StateSet>, target: &StateSet) -> StateSet {
    let mut subset = match remain {
        Some(remain) => remain.clone(),
        None => StateSet::full(n),
    };
    subset.difference_with(target);
    subset
}

/// States from which `remain U target` holds with probability 0.
///
/// The least fixpoint of "can reach the target with positive probability
/// while staying in `remain`", complemented.
pub fn prob0<M: Mdp>(
    model: &M,
    remain: Option<&StateSet>,
    target: &StateSet,
    forall: impl PerState<bool>,
) -> StateSet {
    let n = model.num_states();
    let subset = candidates(n, remain, target);

    let mut u = target.clone();
    let mut iters = 0;
    loop {
        let mut next = u.clone();
        model.prob0_step(&subset, &u, &forall, &mut next);
        next.union_with(&u);
        iters += 1;
        if next == u {
            break;
        }
        u = next;
    }

    let no = u.complement();
    debug!("Prob0: {} states in {} iterations", no.count(), iters);
    no
}

/// States from which `remain U target` holds with probability 1.
///
/// A greatest fixpoint over `u` of the least fixpoint "reach the target
/// while never leaving `u`".
pub fn prob1<M: Mdp>(
    model: &M,
    remain: Option<&StateSet>,
    target: &StateSet,
    forall: impl PerState<bool>,
) -> StateSet {
    let n = model.num_states();
    let subset = candidates(n, remain, target);

    let mut u = StateSet::full(n);
    let mut iters = 0;
    loop {
        let mut v = target.clone();
        loop {
            let mut next = v.clone();
            model.prob1_step(&subset, &u, &v, &forall, &mut next);
            next.union_with(target);
            iters += 1;
            if next == v {
                break;
            }
            v = next;
        }
        if v == u {
            break;
        }
        u = v;
    }

    debug!("Prob1: {} states in {} iterations", u.count(), iters);
    u
}
