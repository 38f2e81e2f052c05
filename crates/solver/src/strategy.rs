//! Memoryless strategies read off a solved value vector.

use gamecheck_games::{Mdp, MinMax, PerState, StateSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One choice per state, plus every choice that was equally good.
///
/// Target states, and states outside the `remain` set of a constrained
/// query, have no choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    choices: Vec<Option<usize>>,
    optimal: Vec<Vec<usize>>,
}

impl Strategy {
    pub fn new(num_states: usize) -> Self {
        Self {
            choices: vec![None; num_states],
            optimal: vec![Vec::new(); num_states],
        }
    }

    /// Record the tied choices of `s`; the lowest index is the one played.
    pub fn set_optimal(&mut self, s: usize, ties: Vec<usize>) {
        self.choices[s] = ties.first().copied();
        self.optimal[s] = ties;
    }

    pub fn choice(&self, s: usize) -> Option<usize> {
        self.choices[s]
    }

    pub fn optimal_choices(&self, s: usize) -> &[usize] {
        &self.optimal[s]
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        for (s, c) in self.choices.iter().enumerate() {
            if let Some(c) = c {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{s}:{c}")?;
            }
        }
        write!(f, "]")
    }
}

/// Optimal probability choices in the states of `rows`.
///
/// Ties in maximising states are broken towards `target`.
pub(crate) fn extract_prob<M: Mdp>(
    model: &M,
    values: &[f64],
    dir: impl PerState<MinMax>,
    rows: &StateSet,
    target: &StateSet,
) -> Strategy {
    let mut optimal = vec![Vec::new(); model.num_states()];
    for s in rows.iter() {
        let val = model.mv_mult_min_max_single(s, values, &dir);
        optimal[s] = model.mv_mult_min_max_single_choices(s, values, val);
    }
    settle(model, optimal, |s| dir.at(s) == MinMax::Max, rows, target)
}

/// Optimal reward choices in the states of `rows`.
///
/// Ties in minimising states are broken towards `target`.
pub(crate) fn extract_reward<M: Mdp>(
    model: &M,
    values: &[f64],
    dir: impl PerState<MinMax>,
    rows: &StateSet,
    target: &StateSet,
) -> Strategy {
    let mut optimal = vec![Vec::new(); model.num_states()];
    for s in rows.iter() {
        let val = model.mv_mult_rew_min_max_single(s, values, &dir);
        optimal[s] = model.mv_mult_rew_min_max_single_choices(s, values, val);
    }
    settle(model, optimal, |s| dir.at(s) == MinMax::Min, rows, target)
}

/// Pick one choice per state among the tied `optimal` ones.
///
/// States are settled in layers working back from `target`. A `progress`
/// state settles through a tied choice with a successor in an earlier
/// layer, and plays it. Any other state settles once all of its tied
/// choices have such a successor. States that never settle play their
/// first tie.
fn settle<M: Mdp>(
    model: &M,
    optimal: Vec<Vec<usize>>,
    progress: impl Fn(usize) -> bool,
    rows: &StateSet,
    target: &StateSet,
) -> Strategy {
    let mut choices: Vec<Option<usize>> = optimal.iter().map(|t| t.first().copied()).collect();
    let mut settled = target.clone();
    loop {
        let mut layer = Vec::new();
        for s in rows.iter().filter(|&s| !settled.contains(s)) {
            let leads = |i: usize| model.distribution(s, i).any_successor(|t| settled.contains(t));
            if progress(s) {
                if let Some(i) = optimal[s].iter().copied().find(|&i| leads(i)) {
                    choices[s] = Some(i);
                    layer.push(s);
                }
            } else if !optimal[s].is_empty() && optimal[s].iter().all(|&i| leads(i)) {
                layer.push(s);
            }
        }
        if layer.is_empty() {
            break;
        }
        for s in layer {
            settled.insert(s);
        }
    }
    Strategy { choices, optimal }
}
