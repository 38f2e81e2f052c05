//! Explicit-state MDPs.

use gamecheck_prob::Distribution;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;
use crate::model::Mdp;
use crate::player::TurnBased;

/// One choice of a state: a distribution plus an optional action label and
/// transition reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRow {
    pub distribution: Distribution,
    pub action: Option<String>,
    pub reward: f64,
}

/// A simple explicit-state MDP: per state, an ordered list of choices.
///
/// States are appended during exploration and the model is read-only
/// afterwards. Successor indices are not checked when a choice is added,
/// since exploration adds choices pointing at states it has not created
/// yet; call [`check_successors`](Self::check_successors) once building is
/// complete.
///
/// # Example
///
/// ```rust
/// use gamecheck_games::{Mdp, MdpExplicit, MinMax, RowFilter};
/// use gamecheck_prob::Distribution;
///
/// let mut mdp = MdpExplicit::with_states(2);
/// mdp.add_choice(0, Distribution::from_pairs([(0, 0.6), (1, 0.4)]).unwrap()).unwrap();
/// mdp.add_choice(0, Distribution::from_pairs([(0, 0.1), (1, 0.9)]).unwrap()).unwrap();
/// mdp.add_choice(1, Distribution::point(1)).unwrap();
///
/// let mut result = vec![0.0; 2];
/// mdp.mv_mult_min_max(&[0.0, 1.0], MinMax::Max, &mut result, RowFilter::All);
/// assert!((result[0] - 0.9).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MdpExplicit {
    rows: Vec<Vec<ChoiceRow>>,
    initial: Vec<usize>,
}

impl MdpExplicit {
    pub fn new() -> Self {
        Self::default()
    }

    /// An MDP with `n` states and no choices.
    pub fn with_states(n: usize) -> Self {
        let mut mdp = Self::new();
        mdp.add_states(n);
        mdp
    }

    /// Append a state; returns its index.
    pub fn add_state(&mut self) -> usize {
        self.rows.push(Vec::new());
        self.rows.len() - 1
    }

    pub fn add_states(&mut self, n: usize) {
        self.rows.extend((0..n).map(|_| Vec::new()));
    }

    pub fn add_initial_state(&mut self, s: usize) -> Result<(), GameError> {
        self.check_state(s)?;
        if !self.initial.contains(&s) {
            self.initial.push(s);
        }
        Ok(())
    }

    /// Append a choice to state `s`; returns the choice index.
    pub fn add_choice(&mut self, s: usize, distribution: Distribution) -> Result<usize, GameError> {
        self.push_row(s, distribution, None)
    }

    pub fn add_action_labelled_choice(
        &mut self,
        s: usize,
        distribution: Distribution,
        action: impl Into<String>,
    ) -> Result<usize, GameError> {
        self.push_row(s, distribution, Some(action.into()))
    }

    fn push_row(
        &mut self,
        s: usize,
        distribution: Distribution,
        action: Option<String>,
    ) -> Result<usize, GameError> {
        self.check_state(s)?;
        let row = &mut self.rows[s];
        row.push(ChoiceRow {
            distribution,
            action,
            reward: 0.0,
        });
        Ok(row.len() - 1)
    }

    pub fn set_transition_reward(
        &mut self,
        s: usize,
        i: usize,
        reward: f64,
    ) -> Result<(), GameError> {
        self.row_mut(s, i)?.reward = reward;
        Ok(())
    }

    /// Give every state without choices a self-loop; returns those states.
    pub fn fix_deadlocks(&mut self) -> Vec<usize> {
        let mut fixed = Vec::new();
        for (s, row) in self.rows.iter_mut().enumerate() {
            if row.is_empty() {
                row.push(ChoiceRow {
                    distribution: Distribution::point(s),
                    action: None,
                    reward: 0.0,
                });
                fixed.push(s);
            }
        }
        fixed
    }

    /// Fail if any transition targets a state that does not exist.
    pub fn check_successors(&self) -> Result<(), GameError> {
        let n = self.rows.len();
        for (s, row) in self.rows.iter().enumerate() {
            for choice in row {
                if let Some(successor) = choice.distribution.support().find(|&j| j >= n) {
                    return Err(GameError::InvalidSuccessor {
                        state: s,
                        successor,
                    });
                }
            }
        }
        Ok(())
    }

    /// Renumber states so that state `i` becomes `permut[i]`.
    pub fn permuted(&self, permut: &[usize]) -> Result<Self, GameError> {
        let n = self.rows.len();
        if permut.len() != n {
            return Err(GameError::StateOutOfRange {
                state: permut.len(),
                num_states: n,
            });
        }
        let mut rows = vec![Vec::new(); n];
        for (s, row) in self.rows.iter().enumerate() {
            let target = permut[s];
            let slot = rows.get_mut(target).ok_or(GameError::StateOutOfRange {
                state: target,
                num_states: n,
            })?;
            *slot = row
                .iter()
                .map(|c| -> Result<ChoiceRow, GameError> {
                    Ok(ChoiceRow {
                        distribution: c.distribution.permuted(permut)?,
                        action: c.action.clone(),
                        reward: c.reward,
                    })
                })
                .collect::<Result<Vec<_>, GameError>>()?;
        }
        let initial = self.initial.iter().map(|&s| permut[s]).collect();
        Ok(Self { rows, initial })
    }

    fn check_state(&self, s: usize) -> Result<(), GameError> {
        if s < self.rows.len() {
            Ok(())
        } else {
            Err(GameError::StateOutOfRange {
                state: s,
                num_states: self.rows.len(),
            })
        }
    }

    fn row_mut(&mut self, s: usize, i: usize) -> Result<&mut ChoiceRow, GameError> {
        self.check_state(s)?;
        let row = &mut self.rows[s];
        let num_choices = row.len();
        row.get_mut(i).ok_or(GameError::ChoiceOutOfRange {
            state: s,
            choice: i,
            num_choices,
        })
    }

    /// Write the choices of state `s` as `[a:{0=0.5, 1=0.5},{1=1}]`.
    pub(crate) fn fmt_row(&self, s: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.rows[s].iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if let Some(a) = &c.action {
                write!(f, "{a}:")?;
            }
            write!(f, "{}", c.distribution)?;
        }
        write!(f, "]")
    }
}

impl Mdp for MdpExplicit {
    fn num_states(&self) -> usize {
        self.rows.len()
    }

    fn initial_states(&self) -> &[usize] {
        &self.initial
    }

    fn num_choices(&self, s: usize) -> usize {
        self.rows[s].len()
    }

    fn distribution(&self, s: usize, i: usize) -> &Distribution {
        &self.rows[s][i].distribution
    }

    fn action(&self, s: usize, i: usize) -> Option<&str> {
        self.rows[s][i].action.as_deref()
    }

    fn transition_reward(&self, s: usize, i: usize) -> f64 {
        self.rows[s][i].reward
    }
}

/// An MDP is a one-player game: every state belongs to player 1.
impl TurnBased for MdpExplicit {
    fn player(&self, _s: usize) -> usize {
        1
    }
}

impl fmt::Display for MdpExplicit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for s in 0..self.rows.len() {
            if s > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}: ")?;
            self.fmt_row(s, f)?;
        }
        write!(f, " ]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MinMax, RowFilter};
    use crate::state_set::StateSet;

    fn dist(pairs: &[(usize, f64)]) -> Distribution {
        Distribution::from_pairs(pairs.iter().copied()).unwrap()
    }

    /// s0 has choices to {s1: 0.4, s2: 0.6} and {s1: 0.9, s2: 0.1};
    /// s1 and s2 are absorbing.
    fn two_choice() -> MdpExplicit {
        let mut mdp = MdpExplicit::with_states(3);
        mdp.add_choice(0, dist(&[(1, 0.4), (2, 0.6)])).unwrap();
        mdp.add_choice(0, dist(&[(1, 0.9), (2, 0.1)])).unwrap();
        mdp.add_choice(1, Distribution::point(1)).unwrap();
        mdp.add_choice(2, Distribution::point(2)).unwrap();
        mdp.add_initial_state(0).unwrap();
        mdp
    }

    #[test]
    fn test_mv_mult_min_max_picks_min_row() {
        let mdp = two_choice();
        let v = [0.0, 1.0, 0.0];
        let mut result = vec![0.0; 3];
        mdp.mv_mult_min_max(&v, MinMax::Min, &mut result, RowFilter::All);
        assert!((result[0] - 0.4).abs() < 1e-12);
        mdp.mv_mult_min_max(&v, MinMax::Max, &mut result, RowFilter::All);
        assert!((result[0] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_filter_leaves_other_rows() {
        let mdp = two_choice();
        let only0 = StateSet::from_indices(3, [0]);
        let mut result = vec![7.0; 3];
        let v = [0.0, 1.0, 0.0];
        mdp.mv_mult_min_max(&v, MinMax::Min, &mut result, RowFilter::Except(&only0));
        assert_eq!(result[0], 7.0);
        assert_eq!(result[1], 1.0);
    }

    #[test]
    fn test_single_choices_returns_all_ties() {
        let mut mdp = two_choice();
        mdp.add_choice(0, dist(&[(1, 0.4), (2, 0.6)])).unwrap();
        let v = [0.0, 1.0, 0.0];
        let val = mdp.mv_mult_min_max_single(0, &v, MinMax::Min);
        assert_eq!(mdp.mv_mult_min_max_single_choices(0, &v, val), vec![0, 2]);
    }

    #[test]
    fn test_rewards() {
        let mut mdp = two_choice();
        mdp.set_transition_reward(0, 1, 2.0).unwrap();
        let v = [0.0, 1.0, 0.0];
        assert!((mdp.mv_mult_rew_single(0, 1, &v) - 2.9).abs() < 1e-12);
        assert!((mdp.mv_mult_rew_min_max_single(0, &v, MinMax::Max) - 2.9).abs() < 1e-12);
        assert!(mdp.set_transition_reward(0, 5, 1.0).is_err());
    }

    #[test]
    fn test_gauss_seidel_uses_fresh_values() {
        // s0 -> s1 -> s2, target s2
        let mut mdp = MdpExplicit::with_states(3);
        mdp.add_choice(0, Distribution::point(1)).unwrap();
        mdp.add_choice(1, Distribution::point(2)).unwrap();
        mdp.add_choice(2, Distribution::point(2)).unwrap();
        let target = StateSet::from_indices(3, [2]);
        let mut v = vec![0.0, 0.0, 1.0];
        let diff = mdp.mv_mult_gs_min_max(
            &mut v,
            MinMax::Max,
            RowFilter::Except(&target),
            crate::model::DiffMeasure::Absolute,
        );
        // s0 is visited before s1, so it still sees the old value of s1
        assert_eq!(v, vec![0.0, 1.0, 1.0]);
        assert_eq!(diff, 1.0);
    }

    #[test]
    fn test_prob0_prob1_steps() {
        let mdp = two_choice();
        let all = StateSet::full(3);
        let u = StateSet::from_indices(3, [1]);
        let mut r = StateSet::new(3);
        mdp.prob0_step(&all, &u, true, &mut r);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![0, 1]);

        let mut r1 = StateSet::new(3);
        mdp.prob1_step(&all, &all, &u, false, &mut r1);
        assert_eq!(r1.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_deadlocks_and_successor_check() {
        let mut mdp = MdpExplicit::with_states(2);
        mdp.add_choice(0, Distribution::point(5)).unwrap();
        assert_eq!(mdp.deadlocks(), vec![1]);
        assert!(matches!(
            mdp.check_successors(),
            Err(GameError::InvalidSuccessor { state: 0, successor: 5 })
        ));
        assert_eq!(mdp.fix_deadlocks(), vec![1]);
        assert!(mdp.deadlocks().is_empty());
    }

    #[test]
    fn test_permuted_and_display() {
        let mdp = two_choice();
        let p = mdp.permuted(&[2, 0, 1]).unwrap();
        assert_eq!(p.num_choices(2), 2);
        assert_eq!(p.initial_states(), &[2]);
        assert_eq!(p.distribution(2, 0).get(0), 0.4);
        let mut small = MdpExplicit::with_states(1);
        small
            .add_action_labelled_choice(0, Distribution::point(0), "a")
            .unwrap();
        assert_eq!(small.to_string(), "[ 0: [a:{0=1}] ]");
        assert_eq!(small.num_transitions_total(), 1);
    }
}
