//! # Equilibria
//!
//! Non-zero-sum reachability: coalition `k` wants to reach `targets[k]`,
//! and the solver looks for a joint strategy whose payoff profile is an
//! equilibrium. Iteration works on one payoff vector per coalition, with
//! the same passes and convergence test as zero-sum value iteration; only
//! the per-state optimisation differs.
//!
//! In each state every choice yields a payoff profile (one entry per
//! coalition). The owner of the state restricts the candidate choices:
//!
//! - **Nash**: choices that maximise the owner's own payoff
//! - **Correlated**: choices that give the owner at least its secure
//!   (zero-sum) value; two-point mixtures of candidates are also allowed
//! - an owner in no coalition: every choice
//!
//! Candidates dominated by another candidate are dropped (Pareto filter),
//! and the criterion picks one of the rest:
//!
//! - **Social**: the largest sum of payoffs
//! - **Fair**: the smallest spread (max minus min), then the larger sum
//!
//! Remaining ties go to the lowest choice index.

use gamecheck_core::{EquilibriumCriterion, EquilibriumType};
use gamecheck_games::ops::doubles_close;
use gamecheck_games::{Mdp, MinMax, Smg, StateSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{IterMethod, SolverConfig};
use crate::error::SolverError;
use crate::query::Directions;
use crate::result::Termination;
use crate::value_iter::{self, check_choices, check_size, drive};

/// What the owner of a state plays in an equilibrium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EquilibriumChoice {
    Pure(usize),
    /// `first` with probability `weight`, otherwise `second`.
    Mixed {
        first: usize,
        second: usize,
        weight: f64,
    },
}

/// Payoffs of an equilibrium, one vector per coalition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResult {
    pub payoffs: Vec<Vec<f64>>,
    /// The joint strategy; `None` where every coalition has already won.
    pub choices: Vec<Option<EquilibriumChoice>>,
    pub iterations: usize,
    pub termination: Termination,
}

impl EquilibriumResult {
    pub fn payoff(&self, coalition: usize, s: usize) -> f64 {
        self.payoffs[coalition][s]
    }

    /// The payoff profile of state `s`.
    pub fn profile(&self, s: usize) -> Vec<f64> {
        self.payoffs.iter().map(|v| v[s]).collect()
    }

    pub fn require_converged(self) -> Result<Self, SolverError> {
        match self.termination {
            Termination::Converged => Ok(self),
            Termination::IterationCap { last_diff } | Termination::TimeBudget { last_diff } => {
                Err(SolverError::NotConverged {
                    iterations: self.iterations,
                    last_diff,
                })
            }
        }
    }
}

// ============================================================================
// Profiles
// ============================================================================

fn sum(p: &[f64]) -> f64 {
    p.iter().sum()
}

fn spread(p: &[f64]) -> f64 {
    let max = p.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = p.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

/// Is `a` at least as good as `b` everywhere and better somewhere?
fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly = false;
    for (&x, &y) in a.iter().zip(b) {
        if doubles_close(x, y) {
            continue;
        }
        if x < y {
            return false;
        }
        strictly = true;
    }
    strictly
}

/// Indices of `candidates` whose profiles no other candidate dominates.
fn pareto(candidates: &[usize], profiles: &[Vec<f64>]) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| {
            !candidates
                .iter()
                .any(|&j| j != i && dominates(&profiles[j], &profiles[i]))
        })
        .collect()
}

/// The most even mixture of two profiles strictly between them, as
/// `(weight on a, profile)`.
fn fairest_mixture(a: &[f64], b: &[f64]) -> Option<(f64, Vec<f64>)> {
    let mix = |w: f64| -> Vec<f64> {
        a.iter().zip(b).map(|(x, y)| w * x + (1.0 - w) * y).collect()
    };
    let mut best: Option<(f64, Vec<f64>)> = None;
    for c in 0..a.len() {
        for d in (c + 1)..a.len() {
            // where the gap between coalitions c and d closes
            let gap_a = a[c] - a[d];
            let gap_b = b[c] - b[d];
            let denom = gap_b - gap_a;
            if denom == 0.0 {
                continue;
            }
            let w = gap_b / denom;
            if !(w > 0.0 && w < 1.0) {
                continue;
            }
            let p = mix(w);
            let better = match &best {
                None => true,
                Some((_, q)) => fair_better(&p, q),
            };
            if better {
                best = Some((w, p));
            }
        }
    }
    best
}

fn social_better(p: &[f64], q: &[f64]) -> bool {
    let (sp, sq) = (sum(p), sum(q));
    !doubles_close(sp, sq) && sp > sq
}

fn fair_better(p: &[f64], q: &[f64]) -> bool {
    let (dp, dq) = (spread(p), spread(q));
    if !doubles_close(dp, dq) {
        return dp < dq;
    }
    social_better(p, q)
}

// ============================================================================
// Per-state selection
// ============================================================================

/// Everything a state's selection needs besides the choice profiles.
struct Selector<'a> {
    kind: EquilibriumType,
    criterion: EquilibriumCriterion,
    /// Secure values per coalition (correlated equilibria only).
    secure: &'a [Vec<f64>],
    slack: f64,
}

impl Selector<'_> {
    fn candidates(&self, s: usize, owner: Option<usize>, profiles: &[Vec<f64>]) -> Vec<usize> {
        let all: Vec<usize> = (0..profiles.len()).collect();
        let Some(k) = owner else {
            return all;
        };
        let best = profiles
            .iter()
            .map(|p| p[k])
            .fold(f64::NEG_INFINITY, f64::max);
        let nash: Vec<usize> = all
            .iter()
            .copied()
            .filter(|&i| doubles_close(profiles[i][k], best))
            .collect();
        match self.kind {
            EquilibriumType::Nash => nash,
            EquilibriumType::Correlated => {
                let secure = self.secure[k][s];
                let ok: Vec<usize> = all
                    .into_iter()
                    .filter(|&i| profiles[i][k] + self.slack >= secure)
                    .collect();
                if ok.is_empty() {
                    nash
                } else {
                    ok
                }
            }
        }
    }

    fn select(
        &self,
        s: usize,
        owner: Option<usize>,
        profiles: &[Vec<f64>],
    ) -> (EquilibriumChoice, Vec<f64>) {
        let candidates = self.candidates(s, owner, profiles);
        let mut valid = pareto(&candidates, profiles);
        if valid.is_empty() {
            valid = candidates;
        }
        let better = |p: &[f64], q: &[f64]| match self.criterion {
            EquilibriumCriterion::Social => social_better(p, q),
            EquilibriumCriterion::Fair => fair_better(p, q),
        };

        let mut best_choice = EquilibriumChoice::Pure(valid[0]);
        let mut best = profiles[valid[0]].clone();
        for &i in &valid[1..] {
            if better(&profiles[i], &best) {
                best_choice = EquilibriumChoice::Pure(i);
                best = profiles[i].clone();
            }
        }

        // mixing two candidates can only help evenness, never the sum
        let mixes = self.kind == EquilibriumType::Correlated
            && self.criterion == EquilibriumCriterion::Fair;
        if mixes {
            for (n, &a) in valid.iter().enumerate() {
                for &b in &valid[n + 1..] {
                    if let Some((weight, p)) = fairest_mixture(&profiles[a], &profiles[b]) {
                        if better(&p, &best) {
                            best_choice = EquilibriumChoice::Mixed {
                                first: a,
                                second: b,
                                weight,
                            };
                            best = p;
                        }
                    }
                }
            }
        }
        (best_choice, best)
    }
}

// ============================================================================
// Solving
// ============================================================================

/// Coalition index of every raw owner that belongs to one.
fn owner_coalitions(
    game: &Smg,
    coalitions: &[Vec<usize>],
) -> Result<Vec<Option<usize>>, SolverError> {
    for (k, members) in coalitions.iter().enumerate() {
        for (l, other) in coalitions.iter().enumerate().skip(k + 1) {
            if let Some(p) = members.iter().find(|&p| other.contains(p)) {
                return Err(SolverError::InvalidQuery {
                    reason: format!("player {p} is in coalitions {k} and {l}"),
                });
            }
        }
    }
    Ok(game
        .owners()
        .iter()
        .map(|o| coalitions.iter().position(|members| members.contains(o)))
        .collect())
}

/// Zero-sum value of each coalition reaching its own target against
/// everybody else.
fn secure_values(
    game: &Smg,
    coalitions: &[Vec<usize>],
    targets: &[StateSet],
    config: &SolverConfig,
) -> Result<Vec<Vec<f64>>, SolverError> {
    let config = config.clone().with_strategy(false);
    coalitions
        .iter()
        .zip(targets)
        .map(|(members, target)| {
            let dirs = Directions::new(
                game.owners()
                    .iter()
                    .map(|o| MinMax::from_min(!members.contains(o)))
                    .collect(),
            );
            Ok(value_iter::reach_prob(game, None, target, &dirs, &config)?.values)
        })
        .collect()
}

/// Joint-strategy value iteration for reachability equilibria.
pub fn solve(
    game: &Smg,
    coalitions: &[Vec<usize>],
    targets: &[StateSet],
    kind: EquilibriumType,
    criterion: EquilibriumCriterion,
    config: &SolverConfig,
) -> Result<EquilibriumResult, SolverError> {
    config.validate()?;
    if coalitions.is_empty() || coalitions.len() != targets.len() {
        return Err(SolverError::InvalidQuery {
            reason: format!(
                "{} coalitions need as many targets, got {}",
                coalitions.len(),
                targets.len()
            ),
        });
    }
    let n = game.num_states();
    for target in targets {
        check_size(n, target)?;
    }
    let owners = owner_coalitions(game, coalitions)?;

    // states where some coalition has yet to win
    let mut done = StateSet::full(n);
    for target in targets {
        done.intersect_with(target);
    }
    let open = done.complement();
    check_choices(game, &open)?;

    let secure = match kind {
        EquilibriumType::Correlated => secure_values(game, coalitions, targets, config)?,
        EquilibriumType::Nash => Vec::new(),
    };
    let selector = Selector {
        kind,
        criterion,
        secure: &secure,
        slack: config.epsilon,
    };
    debug!(
        "Starting {:?}/{:?} equilibrium iteration for {} coalitions on {} states",
        kind,
        criterion,
        coalitions.len(),
        open.count()
    );

    let mut payoffs: Vec<Vec<f64>> = targets
        .iter()
        .map(|t| (0..n).map(|s| if t.contains(s) { 1.0 } else { 0.0 }).collect())
        .collect();
    let mut choices: Vec<Option<EquilibriumChoice>> = vec![None; n];
    let measure = config.termination;
    let in_place = config.method == IterMethod::GaussSeidel;

    let (iterations, termination) = drive(config, || {
        let mut next = if in_place { Vec::new() } else { payoffs.clone() };
        let mut max_diff: f64 = 0.0;
        for s in open.iter() {
            let profiles: Vec<Vec<f64>> = (0..game.num_choices(s))
                .map(|i| {
                    payoffs
                        .iter()
                        .zip(targets)
                        .map(|(v, t)| {
                            if t.contains(s) {
                                1.0
                            } else {
                                game.mv_mult_jac_single(s, i, v)
                            }
                        })
                        .collect()
                })
                .collect();
            let (choice, profile) = selector.select(s, owners[s], &profiles);
            choices[s] = Some(choice);
            let out = if in_place { &mut payoffs } else { &mut next };
            for (k, value) in profile.into_iter().enumerate() {
                max_diff = max_diff.max(measure.diff(out[k][s], value));
                out[k][s] = value;
            }
        }
        if !in_place {
            payoffs = next;
        }
        max_diff
    });

    Ok(EquilibriumResult {
        payoffs,
        choices,
        iterations,
        termination,
    })
}
