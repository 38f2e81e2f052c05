//! # Value Iteration
//!
//! Numeric solution of reachability probabilities and expected rewards on
//! any [`Mdp`]. The optimisation direction is given per state, so the same
//! entry points solve MDPs (`MinMax::Max` everywhere) and turn-based games
//! (directions from [`TurnBased::by_player`](gamecheck_games::TurnBased)).
//!
//! ```text
//!   validate ─► precompute yes/no ─► iterate unknown rows ─► strategy
//!                  (prob0/prob1)       (Jacobi | Gauss-Seidel)
//! ```
//!
//! Both schemes iterate the Jacobi-normalised Bellman operator, where a
//! choice's self-loop mass is divided out. Jacobi passes read only the
//! previous vector (and may run across the rayon pool); Gauss-Seidel passes
//! update in place and read values written earlier in the same pass.
//! Iteration stops on convergence, on `max_iters`, or on the time budget,
//! and the result says which.

use gamecheck_games::{DiffMeasure, Mdp, MinMax, PerState, RowFilter, StateSet};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{IterMethod, SolverConfig};
use crate::error::SolverError;
use crate::precomp::{prob0, prob1, Quantifier};
use crate::result::{SolveResult, Termination};
use crate::strategy;

// ============================================================================
// Validation
// ============================================================================

pub(crate) fn check_size(num_states: usize, set: &StateSet) -> Result<(), SolverError> {
    if set.universe() != num_states {
        return Err(SolverError::SizeMismatch {
            expected: num_states,
            actual: set.universe(),
        });
    }
    Ok(())
}

/// Every state in `rows` must have a choice.
pub(crate) fn check_choices<M: Mdp>(model: &M, rows: &StateSet) -> Result<(), SolverError> {
    match rows.iter().find(|&s| model.num_choices(s) == 0) {
        Some(state) => Err(SolverError::EmptyChoiceList { state }),
        None => Ok(()),
    }
}

/// States outside `target` (and inside `remain`, if given).
pub(crate) fn open_states(n: usize, remain: Option<&StateSet>, target: &StateSet) -> StateSet {
    let mut open = remain.cloned().unwrap_or_else(|| StateSet::full(n));
    open.difference_with(target);
    open
}

// ============================================================================
// Passes
// ============================================================================

/// Which Bellman operator a pass applies.
#[derive(Debug, Clone, Copy)]
enum Kernel {
    Prob,
    Reward,
}

impl Kernel {
    fn row<M: Mdp, D: PerState<MinMax>>(self, model: &M, s: usize, vect: &[f64], dir: &D) -> f64 {
        match self {
            Kernel::Prob => model.mv_mult_jac_min_max_single(s, vect, dir),
            Kernel::Reward => model.mv_mult_rew_jac_min_max_single(s, vect, dir),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn jacobi_pass<M, D>(
    model: &M,
    kernel: Kernel,
    values: &[f64],
    next: &mut [f64],
    dir: &D,
    rows: &StateSet,
    measure: DiffMeasure,
    parallel: bool,
) -> f64
where
    M: Mdp + Sync,
    D: PerState<MinMax> + Sync,
{
    let update = |(s, slot): (usize, &mut f64)| -> f64 {
        if !rows.contains(s) {
            return 0.0;
        }
        let new = kernel.row(model, s, values, dir);
        *slot = new;
        measure.diff(values[s], new)
    };
    if parallel {
        next.par_iter_mut().enumerate().map(&update).reduce(|| 0.0, f64::max)
    } else {
        next.iter_mut().enumerate().map(&update).fold(0.0, f64::max)
    }
}

fn gauss_seidel_pass<M, D>(
    model: &M,
    kernel: Kernel,
    values: &mut [f64],
    dir: &D,
    rows: &StateSet,
    measure: DiffMeasure,
) -> f64
where
    M: Mdp,
    D: PerState<MinMax>,
{
    match kernel {
        Kernel::Prob => model.mv_mult_gs_min_max(values, dir, RowFilter::Only(rows), measure),
        Kernel::Reward => {
            model.mv_mult_rew_gs_min_max(values, dir, RowFilter::Only(rows), measure)
        }
    }
}

/// Run passes until convergence, the iteration cap or the time budget.
pub(crate) fn drive(
    config: &SolverConfig,
    mut pass: impl FnMut() -> f64,
) -> (usize, Termination) {
    let started = Instant::now();
    let budget = config.time_budget();
    let mut iters = 0;
    loop {
        let last_diff = pass();
        iters += 1;
        if last_diff < config.epsilon {
            info!("Value iteration converged after {} iterations", iters);
            return (iters, Termination::Converged);
        }
        if iters >= config.max_iters {
            warn!(
                "Iteration cap of {} reached without convergence (last change {:e})",
                config.max_iters, last_diff
            );
            return (iters, Termination::IterationCap { last_diff });
        }
        if let Some(budget) = budget {
            if started.elapsed() >= budget {
                warn!(
                    "Time budget of {:?} exhausted after {} iterations (last change {:e})",
                    budget, iters, last_diff
                );
                return (iters, Termination::TimeBudget { last_diff });
            }
        }
    }
}

/// Iterate `kernel` over `rows` of `values` as the configuration says.
fn iterate<M, D>(
    model: &M,
    kernel: Kernel,
    values: &mut Vec<f64>,
    dir: &D,
    rows: &StateSet,
    config: &SolverConfig,
) -> (usize, Termination)
where
    M: Mdp + Sync,
    D: PerState<MinMax> + Sync,
{
    if rows.is_empty() {
        debug!("No states left to iterate");
        return (0, Termination::Converged);
    }
    debug!(
        "Starting {:?} value iteration on {} of {} states",
        config.method,
        rows.count(),
        values.len()
    );
    let (measure, parallel) = (config.termination, config.parallel);
    match config.method {
        IterMethod::Jacobi => {
            let mut next = values.clone();
            drive(config, || {
                let diff =
                    jacobi_pass(model, kernel, values, &mut next, dir, rows, measure, parallel);
                std::mem::swap(values, &mut next);
                diff
            })
        }
        IterMethod::GaussSeidel => drive(config, || {
            gauss_seidel_pass(model, kernel, values, dir, rows, measure)
        }),
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Optimal probability of `remain U target` (plain reachability when
/// `remain` is `None`).
///
/// # Example
///
/// ```rust
/// use gamecheck_games::{MdpExplicit, MinMax, StateSet};
/// use gamecheck_prob::Distribution;
/// use gamecheck_solver::{reach_prob, SolverConfig};
///
/// // 0: retry (stay w.p. 0.5, else reach 1) or give up (go to 2)
/// let mut mdp = MdpExplicit::with_states(3);
/// mdp.add_choice(0, Distribution::from_pairs([(0, 0.5), (1, 0.5)]).unwrap()).unwrap();
/// mdp.add_choice(0, Distribution::point(2)).unwrap();
/// mdp.add_choice(1, Distribution::point(1)).unwrap();
/// mdp.add_choice(2, Distribution::point(2)).unwrap();
///
/// let target = StateSet::from_indices(3, [1]);
/// let config = SolverConfig::default();
/// let max = reach_prob(&mdp, None, &target, MinMax::Max, &config).unwrap();
/// let min = reach_prob(&mdp, None, &target, MinMax::Min, &config).unwrap();
/// assert_eq!(max.values, vec![1.0, 1.0, 0.0]);
/// assert_eq!(min.values, vec![0.0, 1.0, 0.0]);
/// ```
pub fn reach_prob<M, D>(
    model: &M,
    remain: Option<&StateSet>,
    target: &StateSet,
    dir: D,
    config: &SolverConfig,
) -> Result<SolveResult, SolverError>
where
    M: Mdp + Sync,
    D: PerState<MinMax> + Sync,
{
    config.validate()?;
    let n = model.num_states();
    check_size(n, target)?;
    if let Some(remain) = remain {
        check_size(n, remain)?;
    }
    check_choices(model, &open_states(n, remain, target))?;

    let (yes, no) = if config.precomputation {
        let yes = prob1(model, remain, target, Quantifier::reach(&dir));
        let no = prob0(model, remain, target, Quantifier::reach(&dir));
        (yes, no)
    } else {
        let no = match remain {
            Some(remain) => {
                let mut live = remain.clone();
                live.union_with(target);
                live.complement()
            }
            None => StateSet::new(n),
        };
        (target.clone(), no)
    };
    let mut unknown = yes.clone();
    unknown.union_with(&no);
    let unknown = unknown.complement();
    debug!(
        "Reachability: {} yes, {} no, {} unknown",
        yes.count(),
        no.count(),
        unknown.count()
    );

    let mut values: Vec<f64> = (0..n).map(|s| if yes.contains(s) { 1.0 } else { 0.0 }).collect();
    let (iterations, termination) =
        iterate(model, Kernel::Prob, &mut values, &dir, &unknown, config);

    let strategy = config.extract_strategy.then(|| {
        let rows = open_states(n, remain, target);
        strategy::extract_prob(model, &values, &dir, &rows, target)
    });
    Ok(SolveResult {
        values,
        iterations,
        termination,
        strategy,
    })
}

/// Optimal probability of reaching `target` (through `remain`) within `k`
/// steps. Runs exactly `k` Jacobi passes of the plain Bellman operator.
pub fn bounded_reach_prob<M, D>(
    model: &M,
    remain: Option<&StateSet>,
    target: &StateSet,
    k: usize,
    dir: D,
) -> Result<SolveResult, SolverError>
where
    M: Mdp,
    D: PerState<MinMax>,
{
    let n = model.num_states();
    check_size(n, target)?;
    if let Some(remain) = remain {
        check_size(n, remain)?;
    }
    let open = open_states(n, remain, target);
    check_choices(model, &open)?;

    let mut values: Vec<f64> = (0..n).map(|s| if target.contains(s) { 1.0 } else { 0.0 }).collect();
    let mut next = values.clone();
    for _ in 0..k {
        model.mv_mult_min_max(&values, &dir, &mut next, RowFilter::Only(&open));
        std::mem::swap(&mut values, &mut next);
    }
    debug!("Bounded reachability: {} steps over {} states", k, open.count());
    Ok(SolveResult {
        values,
        iterations: k,
        termination: Termination::Converged,
        strategy: None,
    })
}

/// Optimal expected transition reward accumulated until `target`.
///
/// A state from which the reward minimiser cannot force reaching the target
/// with probability 1 is worth infinity.
pub fn reach_reward<M, D>(
    model: &M,
    target: &StateSet,
    dir: D,
    config: &SolverConfig,
) -> Result<SolveResult, SolverError>
where
    M: Mdp + Sync,
    D: PerState<MinMax> + Sync,
{
    config.validate()?;
    let n = model.num_states();
    check_size(n, target)?;
    check_choices(model, &open_states(n, None, target))?;

    let finite = prob1(model, None, target, Quantifier::reach_for_min(&dir));
    let mut unknown = finite.clone();
    unknown.difference_with(target);
    debug!(
        "Expected reward: {} infinite, {} unknown",
        n - finite.count(),
        unknown.count()
    );

    let mut values: Vec<f64> = (0..n)
        .map(|s| if finite.contains(s) { 0.0 } else { f64::INFINITY })
        .collect();
    let (iterations, termination) =
        iterate(model, Kernel::Reward, &mut values, &dir, &unknown, config);

    let strategy = config
        .extract_strategy
        .then(|| strategy::extract_reward(model, &values, &dir, &unknown, target));
    Ok(SolveResult {
        values,
        iterations,
        termination,
        strategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamecheck_games::MdpExplicit;
    use gamecheck_prob::Distribution;

    /// 0 -> {0: 0.5, 1: 0.25, 2: 0.25}; 1 target; 2 sink.
    fn leaky() -> MdpExplicit {
        let mut mdp = MdpExplicit::with_states(3);
        mdp.add_choice(0, Distribution::from_pairs([(0, 0.5), (1, 0.25), (2, 0.25)]).unwrap())
            .unwrap();
        mdp.add_choice(1, Distribution::point(1)).unwrap();
        mdp.add_choice(2, Distribution::point(2)).unwrap();
        mdp
    }

    #[test]
    fn test_jacobi_form_solves_self_loops_in_one_pass() {
        let target = StateSet::from_indices(3, [1]);
        for method in [IterMethod::Jacobi, IterMethod::GaussSeidel] {
            let config = SolverConfig::new().with_method(method);
            let r = reach_prob(&leaky(), None, &target, MinMax::Max, &config).unwrap();
            assert!((r.values[0] - 0.5).abs() < 1e-12);
            assert!(r.is_converged());
            assert!(r.iterations <= 2);
        }
    }

    #[test]
    fn test_without_precomputation() {
        let target = StateSet::from_indices(3, [1]);
        let config = SolverConfig::new().with_precomputation(false);
        let r = reach_prob(&leaky(), None, &target, MinMax::Min, &config).unwrap();
        assert!((r.values[0] - 0.5).abs() < 1e-9);
        assert_eq!(r.values[2], 0.0);
    }

    #[test]
    fn test_bounded() {
        let mut chain = MdpExplicit::with_states(3);
        chain.add_choice(0, Distribution::point(1)).unwrap();
        chain.add_choice(1, Distribution::point(2)).unwrap();
        chain.add_choice(2, Distribution::point(2)).unwrap();
        let target = StateSet::from_indices(3, [2]);
        let one = bounded_reach_prob(&chain, None, &target, 1, MinMax::Max).unwrap();
        assert_eq!(one.values, vec![0.0, 1.0, 1.0]);
        let two = bounded_reach_prob(&chain, None, &target, 2, MinMax::Max).unwrap();
        assert_eq!(two.values, vec![1.0, 1.0, 1.0]);
        assert_eq!(two.iterations, 2);
    }

    #[test]
    fn test_reward_until_target() {
        // 0 -> {0: 0.5, 1: 0.5} with reward 1: expected 2
        let mut mdp = MdpExplicit::with_states(3);
        mdp.add_choice(0, Distribution::from_pairs([(0, 0.5), (1, 0.5)]).unwrap())
            .unwrap();
        mdp.set_transition_reward(0, 0, 1.0).unwrap();
        mdp.add_choice(0, Distribution::point(2)).unwrap();
        mdp.add_choice(1, Distribution::point(1)).unwrap();
        mdp.add_choice(2, Distribution::point(2)).unwrap();
        let target = StateSet::from_indices(3, [1]);
        let config = SolverConfig::new().with_strategy(true);

        let min = reach_reward(&mdp, &target, MinMax::Min, &config).unwrap();
        assert!((min.values[0] - 2.0).abs() < 1e-9);
        assert_eq!(min.values[1], 0.0);
        assert_eq!(min.values[2], f64::INFINITY);
        assert_eq!(min.strategy.unwrap().choice(0), Some(0));

        // the maximiser escapes to the sink
        let max = reach_reward(&mdp, &target, MinMax::Max, &config).unwrap();
        assert_eq!(max.values[0], f64::INFINITY);
    }

    #[test]
    fn test_size_and_deadlock_checks() {
        let config = SolverConfig::default();
        let wrong = StateSet::from_indices(4, [1]);
        assert_eq!(
            reach_prob(&leaky(), None, &wrong, MinMax::Max, &config).unwrap_err(),
            SolverError::SizeMismatch {
                expected: 3,
                actual: 4
            }
        );

        let mut mdp = leaky();
        mdp.add_states(1);
        let target = StateSet::from_indices(4, [1]);
        assert_eq!(
            reach_prob(&mdp, None, &target, MinMax::Max, &config).unwrap_err(),
            SolverError::EmptyChoiceList { state: 3 }
        );
    }
}
