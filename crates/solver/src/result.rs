//! Solve results and how an iteration ended.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SolverError;
use crate::strategy::Strategy;

/// Why value iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Termination {
    /// The largest change fell below epsilon.
    Converged,
    /// `max_iters` passes ran without converging.
    IterationCap { last_diff: f64 },
    /// The wall-clock budget ran out between passes.
    TimeBudget { last_diff: f64 },
}

impl Termination {
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Converged)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::IterationCap { last_diff } => {
                write!(f, "iteration cap reached (last change {last_diff:e})")
            }
            Termination::TimeBudget { last_diff } => {
                write!(f, "time budget exhausted (last change {last_diff:e})")
            }
        }
    }
}

/// Per-state values of a numeric solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub values: Vec<f64>,
    /// Passes performed (0 when precomputation decided every state).
    pub iterations: usize,
    pub termination: Termination,
    /// Optimal choices, when requested in the configuration.
    pub strategy: Option<Strategy>,
}

impl SolveResult {
    pub fn value(&self, s: usize) -> f64 {
        self.values[s]
    }

    pub fn is_converged(&self) -> bool {
        self.termination.is_converged()
    }

    /// The result if it converged, otherwise [`SolverError::NotConverged`].
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

#[cfg(test)]
mod tests {
    use super::*;

    fn result(termination: Termination) -> SolveResult {
        SolveResult {
            values: vec![0.5],
            iterations: 7,
            termination,
            strategy: None,
        }
    }

    #[test]
    fn test_require_converged() {
        assert!(result(Termination::Converged).require_converged().is_ok());
        let err = result(Termination::IterationCap { last_diff: 0.25 })
            .require_converged()
            .unwrap_err();
        assert_eq!(
            err,
            SolverError::NotConverged {
                iterations: 7,
                last_diff: 0.25
            }
        );
    }

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::Converged.to_string(), "converged");
        assert_eq!(
            Termination::TimeBudget { last_diff: 0.5 }.to_string(),
            "time budget exhausted (last change 5e-1)"
        );
    }
}
