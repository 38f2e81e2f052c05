//! Error types for solving.

use gamecheck_core::CoreError;
use gamecheck_games::GameError;
use thiserror::Error;

/// Errors raised by the solver.
///
/// Non-convergence is not an error by itself: solvers report it through
/// [`Termination`](crate::Termination), and [`NotConverged`](Self::NotConverged)
/// only appears when a caller asks for a converged result.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolverError {
    /// A configuration rejected before any iteration started.
    #[error("Invalid solver configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A query that cannot be answered on this model.
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// A state set or vector sized for a different model.
    #[error("Size mismatch: model has {expected} states, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A state that must be solved has no choices. The model is malformed.
    #[error("State {state} has no choices")]
    EmptyChoiceList { state: usize },

    #[error("No convergence after {iterations} iterations (last change {last_diff})")]
    NotConverged { iterations: usize, last_diff: f64 },

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
