//! Error types for game models and exploration.

use gamecheck_choice::ChoiceError;
use gamecheck_core::CoreError;
use gamecheck_prob::ProbError;
use thiserror::Error;

/// Errors that can occur while building or configuring a game model.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GameError {
    /// A coalition member that is neither a player name nor an integer id.
    #[error("Player {player} is not present in the model")]
    UnknownPlayer { player: String },

    /// A two-player game state assigned to a player other than 1 or 2.
    #[error("Invalid player {player} (two-player games use players 1 and 2)")]
    InvalidPlayer { player: usize },

    /// State index out of bounds.
    #[error("State {state} out of range (model has {num_states} states)")]
    StateOutOfRange { state: usize, num_states: usize },

    /// Choice index out of bounds.
    #[error("Choice {choice} of state {state} out of range ({num_choices} choices)")]
    ChoiceOutOfRange {
        state: usize,
        choice: usize,
        num_choices: usize,
    },

    /// A transition to a state that does not exist.
    #[error("Transition from state {state} to unknown state {successor}")]
    InvalidSuccessor { state: usize, successor: usize },

    /// A reachable state with no enabled choice.
    #[error("Deadlock in state {state}")]
    Deadlock { state: String },

    /// Exploration exceeded its state budget.
    #[error("State space exceeds the limit of {limit} states")]
    StateSpaceLimit { limit: usize },

    /// Clock-guarded choices need real-time semantics.
    #[error("Choice in state {state} has a clock guard (real-time models are not supported)")]
    UnsupportedClockGuard { state: String },

    /// Distribution errors (e.g. a choice that does not sum to one).
    #[error("Probability error in state {state}: {source}")]
    BadDistribution {
        state: String,
        #[source]
        source: ProbError,
    },

    #[error(transparent)]
    Choice(#[from] ChoiceError),

    #[error(transparent)]
    Prob(#[from] ProbError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
