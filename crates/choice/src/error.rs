//! Error types for choice construction and target computation.
//!
//! Everything here except [`ChoiceError::ElementOutOfRange`] is a
//! model-definition error: the model asks for something impossible, and the
//! message carries enough context (state, variable) to show to the user.

use gamecheck_core::CoreError;
use gamecheck_prob::ProbError;
use thiserror::Error;

/// Errors raised while building choices or computing their target states.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChoiceError {
    /// Two updates of one transition assign the same variable.
    #[error("Multiple updates of variable {variable} in state {state}")]
    MultipleUpdates { variable: String, state: String },

    /// Primed reads within one transition form a cycle.
    #[error("Cyclic updates with variables {{{}}} in state {state}", .variables.join(", "))]
    CyclicUpdates {
        variables: Vec<String>,
        state: String,
    },

    /// A single update assigns the same variable twice.
    #[error("Variable {variable} assigned twice in one update")]
    DuplicateVariable { variable: String },

    /// An update produced a value outside its variable's domain.
    #[error("Variable {variable} would take value {value} (out of range) in state {state}")]
    OutOfRange {
        variable: String,
        value: String,
        state: String,
    },

    /// Evaluating an update expression failed.
    #[error("Error evaluating update in state {state}: {source}")]
    Evaluation {
        state: String,
        #[source]
        source: CoreError,
    },

    /// A module/action encoding of zero.
    #[error("Invalid module/action index {index} (must be non-zero)")]
    InvalidModuleOrAction { index: i32 },

    #[error("Choice has no module/action index")]
    MissingModuleOrAction,

    #[error("Element {index} out of range (choice has {size} elements)")]
    ElementOutOfRange { index: usize, size: usize },

    /// A sampling point outside `[0, probabilitySum)`.
    #[error("Sampling point {x} outside the choice's probability range")]
    SampleOutOfRange { x: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Prob(#[from] ProbError),
}
