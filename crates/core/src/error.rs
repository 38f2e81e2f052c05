//! # Error Types
//!
//! Failures while evaluating expressions, declaring variables, or decoding
//! strategy-operator options. Evaluation errors inside an update are model
//! errors and are wrapped with state context by the choice layer.

use thiserror::Error;

/// Core errors for values, expressions and quantifier descriptors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// An operand had the wrong type.
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// A variable index beyond the end of the state.
    #[error("Variable index {index} out of range (state has {count} variables)")]
    VariableOutOfRange { index: usize, count: usize },

    /// A primed variable was read where no next state is being built.
    #[error("Primed variable {variable}' read outside of an update")]
    PrimedReadWithoutNext { variable: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    Overflow,

    /// A value outside the declared domain of its variable.
    #[error("Value {value} out of range for variable {variable}")]
    ValueOutOfRange { variable: String, value: String },

    #[error("Variable {name} declared twice")]
    DuplicateDeclaration { name: String },

    /// An unrecognised `{...}` option on a strategy operator.
    #[error("Unknown option \"{option}\" for {operator} operator")]
    UnknownOption { option: String, operator: String },
}
