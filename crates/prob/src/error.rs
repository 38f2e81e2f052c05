//! Error types for probability operations.

use thiserror::Error;

/// Errors that can occur in probability computations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProbError {
    /// Distribution doesn't sum to 1.
    #[error("Distribution not normalized: sum = {sum} (expected 1.0)")]
    NotNormalized { sum: f64 },

    /// Negative probability encountered.
    #[error("Negative probability encountered")]
    NegativeProbability,

    /// NaN or infinite probability.
    #[error("Non-finite probability {value}")]
    NonFinite { value: f64 },

    /// Empty distribution.
    #[error("Distribution cannot be empty")]
    EmptyDistribution,

    #[error("Division by zero")]
    DivisionByZero,

    /// Index out of bounds.
    #[error("Index {index} out of bounds for size {size}")]
    IndexOutOfBounds { index: usize, size: usize },
}
