//! # Prob - Evaluators and Distributions
//!
//! Numeric plumbing shared by the choice layer and the game models:
//!
//! - **Evaluators**: pluggable arithmetic over probability/rate values, in
//!   floating-point ([`FloatEvaluator`]) or exact rational
//!   ([`ExactEvaluator`]) mode
//! - **Distributions**: sparse successor → probability maps, one per choice
//!   of a state in an explicit model
//!
//! ## Example
//!
//! ```rust
//! use gamecheck_prob::{Evaluator, ExactEvaluator};
//!
//! let e = ExactEvaluator;
//! let third = e.from_ratio(1, 3).unwrap();
//! let sum = e.sum(&[third.clone(), third.clone(), third]);
//! assert_eq!(sum, e.one());
//! ```

mod distribution;
mod error;
pub mod evaluator;

pub use distribution::Distribution;
pub use error::ProbError;
pub use evaluator::{Evaluator, ExactEvaluator, FloatEvaluator};

/// Tolerance for probability comparisons.
pub const PROB_TOLERANCE: f64 = 1e-9;
