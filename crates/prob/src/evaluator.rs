//! # Numeric Evaluators
//!
//! Probabilities and rates attached to choices are opaque to everything but
//! an [`Evaluator`]. The choice layer only ever asks an evaluator to combine
//! or compare them, so the same composition code runs in floating-point mode
//! ([`FloatEvaluator`]) and in exact rational mode ([`ExactEvaluator`]).
//!
//! | Mode | Value type | Associative `multiply` |
//! |------|------------|------------------------|
//! | float | `f64` | up to rounding |
//! | exact | `BigRational` | yes |

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

use crate::error::ProbError;

/// Arithmetic over probability/rate values.
pub trait Evaluator: Clone + Send + Sync {
    /// The value type this evaluator operates on.
    type Value: Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync;

    fn zero(&self) -> Self::Value;

    fn one(&self) -> Self::Value;

    fn add(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn subtract(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn multiply(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn divide(&self, a: &Self::Value, b: &Self::Value) -> Result<Self::Value, ProbError>;

    fn is_zero(&self, a: &Self::Value) -> bool;

    /// `a >= b`
    fn geq(&self, a: &Self::Value, b: &Self::Value) -> bool;

    /// `a > b`
    fn gt(&self, a: &Self::Value, b: &Self::Value) -> bool {
        self.geq(a, b) && a != b
    }

    /// Convert from a double. Exact evaluators convert the double's exact
    /// binary value; non-finite input is rejected.
    fn from_f64(&self, x: f64) -> Result<Self::Value, ProbError>;

    /// Build `num / den`.
    fn from_ratio(&self, num: i64, den: i64) -> Result<Self::Value, ProbError>;

    /// Nearest double (the explicit game model stores doubles).
    fn to_f64(&self, a: &Self::Value) -> f64;

    /// Does this evaluator compute exactly?
    fn exact(&self) -> bool;

    /// Sum of a sequence of values, starting from zero.
    fn sum<'a, I>(&self, values: I) -> Self::Value
    where
        I: IntoIterator<Item = &'a Self::Value>,
        Self::Value: 'a,
    {
        values
            .into_iter()
            .fold(self.zero(), |acc, v| self.add(&acc, v))
    }
}

// ============================================================================
// Floating point
// ============================================================================

/// Double-precision evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatEvaluator;

impl Evaluator for FloatEvaluator {
    type Value = f64;

    fn zero(&self) -> f64 {
        0.0
    }

    fn one(&self) -> f64 {
        1.0
    }

    fn add(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn subtract(&self, a: &f64, b: &f64) -> f64 {
        a - b
    }

    fn multiply(&self, a: &f64, b: &f64) -> f64 {
        a * b
    }

    fn divide(&self, a: &f64, b: &f64) -> Result<f64, ProbError> {
        if *b == 0.0 {
            return Err(ProbError::DivisionByZero);
        }
        Ok(a / b)
    }

    fn is_zero(&self, a: &f64) -> bool {
        *a == 0.0
    }

    fn geq(&self, a: &f64, b: &f64) -> bool {
        a >= b
    }

    fn gt(&self, a: &f64, b: &f64) -> bool {
        a > b
    }

    fn from_f64(&self, x: f64) -> Result<f64, ProbError> {
        if !x.is_finite() {
            return Err(ProbError::NonFinite { value: x });
        }
        Ok(x)
    }

    fn from_ratio(&self, num: i64, den: i64) -> Result<f64, ProbError> {
        if den == 0 {
            return Err(ProbError::DivisionByZero);
        }
        Ok(num as f64 / den as f64)
    }

    fn to_f64(&self, a: &f64) -> f64 {
        *a
    }

    fn exact(&self) -> bool {
        false
    }
}

// ============================================================================
// Exact rationals
// ============================================================================

/// Arbitrary-precision rational evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEvaluator;

impl Evaluator for ExactEvaluator {
    type Value = BigRational;

    fn zero(&self) -> BigRational {
        BigRational::zero()
    }

    fn one(&self) -> BigRational {
        BigRational::one()
    }

    fn add(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a + b
    }

    fn subtract(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a - b
    }

    fn multiply(&self, a: &BigRational, b: &BigRational) -> BigRational {
        a * b
    }

    fn divide(&self, a: &BigRational, b: &BigRational) -> Result<BigRational, ProbError> {
        if b.is_zero() {
            return Err(ProbError::DivisionByZero);
        }
        Ok(a / b)
    }

    fn is_zero(&self, a: &BigRational) -> bool {
        a.is_zero()
    }

    fn geq(&self, a: &BigRational, b: &BigRational) -> bool {
        a >= b
    }

    fn gt(&self, a: &BigRational, b: &BigRational) -> bool {
        a > b
    }

    fn from_f64(&self, x: f64) -> Result<BigRational, ProbError> {
        BigRational::from_float(x).ok_or(ProbError::NonFinite { value: x })
    }

    fn from_ratio(&self, num: i64, den: i64) -> Result<BigRational, ProbError> {
        if den == 0 {
            return Err(ProbError::DivisionByZero);
        }
        Ok(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    fn to_f64(&self, a: &BigRational) -> f64 {
        a.to_f64().unwrap_or_else(|| {
            if a.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        })
    }

    fn exact(&self) -> bool {
        true
    }
}
