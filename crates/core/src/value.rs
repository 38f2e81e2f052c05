//! Evaluated variable values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CoreError;

/// A single evaluated value held by a state variable or produced by an expression.
///
/// Doubles compare and hash by bit pattern so that states stay usable as
/// hash-map keys during exploration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
}

impl Value {
    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Double(_) => "double",
        }
    }

    pub fn as_int(&self) -> Result<i64, CoreError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(CoreError::TypeMismatch {
                expected: "int",
                got: other.type_name(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, CoreError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(CoreError::TypeMismatch {
                expected: "bool",
                got: other.type_name(),
            }),
        }
    }

    /// Numeric view of the value; ints widen to doubles.
    pub fn as_double(&self) -> Result<f64, CoreError> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Double(d) => Ok(*d),
            other => Err(CoreError::TypeMismatch {
                expected: "double",
                got: other.type_name(),
            }),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Double(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(i) => i.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Double(d) => write!(f, "{d}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}
