//! # States
//!
//! A state is a fixed-length sequence of evaluated variable values, indexed
//! by variable position in the model's [`VarList`](crate::vars::VarList).
//!
//! States are value objects. There are no mutators: a transition copies the
//! current values into a scratch buffer, applies its updates there, and
//! freezes the buffer into a new `State`. Anything holding a reference to a
//! state can rely on it never changing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::value::Value;

/// An immutable, structurally compared vector of variable values.
///
/// Cloning is cheap (the values are shared behind an `Arc`), which matters
/// because exploration keeps every state both in a lookup table and in the
/// ordered state list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    values: Arc<[Value]>,
}

impl State {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of variable `index`.
    pub fn get(&self, index: usize) -> Result<&Value, CoreError> {
        self.values.get(index).ok_or(CoreError::VariableOutOfRange {
            index,
            count: self.values.len(),
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// A fresh, owned copy of the values, used as the scratch buffer that a
    /// transition writes its updates into.
    pub fn to_scratch(&self) -> Vec<Value> {
        self.values.to_vec()
    }
}

impl From<Vec<Value>> for State {
    fn from(values: Vec<Value>) -> Self {
        State::new(values)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}
