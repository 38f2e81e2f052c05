//! Variable declarations.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::value::Value;

/// Declared type of a state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarType {
    /// Bounded integer, both ends inclusive.
    Int { low: i64, high: i64 },
    Bool,
    /// Real-valued clock (real-time models).
    Clock,
}

impl VarType {
    /// Convert an evaluated expression into a value this variable can hold.
    ///
    /// Range is not checked here; see [`VarList::check_in_range`].
    pub fn coerce(&self, value: Value) -> Result<Value, CoreError> {
        match (self, value) {
            (VarType::Int { .. }, Value::Int(_)) => Ok(value),
            (VarType::Bool, Value::Bool(_)) => Ok(value),
            (VarType::Clock, Value::Int(i)) => Ok(Value::Double(i as f64)),
            (VarType::Clock, Value::Double(_)) => Ok(value),
            (VarType::Int { .. }, other) => Err(CoreError::TypeMismatch {
                expected: "int",
                got: other.type_name(),
            }),
            (VarType::Bool, other) => Err(CoreError::TypeMismatch {
                expected: "bool",
                got: other.type_name(),
            }),
            (VarType::Clock, other) => Err(CoreError::TypeMismatch {
                expected: "clock",
                got: other.type_name(),
            }),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (VarType::Int { low, high }, Value::Int(i)) => low <= i && i <= high,
            (VarType::Bool, Value::Bool(_)) => true,
            (VarType::Clock, Value::Double(d)) => *d >= 0.0,
            _ => false,
        }
    }
}

/// A declared state variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub var_type: VarType,
    pub init: Value,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, var_type: VarType, init: Value) -> Self {
        Self {
            name: name.into(),
            var_type,
            init,
        }
    }
}

/// The ordered variable declarations of a model; a state's `i`th value
/// belongs to the `i`th declaration.
#[derive(Debug, Clone, Default)]
pub struct VarList {
    decls: Vec<VarDecl>,
    by_name: FxHashMap<String, usize>,
}

impl VarList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration, returning its index.
    pub fn add(&mut self, decl: VarDecl) -> Result<usize, CoreError> {
        if self.by_name.contains_key(&decl.name) {
            return Err(CoreError::DuplicateDeclaration { name: decl.name });
        }
        let index = self.decls.len();
        self.by_name.insert(decl.name.clone(), index);
        self.decls.push(decl);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn decl(&self, index: usize) -> Result<&VarDecl, CoreError> {
        self.decls.get(index).ok_or(CoreError::VariableOutOfRange {
            index,
            count: self.decls.len(),
        })
    }

    pub fn name(&self, index: usize) -> Result<&str, CoreError> {
        self.decl(index).map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarDecl> {
        self.decls.iter()
    }

    /// The state in which every variable holds its declared initial value.
    pub fn initial_values(&self) -> Vec<Value> {
        self.decls.iter().map(|d| d.init).collect()
    }

    /// Fail if `value` lies outside the declared domain of variable `index`.
    pub fn check_in_range(&self, index: usize, value: &Value) -> Result<(), CoreError> {
        let decl = self.decl(index)?;
        if decl.var_type.contains(value) {
            Ok(())
        } else {
            Err(CoreError::ValueOutOfRange {
                variable: decl.name.clone(),
                value: value.to_string(),
            })
        }
    }
}
