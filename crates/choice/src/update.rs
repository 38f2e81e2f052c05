//! Updates: atomic lists of variable assignments.

use gamecheck_core::{CoreError, EvalContext, Expression, Value, VarType};
use std::fmt;

use crate::error::ChoiceError;

/// One assignment `var' = expr` inside an [`Update`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateElement {
    pub var_index: usize,
    pub var_name: String,
    pub expr: Expression,
    pub var_type: VarType,
}

impl UpdateElement {
    pub fn new(
        var_index: usize,
        var_name: impl Into<String>,
        expr: Expression,
        var_type: VarType,
    ) -> Self {
        Self {
            var_index,
            var_name: var_name.into(),
            expr,
            var_type,
        }
    }

    /// Evaluate the right-hand side and coerce it to the variable's type.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, CoreError> {
        self.var_type.coerce(self.expr.evaluate(ctx)?)
    }
}

impl fmt::Display for UpdateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}'={})", self.var_name, self.expr)
    }
}

/// An atomic list of assignments, e.g. `(x'=x+1) & (y'=0)`.
///
/// Within one update each variable is assigned at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    elements: Vec<UpdateElement>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of assignments, rejecting repeated variables.
    pub fn from_elements(elements: Vec<UpdateElement>) -> Result<Self, ChoiceError> {
        let mut update = Self::new();
        for element in elements {
            update.push(element)?;
        }
        Ok(update)
    }

    /// Append an assignment.
    pub fn push(&mut self, element: UpdateElement) -> Result<(), ChoiceError> {
        if self
            .elements
            .iter()
            .any(|e| e.var_index == element.var_index)
        {
            return Err(ChoiceError::DuplicateVariable {
                variable: element.var_name,
            });
        }
        self.elements.push(element);
        Ok(())
    }

    /// Builder-style [`push`](Self::push).
    pub fn assign(
        mut self,
        var_index: usize,
        var_name: impl Into<String>,
        expr: Expression,
        var_type: VarType,
    ) -> Result<Self, ChoiceError> {
        self.push(UpdateElement::new(var_index, var_name, expr, var_type))?;
        Ok(self)
    }

    pub fn elements(&self) -> &[UpdateElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Does any right-hand side read a primed variable?
    pub fn contains_primes(&self) -> bool {
        self.elements.iter().any(|e| e.expr.contains_primes())
    }

    /// Apply every assignment to `next`, evaluating all right-hand sides
    /// against `current` only.
    pub fn apply(&self, current: &[Value], next: &mut [Value]) -> Result<(), CoreError> {
        let ctx = EvalContext::current(current);
        for element in &self.elements {
            let value = element.evaluate(&ctx)?;
            let count = next.len();
            let slot = next
                .get_mut(element.var_index)
                .ok_or(CoreError::VariableOutOfRange {
                    index: element.var_index,
                    count,
                })?;
            *slot = value;
        }
        Ok(())
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "true");
        }
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
