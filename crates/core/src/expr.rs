//! # Expressions
//!
//! The already-type-checked expression trees that updates, guards and clock
//! guards are made of. Parsing lives upstream; this module only needs to
//! evaluate them and answer structural questions.
//!
//! Variable references are either *unprimed* (the current state's value) or
//! *primed* (the value in the state being constructed). A primed read inside
//! an update is a read-after-write dependency on another update of the same
//! transition, so evaluation takes an [`EvalContext`] holding both.

use std::fmt;

use crate::error::CoreError;
use crate::value::Value;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Implies,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Implies => "=>",
        }
    }
}

/// An expression over state variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Var {
        index: usize,
        name: String,
        primed: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Ite {
        cond: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
}

/// Where variable reads are resolved during evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Values of the current state.
    pub current: &'a [Value],
    /// Values of the state under construction, if primed reads are allowed.
    pub next: Option<&'a [Value]>,
}

impl<'a> EvalContext<'a> {
    pub fn current(current: &'a [Value]) -> Self {
        Self {
            current,
            next: None,
        }
    }

    pub fn with_next(current: &'a [Value], next: &'a [Value]) -> Self {
        Self {
            current,
            next: Some(next),
        }
    }
}

impl Expression {
    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn int(i: i64) -> Self {
        Expression::Literal(Value::Int(i))
    }

    pub fn bool(b: bool) -> Self {
        Expression::Literal(Value::Bool(b))
    }

    pub fn double(d: f64) -> Self {
        Expression::Literal(Value::Double(d))
    }

    /// Unprimed read of variable `index`.
    pub fn var(index: usize, name: impl Into<String>) -> Self {
        Expression::Var {
            index,
            name: name.into(),
            primed: false,
        }
    }

    /// Primed (next-state) read of variable `index`.
    pub fn primed(index: usize, name: impl Into<String>) -> Self {
        Expression::Var {
            index,
            name: name.into(),
            primed: true,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn ite(cond: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::Ite {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn plus(self, other: Expression) -> Self {
        Expression::binary(BinaryOp::Add, self, other)
    }

    pub fn minus(self, other: Expression) -> Self {
        Expression::binary(BinaryOp::Sub, self, other)
    }

    pub fn times(self, other: Expression) -> Self {
        Expression::binary(BinaryOp::Mul, self, other)
    }

    /// Logical conjunction `a & b`.
    pub fn and(a: Expression, b: Expression) -> Self {
        Expression::binary(BinaryOp::And, a, b)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Distinct indices of variables read primed, in first-occurrence order.
    pub fn primed_vars(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_primed(&mut out);
        out
    }

    fn collect_primed(&self, out: &mut Vec<usize>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Var { index, primed, .. } => {
                if *primed && !out.contains(index) {
                    out.push(*index);
                }
            }
            Expression::Unary { operand, .. } => operand.collect_primed(out),
            Expression::Binary { left, right, .. } => {
                left.collect_primed(out);
                right.collect_primed(out);
            }
            Expression::Ite {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_primed(out);
                then.collect_primed(out);
                otherwise.collect_primed(out);
            }
        }
    }

    /// Does any variable reference in this expression carry a prime?
    pub fn contains_primes(&self) -> bool {
        match self {
            Expression::Literal(_) => false,
            Expression::Var { primed, .. } => *primed,
            Expression::Unary { operand, .. } => operand.contains_primes(),
            Expression::Binary { left, right, .. } => {
                left.contains_primes() || right.contains_primes()
            }
            Expression::Ite {
                cond,
                then,
                otherwise,
            } => cond.contains_primes() || then.contains_primes() || otherwise.contains_primes(),
        }
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, CoreError> {
        match self {
            Expression::Literal(v) => Ok(*v),
            Expression::Var {
                index,
                name,
                primed,
            } => {
                let source = if *primed {
                    ctx.next.ok_or_else(|| CoreError::PrimedReadWithoutNext {
                        variable: name.clone(),
                    })?
                } else {
                    ctx.current
                };
                source
                    .get(*index)
                    .copied()
                    .ok_or(CoreError::VariableOutOfRange {
                        index: *index,
                        count: source.len(),
                    })
            }
            Expression::Unary { op, operand } => {
                let v = operand.evaluate(ctx)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.as_bool()?)),
                    UnaryOp::Neg => match v {
                        Value::Int(i) => i
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or(CoreError::Overflow),
                        other => Ok(Value::Double(-other.as_double()?)),
                    },
                }
            }
            Expression::Binary { op, left, right } => eval_binary(*op, left, right, ctx),
            Expression::Ite {
                cond,
                then,
                otherwise,
            } => {
                if cond.evaluate(ctx)?.as_bool()? {
                    then.evaluate(ctx)
                } else {
                    otherwise.evaluate(ctx)
                }
            }
        }
    }

    /// Evaluate as a boolean (guards, clock guards).
    pub fn evaluate_bool(&self, ctx: &EvalContext<'_>) -> Result<bool, CoreError> {
        self.evaluate(ctx)?.as_bool()
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expression,
    right: &Expression,
    ctx: &EvalContext<'_>,
) -> Result<Value, CoreError> {
    // Short-circuit the boolean connectives
    match op {
        BinaryOp::And => {
            return Ok(Value::Bool(
                left.evaluate_bool(ctx)? && right.evaluate_bool(ctx)?,
            ))
        }
        BinaryOp::Or => {
            return Ok(Value::Bool(
                left.evaluate_bool(ctx)? || right.evaluate_bool(ctx)?,
            ))
        }
        BinaryOp::Implies => {
            return Ok(Value::Bool(
                !left.evaluate_bool(ctx)? || right.evaluate_bool(ctx)?,
            ))
        }
        _ => {}
    }

    let l = left.evaluate(ctx)?;
    let r = right.evaluate(ctx)?;

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => match (l, r) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                result.map(Value::Int).ok_or(CoreError::Overflow)
            }
            _ => {
                let (a, b) = (l.as_double()?, r.as_double()?);
                Ok(Value::Double(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    _ => a * b,
                }))
            }
        },
        BinaryOp::Div => {
            let (a, b) = (l.as_double()?, r.as_double()?);
            if b == 0.0 {
                return Err(CoreError::DivisionByZero);
            }
            Ok(Value::Double(a / b))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (l, r) {
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::Int(a), Value::Int(b)) => a == b,
                (a, b) => a.as_double()? == b.as_double()?,
            };
            Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (l, r) {
                (Value::Int(a), Value::Int(b)) => a.partial_cmp(&b),
                (a, b) => a.as_double()?.partial_cmp(&b.as_double()?),
            };
            let ordering = ordering.ok_or(CoreError::TypeMismatch {
                expected: "ordered number",
                got: "NaN",
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Implies => unreachable!("handled above"),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(v) => write!(f, "{v}"),
            Expression::Var { name, primed, .. } => {
                write!(f, "{name}")?;
                if *primed {
                    write!(f, "'")?;
                }
                Ok(())
            }
            Expression::Unary { op, operand } => {
                let symbol = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                };
                if operand.is_compound() {
                    write!(f, "{symbol}({operand})")
                } else {
                    write!(f, "{symbol}{operand}")
                }
            }
            Expression::Binary { op, left, right } => {
                write_operand(f, left)?;
                write!(f, "{}", op.symbol())?;
                write_operand(f, right)
            }
            Expression::Ite {
                cond,
                then,
                otherwise,
            } => write!(f, "({cond} ? {then} : {otherwise})"),
        }
    }
}

impl Expression {
    fn is_compound(&self) -> bool {
        matches!(self, Expression::Binary { .. } | Expression::Ite { .. })
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expression) -> fmt::Result {
    if matches!(e, Expression::Binary { .. }) {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}
