//! # Core - Values, States and Expressions
//!
//! Foundational data for the stochastic game engine:
//!
//! - **Values** and **States**: immutable vectors of evaluated variables
//! - **Variables**: declared types, ranges and initial values
//! - **Expressions**: update right-hand sides and guards, with primed
//!   (next-state) reads
//! - **Quantifiers**: the coalition / equilibrium parameters of a strategy
//!   operator, as handed over by the language layer
//!
//! ## Example
//!
//! ```rust
//! use gamecheck_core::{EvalContext, Expression, State, Value};
//!
//! let s = State::new(vec![Value::Int(2), Value::Bool(true)]);
//! let e = Expression::var(0, "x").plus(Expression::int(1));
//! let v = e.evaluate(&EvalContext::current(s.values())).unwrap();
//! assert_eq!(v, Value::Int(3));
//! ```

pub mod error;
pub mod expr;
pub mod quantifier;
pub mod state;
pub mod value;
pub mod vars;

pub use error::CoreError;
pub use expr::{BinaryOp, EvalContext, Expression, UnaryOp};
pub use quantifier::{
    Coalition, EquilibriumCriterion, EquilibriumType, StrategyOperator, StrategyOption,
};
pub use state::State;
pub use value::Value;
pub use vars::{VarDecl, VarList, VarType};
