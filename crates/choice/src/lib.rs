//! # Choice - Probabilistic Choices over Module Updates
//!
//! The transition layer between a model description and its explicit state
//! space. A [`Choice`] is one nondeterministic option of a state: a list of
//! outcomes, each a probability paired with the updates that fire together.
//!
//! - **Composition**: synchronising modules multiply their choices
//!   ([`compose`], [`ChoiceBuilder::product_with`])
//! - **Targets**: [`Choice::compute_target`] applies an outcome to a state,
//!   ordering assignments by their primed reads when needed
//! - **Sampling**: [`Choice::index_by_probability_sum`] and
//!   [`Choice::sample`] pick an outcome by cumulative probability
//!
//! ## Example
//!
//! ```rust
//! use gamecheck_choice::{compose, ChoiceBuilder, Update};
//! use gamecheck_core::{Expression, State, Value, VarType};
//! use gamecheck_prob::FloatEvaluator;
//!
//! let bit = VarType::Int { low: 0, high: 1 };
//! let x = |v| Update::new().assign(0, "x", Expression::int(v), bit).unwrap();
//! let y = |v| Update::new().assign(1, "y", Expression::int(v), bit).unwrap();
//!
//! let mut a = ChoiceBuilder::new(FloatEvaluator);
//! a.set_module_or_action_index(1).unwrap();
//! a.add(0.5, [x(0)]).add(0.5, [x(1)]);
//! let mut b = ChoiceBuilder::new(FloatEvaluator);
//! b.set_module_or_action_index(1).unwrap();
//! b.add(1.0, [y(1)]);
//!
//! let ab = compose(&a.build().unwrap(), &b.build().unwrap());
//! let s = State::new(vec![Value::Int(0), Value::Int(0)]);
//! assert_eq!(ab.size(), 2);
//! assert_eq!(ab.update_string(1, &s).unwrap(), "(x'=1)&(y'=1)");
//! ```

mod choice;
mod compose;
mod error;
mod resolve;
mod update;

pub use choice::{Choice, ChoiceBuilder, ModuleOrAction};
pub use compose::compose;
pub use error::ChoiceError;
pub use update::{Update, UpdateElement};
