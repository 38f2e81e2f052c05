//! # Solver - Values and Strategies for Stochastic Games
//!
//! Numeric and qualitative model checking over the explicit models of
//! `gamecheck-games`:
//!
//! - [`prob0`] / [`prob1`]: exact graph fixpoints for probability 0 and 1
//! - [`reach_prob`], [`bounded_reach_prob`], [`reach_reward`]: value
//!   iteration (Jacobi or Gauss-Seidel) with optional [`Strategy`] extraction
//! - [`GameQuery`]: `<<C>>` / `[[C]]` queries resolved to per-state
//!   directions on a multiplayer game
//! - [`equilibrium::solve`]: Nash and correlated equilibria under the social
//!   or fair criterion
//!
//! Solves are configured by [`SolverConfig`] and report how iteration ended
//! through [`Termination`]; hitting the iteration cap is a result, not an
//! error.
//!
//! ## Example
//!
//! ```rust
//! use gamecheck_games::{PlayerMap, Smg, StateSet};
//! use gamecheck_prob::Distribution;
//! use gamecheck_solver::{GameQuery, MinMax, SolverConfig};
//!
//! // p1 moves in state 0 (safe: reach 2 w.p. 0.5, or hand over to p2);
//! // p2 in state 1 decides between 2 and the sink 3
//! let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2"]));
//! g.add_states([1, 2, 1, 1]);
//! g.add_choice(0, Distribution::from_pairs([(2, 0.5), (3, 0.5)]).unwrap()).unwrap();
//! g.add_choice(0, Distribution::point(1)).unwrap();
//! g.add_choice(1, Distribution::point(2)).unwrap();
//! g.add_choice(1, Distribution::point(3)).unwrap();
//! g.add_choice(2, Distribution::point(2)).unwrap();
//! g.add_choice(3, Distribution::point(3)).unwrap();
//!
//! let target = StateSet::from_indices(4, [2]);
//! let query = GameQuery::exists(["p1"], MinMax::Max);
//! let result = query.reach_prob(&g, &target, &SolverConfig::default()).unwrap();
//! assert!((result.value(0) - 0.5).abs() < 1e-9);
//! assert_eq!(result.value(1), 0.0);
//! ```

mod config;
pub mod equilibrium;
mod error;
mod precomp;
mod query;
mod result;
mod strategy;
mod value_iter;

pub use config::{IterMethod, SolverConfig};
pub use equilibrium::{EquilibriumChoice, EquilibriumResult};
pub use error::SolverError;
pub use gamecheck_games::{DiffMeasure, MinMax};
pub use precomp::{prob0, prob1, Quantifier};
pub use query::{Directions, GameQuery};
pub use result::{SolveResult, Termination};
pub use strategy::Strategy;
pub use value_iter::{bounded_reach_prob, reach_prob, reach_reward};
