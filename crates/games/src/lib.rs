//! # Games - Explicit Stochastic Game Models
//!
//! Explicit-state models the solver iterates over:
//!
//! - [`MdpExplicit`]: states with ordered lists of probabilistic choices
//! - [`Stpg`]: a two-player turn-based game (each state owned by player 1 or 2)
//! - [`Smg`]: an n-player turn-based game whose players are grouped into a
//!   coalition for solving
//!
//! All three expose the [`Mdp`] capability, which carries the single-step
//! operations of value iteration and qualitative precomputation, and the
//! [`TurnBased`] capability, which says who owns each state. Directions are
//! passed per state ([`PerState`]), so one step implementation serves
//! uniform MDP optimisation and per-player game optimisation alike.
//!
//! [`explore`] builds an [`Smg`] from a symbolic [`ModelGenerator`].
//!
//! ## Example
//!
//! ```rust
//! use gamecheck_games::{Mdp, MinMax, PlayerMap, RowFilter, Sides, Smg, TurnBased};
//! use gamecheck_prob::Distribution;
//!
//! // p1 picks in state 0, p2 in state 1; state 2 is the goal, state 3 a sink
//! let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2"]));
//! g.add_states([1, 2, 1, 1]);
//! g.add_choice(0, Distribution::point(1)).unwrap();
//! g.add_choice(0, Distribution::point(3)).unwrap();
//! g.add_choice(1, Distribution::from_pairs([(2, 0.5), (3, 0.5)]).unwrap()).unwrap();
//! g.add_choice(1, Distribution::point(3)).unwrap();
//! g.add_choice(2, Distribution::point(2)).unwrap();
//! g.add_choice(3, Distribution::point(3)).unwrap();
//! g.set_coalition(&["p1"]).unwrap();
//!
//! let v = [0.0, 0.5, 1.0, 0.0];
//! let dir = g.by_player(Sides::opposed(MinMax::Max));
//! assert_eq!(g.mv_mult_min_max_single(0, &v, dir), 0.5);
//! assert_eq!(g.mv_mult_min_max_single(1, &v, dir), 0.0);
//! ```

mod error;
pub mod explore;
mod mdp;
mod model;
pub mod ops;
mod player;
mod smg;
mod state_set;
mod stpg;

pub use error::GameError;
pub use explore::{explore, ExploreOptions, ExploredModel, ModelGenerator};
pub use mdp::{ChoiceRow, MdpExplicit};
pub use model::{DiffMeasure, Mdp, MinMax, PerState, RowFilter};
pub use player::{reduce_owner, ByPlayer, PlayerMap, Sides, TurnBased};
pub use smg::Smg;
pub use state_set::StateSet;
pub use stpg::Stpg;
