//! # Game Queries
//!
//! A [`GameQuery`] is a strategy operator (`<<C>>` or `[[C]]`) applied to an
//! optimisation direction, e.g. `<<p1>>Pmax=?`. Resolving it against an
//! [`Smg`] gives a direction for every state:
//!
//! | operator | coalition states | other states |
//! |----------|------------------|--------------|
//! | `<<C>>`  | the query's direction | the opposite |
//! | `[[C]]`  | the opposite | the query's direction |
//!
//! The game is never mutated; the coalition is applied through
//! [`reduce_owner`] while the directions are computed.

use gamecheck_core::{Coalition, EquilibriumCriterion, EquilibriumType, StrategyOperator};
use gamecheck_games::{reduce_owner, MinMax, PerState, Sides, Smg, StateSet};
use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::equilibrium::{self, EquilibriumResult};
use crate::error::SolverError;
use crate::result::SolveResult;
use crate::value_iter;

/// A direction stored for each state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directions(Vec<MinMax>);

impl Directions {
    pub fn new(dirs: Vec<MinMax>) -> Self {
        Self(dirs)
    }

    pub fn as_slice(&self) -> &[MinMax] {
        &self.0
    }
}

impl PerState<MinMax> for Directions {
    fn at(&self, s: usize) -> MinMax {
        self.0[s]
    }
}

/// A strategy operator plus the direction of the property it wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameQuery {
    operator: StrategyOperator,
    dir: MinMax,
}

impl GameQuery {
    pub fn new(operator: StrategyOperator, dir: MinMax) -> Self {
        Self { operator, dir }
    }

    /// `<<players>>` with direction `dir`.
    pub fn exists<I, S>(players: I, dir: MinMax) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            StrategyOperator::exists().with_coalition(Coalition::of(players)),
            dir,
        )
    }

    /// `[[players]]` with direction `dir`.
    pub fn forall<I, S>(players: I, dir: MinMax) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            StrategyOperator::forall().with_coalition(Coalition::of(players)),
            dir,
        )
    }

    pub fn operator(&self) -> &StrategyOperator {
        &self.operator
    }

    pub fn dir(&self) -> MinMax {
        self.dir
    }

    /// Directions of player 1 (the first coalition) and player 2.
    pub fn sides(&self) -> Sides<MinMax> {
        if self.operator.is_there_exists() {
            Sides::opposed(self.dir)
        } else {
            Sides::opposed(self.dir.opposite())
        }
    }

    /// The equilibrium requested by the operator's options, if any. A type
    /// without a criterion is socially optimal; a criterion without a type is
    /// a Nash equilibrium.
    pub fn equilibrium(&self) -> Option<(EquilibriumType, EquilibriumCriterion)> {
        if !self.operator.is_equilibrium() {
            return None;
        }
        Some((
            self.operator
                .equilibrium_type()
                .unwrap_or(EquilibriumType::Nash),
            self.operator
                .equilibrium_criterion()
                .unwrap_or(EquilibriumCriterion::Social),
        ))
    }

    /// Player ids of coalition `index`, resolved against `game`.
    ///
    /// `*` stands for every named player and every owner in the game other
    /// than the scheduler.
    pub fn coalition_ids(&self, game: &Smg, index: usize) -> Result<Vec<usize>, SolverError> {
        let num_coalitions = self.operator.num_coalitions();
        let coalition = self.operator.coalitions().get(index).ok_or_else(|| {
            SolverError::InvalidQuery {
                reason: format!(
                    "coalition {index} requested, {} has {num_coalitions}",
                    self.operator
                ),
            }
        })?;
        let mut ids = if coalition.is_all_players() {
            let mut ids: Vec<usize> = game
                .player_map()
                .players()
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            ids.extend(game.owners_present().into_iter().filter(|&o| o != 0));
            ids
        } else {
            coalition
                .players()
                .iter()
                .map(|p| game.player_map().resolve(p))
                .collect::<Result<Vec<_>, _>>()?
        };
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// The direction of every state of `game` under the first coalition.
    pub fn directions(&self, game: &Smg) -> Result<Directions, SolverError> {
        let coalition = self.coalition_ids(game, 0)?;
        let sides = self.sides();
        let dirs = game
            .owners()
            .iter()
            .map(|&owner| sides.of(reduce_owner(owner, Some(coalition.as_slice()))))
            .collect();
        Ok(Directions(dirs))
    }

    fn require_zero_sum(&self) -> Result<(), SolverError> {
        if self.operator.is_equilibrium() {
            return Err(SolverError::InvalidQuery {
                reason: format!("{} asks for an equilibrium", self.operator),
            });
        }
        Ok(())
    }

    /// Optimal probability of reaching `target` in `game`.
    pub fn reach_prob(
        &self,
        game: &Smg,
        target: &StateSet,
        config: &SolverConfig,
    ) -> Result<SolveResult, SolverError> {
        self.require_zero_sum()?;
        let dirs = self.directions(game)?;
        value_iter::reach_prob(game, None, target, &dirs, config)
    }

    /// Optimal expected reward until `target` in `game`.
    pub fn reach_reward(
        &self,
        game: &Smg,
        target: &StateSet,
        config: &SolverConfig,
    ) -> Result<SolveResult, SolverError> {
        self.require_zero_sum()?;
        let dirs = self.directions(game)?;
        value_iter::reach_reward(game, target, &dirs, config)
    }

    /// An equilibrium in which coalition `k` tries to reach `targets[k]`.
    pub fn equilibrium_reach(
        &self,
        game: &Smg,
        targets: &[StateSet],
        config: &SolverConfig,
    ) -> Result<EquilibriumResult, SolverError> {
        let (kind, criterion) = self.equilibrium().ok_or_else(|| SolverError::InvalidQuery {
            reason: format!("{} asks for no equilibrium", self.operator),
        })?;
        if targets.len() != self.operator.num_coalitions() {
            return Err(SolverError::InvalidQuery {
                reason: format!(
                    "{} has {} coalitions but {} targets were given",
                    self.operator,
                    self.operator.num_coalitions(),
                    targets.len()
                ),
            });
        }
        let coalitions = (0..targets.len())
            .map(|k| self.coalition_ids(game, k))
            .collect::<Result<Vec<_>, _>>()?;
        equilibrium::solve(game, &coalitions, targets, kind, criterion, config)
    }
}
