//! Two-player turn-based stochastic games.

use gamecheck_prob::Distribution;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;
use crate::mdp::MdpExplicit;
use crate::model::Mdp;
use crate::player::TurnBased;

/// A stochastic two-player game: an MDP whose states belong to player 1 or
/// player 2.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stpg {
    mdp: MdpExplicit,
    players: Vec<usize>,
}

impl Stpg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a state owned by `player` (1 or 2).
    pub fn add_state(&mut self, player: usize) -> Result<usize, GameError> {
        check_player(player)?;
        self.players.push(player);
        Ok(self.mdp.add_state())
    }

    pub fn set_player(&mut self, s: usize, player: usize) -> Result<(), GameError> {
        check_player(player)?;
        let num_states = self.players.len();
        let slot = self
            .players
            .get_mut(s)
            .ok_or(GameError::StateOutOfRange {
                state: s,
                num_states,
            })?;
        *slot = player;
        Ok(())
    }

    pub fn add_initial_state(&mut self, s: usize) -> Result<(), GameError> {
        self.mdp.add_initial_state(s)
    }

    pub fn add_choice(&mut self, s: usize, distribution: Distribution) -> Result<usize, GameError> {
        self.mdp.add_choice(s, distribution)
    }

    /// The underlying MDP, for building operations not repeated here.
    pub fn mdp_mut(&mut self) -> &mut MdpExplicit {
        &mut self.mdp
    }

    pub fn mdp(&self) -> &MdpExplicit {
        &self.mdp
    }
}

fn check_player(player: usize) -> Result<(), GameError> {
    if player == 1 || player == 2 {
        Ok(())
    } else {
        Err(GameError::InvalidPlayer { player })
    }
}

impl Mdp for Stpg {
    fn num_states(&self) -> usize {
        self.mdp.num_states()
    }

    fn initial_states(&self) -> &[usize] {
        self.mdp.initial_states()
    }

    fn num_choices(&self, s: usize) -> usize {
        self.mdp.num_choices(s)
    }

    fn distribution(&self, s: usize, i: usize) -> &Distribution {
        self.mdp.distribution(s, i)
    }

    fn action(&self, s: usize, i: usize) -> Option<&str> {
        self.mdp.action(s, i)
    }

    fn transition_reward(&self, s: usize, i: usize) -> f64 {
        self.mdp.transition_reward(s, i)
    }
}

impl TurnBased for Stpg {
    fn player(&self, s: usize) -> usize {
        self.players[s]
    }
}

impl fmt::Display for Stpg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for s in 0..self.players.len() {
            if s > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}(P-{}): ", self.players[s])?;
            self.mdp.fmt_row(s, f)?;
        }
        write!(f, " ]")
    }
}
