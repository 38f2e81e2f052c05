//! Stochastic multiplayer games.
//!
//! States carry their raw owner (player ids from 1, with 0 the scheduler).
//! Setting a coalition turns the game into a two-player game for solving:
//! [`TurnBased::player`] then answers 1 for coalition-owned states and 2 for
//! the rest. Clearing it restores the raw owners.

use gamecheck_prob::Distribution;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;
use crate::mdp::MdpExplicit;
use crate::model::Mdp;
use crate::player::{reduce_owner, PlayerMap, TurnBased};

/// A turn-based stochastic game with any number of players.
///
/// # Example
///
/// ```rust
/// use gamecheck_games::{PlayerMap, Smg, TurnBased};
///
/// let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
/// g.add_states([1, 2, 3]);
/// g.set_coalition(&["p1", "3"]).unwrap();
/// assert_eq!((g.player(0), g.player(1), g.player(2)), (1, 2, 1));
/// g.clear_coalition();
/// assert_eq!(g.player(2), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Smg {
    mdp: MdpExplicit,
    owners: Vec<usize>,
    players: PlayerMap,
    coalition: Option<Vec<usize>>,
}

impl Smg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(players: PlayerMap) -> Self {
        Self {
            players,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Append a state owned by `owner`; returns its index.
    pub fn add_state(&mut self, owner: usize) -> usize {
        self.owners.push(owner);
        self.mdp.add_state()
    }

    /// Append one state per entry of `owners`.
    pub fn add_states(&mut self, owners: impl IntoIterator<Item = usize>) {
        for owner in owners {
            self.add_state(owner);
        }
    }

    /// Change the owner of state `s`.
    pub fn set_player(&mut self, s: usize, owner: usize) -> Result<(), GameError> {
        let num_states = self.owners.len();
        let slot = self.owners.get_mut(s).ok_or(GameError::StateOutOfRange {
            state: s,
            num_states,
        })?;
        *slot = owner;
        Ok(())
    }

    pub fn add_initial_state(&mut self, s: usize) -> Result<(), GameError> {
        self.mdp.add_initial_state(s)
    }

    pub fn add_choice(&mut self, s: usize, distribution: Distribution) -> Result<usize, GameError> {
        self.mdp.add_choice(s, distribution)
    }

    pub fn add_action_labelled_choice(
        &mut self,
        s: usize,
        distribution: Distribution,
        action: impl Into<String>,
    ) -> Result<usize, GameError> {
        self.mdp.add_action_labelled_choice(s, distribution, action)
    }

    pub fn set_transition_reward(
        &mut self,
        s: usize,
        i: usize,
        reward: f64,
    ) -> Result<(), GameError> {
        self.mdp.set_transition_reward(s, i, reward)
    }

    pub fn mdp(&self) -> &MdpExplicit {
        &self.mdp
    }

    pub fn mdp_mut(&mut self) -> &mut MdpExplicit {
        &mut self.mdp
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Raw owner of state `s`, regardless of any coalition.
    pub fn owner(&self, s: usize) -> usize {
        self.owners[s]
    }

    pub fn owners(&self) -> &[usize] {
        &self.owners
    }

    /// States owned by the scheduler (player 0).
    pub fn scheduler_states(&self) -> Vec<usize> {
        self.owners
            .iter()
            .enumerate()
            .filter(|&(_, &o)| o == 0)
            .map(|(s, _)| s)
            .collect()
    }

    /// Distinct raw owners, ascending.
    pub fn owners_present(&self) -> Vec<usize> {
        let mut out = self.owners.clone();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn player_map(&self) -> &PlayerMap {
        &self.players
    }

    pub fn set_player_map(&mut self, players: PlayerMap) {
        self.players = players;
    }

    // ------------------------------------------------------------------
    // Coalitions
    // ------------------------------------------------------------------

    /// Set the coalition (player 1) from player names or integer ids.
    ///
    /// The new coalition replaces the previous one. If any member cannot be
    /// resolved the previous coalition is left in place. An empty list
    /// clears the coalition.
    pub fn set_coalition<S: AsRef<str>>(&mut self, members: &[S]) -> Result<(), GameError> {
        let ids = members
            .iter()
            .map(|m| self.players.resolve(m.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.set_coalition_ids(ids);
        Ok(())
    }

    /// Set the coalition from raw player ids; an empty list clears it.
    pub fn set_coalition_ids(&mut self, ids: impl IntoIterator<Item = usize>) {
        let mut ids: Vec<usize> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        self.coalition = if ids.is_empty() { None } else { Some(ids) };
    }

    /// Drop the coalition; [`TurnBased::player`] returns raw owners again.
    pub fn clear_coalition(&mut self) {
        self.coalition = None;
    }

    pub fn coalition(&self) -> Option<&[usize]> {
        self.coalition.as_deref()
    }

    /// Renumber states so that state `i` becomes `permut[i]`. The coalition
    /// is not carried over.
    pub fn permuted(&self, permut: &[usize]) -> Result<Self, GameError> {
        let mdp = self.mdp.permuted(permut)?;
        let mut owners = vec![0; self.owners.len()];
        for (s, &owner) in self.owners.iter().enumerate() {
            owners[permut[s]] = owner;
        }
        Ok(Self {
            mdp,
            owners,
            players: self.players.clone(),
            coalition: None,
        })
    }
}

impl Mdp for Smg {
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

impl TurnBased for Smg {
    fn player(&self, s: usize) -> usize {
        reduce_owner(self.owners[s], self.coalition.as_deref())
    }
}

impl fmt::Display for Smg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for s in 0..self.owners.len() {
            if s > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}(P-{}): ", self.owners[s])?;
            self.mdp.fmt_row(s, f)?;
        }
        write!(f, " ]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_players() -> Smg {
        let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
        g.add_states([1, 2, 3, 1, 0]);
        for s in 0..5 {
            g.add_choice(s, Distribution::point(s)).unwrap();
        }
        g
    }

    #[test]
    fn test_coalition_reduces_to_two_players() {
        let mut g = three_players();
        g.set_coalition(&["p1"]).unwrap();
        let players: Vec<usize> = (0..5).map(|s| g.player(s)).collect();
        assert_eq!(players, vec![1, 2, 2, 1, 2]);
    }

    #[test]
    fn test_clearing_restores_raw_owners() {
        let mut g = three_players();
        g.set_coalition(&["p2", "p3"]).unwrap();
        g.clear_coalition();
        let players: Vec<usize> = (0..5).map(|s| g.player(s)).collect();
        assert_eq!(players, vec![1, 2, 3, 1, 0]);

        g.set_coalition(&["p1"]).unwrap();
        g.set_coalition::<&str>(&[]).unwrap();
        assert_eq!(g.coalition(), None);
        assert_eq!(g.player(2), 3);
    }

    #[test]
    fn test_reset_replaces_rather_than_merges() {
        let mut g = three_players();
        g.set_coalition(&["p1"]).unwrap();
        g.set_coalition(&["p2"]).unwrap();
        assert_eq!(g.coalition(), Some(&[2][..]));
        assert_eq!(g.player(0), 2);
        assert_eq!(g.player(1), 1);
    }

    #[test]
    fn test_unknown_player_keeps_previous_coalition() {
        let mut g = three_players();
        g.set_coalition(&["p1"]).unwrap();
        let err = g.set_coalition(&["p2", "nobody"]).unwrap_err();
        assert_eq!(err.to_string(), "Player nobody is not present in the model");
        assert_eq!(g.coalition(), Some(&[1][..]));
    }

    #[test]
    fn test_scheduler_and_owners() {
        let g = three_players();
        assert_eq!(g.scheduler_states(), vec![4]);
        assert_eq!(g.owners_present(), vec![0, 1, 2, 3]);
        assert_eq!(g.owner(3), 1);
    }

    #[test]
    fn test_permuted_moves_owners() {
        let g = three_players();
        let p = g.permuted(&[4, 3, 2, 1, 0]).unwrap();
        assert_eq!(p.owner(0), 0);
        assert_eq!(p.owner(4), 1);
        assert_eq!(p.distribution(0, 0).get(0), 1.0);
    }
}
