//! Players, coalitions and the turn-based capability.
//!
//! A turn-based game is an [`Mdp`] plus a [`TurnBased::player`] answer for
//! every state. Multiplayer games reduce to two sides by coalition: a state
//! whose raw owner is in the coalition belongs to player 1, every other
//! state to player 2. The reduction is the pure function
//! [`reduce_owner`]; models hold the raw owners and apply it on demand.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::model::{Mdp, MinMax, PerState};

// ============================================================================
// Turn-based capability
// ============================================================================

/// A value for each side of a two-player game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub player1: T,
    pub player2: T,
}

impl<T: Copy> Sides<T> {
    pub fn new(player1: T, player2: T) -> Self {
        Self { player1, player2 }
    }

    /// Player 1 gets `player1`; every other player id counts as player 2.
    pub fn of(&self, player: usize) -> T {
        if player == 1 {
            self.player1
        } else {
            self.player2
        }
    }
}

impl Sides<MinMax> {
    /// Player 1 optimises in `dir`, player 2 against it.
    pub fn opposed(dir: MinMax) -> Self {
        Self::new(dir, dir.opposite())
    }
}

/// The owner of each state.
pub trait TurnBased: Mdp {
    /// The (reduced) player that owns state `s`.
    fn player(&self, s: usize) -> usize;

    /// Per-state values chosen by the owner of each state.
    fn by_player<T: Copy>(&self, sides: Sides<T>) -> ByPlayer<'_, Self, T>
    where
        Self: Sized,
    {
        ByPlayer { game: self, sides }
    }
}

/// [`PerState`] lookup through a game's state owners.
#[derive(Debug)]
pub struct ByPlayer<'a, G, T> {
    game: &'a G,
    sides: Sides<T>,
}

impl<G, T: Copy> Clone for ByPlayer<'_, G, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, T: Copy> Copy for ByPlayer<'_, G, T> {}

impl<G: TurnBased, T: Copy> PerState<T> for ByPlayer<'_, G, T> {
    fn at(&self, s: usize) -> T {
        self.sides.of(self.game.player(s))
    }
}

// ============================================================================
// Player names and coalitions
// ============================================================================

/// Bidirectional player name ↔ id map.
///
/// Id 0 is reserved for the scheduler; named players are numbered from 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMap {
    names: FxHashMap<usize, String>,
    ids: FxHashMap<String, usize>,
}

impl PlayerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Players `names[0]`, `names[1]`, ... with ids 1, 2, ...
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (k, name) in names.into_iter().enumerate() {
            map.insert(name, k + 1);
        }
        map
    }

    /// Map `name` to `id`, replacing any previous entry for either.
    pub fn insert(&mut self, name: impl Into<String>, id: usize) {
        let name = name.into();
        if let Some(old) = self.ids.insert(name.clone(), id) {
            self.names.remove(&old);
        }
        if let Some(old) = self.names.insert(id, name.clone()) {
            if old != name {
                self.ids.remove(&old);
            }
        }
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(id, name)` pairs in id order.
    pub fn players(&self) -> Vec<(usize, &str)> {
        let mut out: Vec<(usize, &str)> =
            self.names.iter().map(|(&id, n)| (id, n.as_str())).collect();
        out.sort_unstable_by_key(|&(id, _)| id);
        out
    }

    /// Resolve a coalition member: a known name, else an integer id.
    pub fn resolve(&self, player: &str) -> Result<usize, GameError> {
        if let Some(id) = self.id(player) {
            return Ok(id);
        }
        player
            .trim()
            .parse::<usize>()
            .map_err(|_| GameError::UnknownPlayer {
                player: player.to_string(),
            })
    }
}

/// Two-sided view of a raw owner.
///
/// Without a coalition the raw owner is returned unchanged; with one, members
/// map to 1 and everybody else to 2.
pub fn reduce_owner(owner: usize, coalition: Option<&[usize]>) -> usize {
    match coalition {
        None => owner,
        Some(members) if members.contains(&owner) => 1,
        Some(_) => 2,
    }
}
