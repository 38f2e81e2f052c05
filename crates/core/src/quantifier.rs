//! # Strategy Quantifiers
//!
//! The `<<C>>` ("there exists a strategy for coalition C") and `[[C]]` ("for
//! all strategies of coalition C") operators, reduced to the parameters a
//! solver needs: which coalitions, which quantifier, and optionally which
//! equilibrium notion.
//!
//! ```text
//!   <<p1,p2:p3>>{nash,social} ...
//!     │  │   │    │    └── criterion
//!     │  │   │    └─────── equilibrium type
//!     │  └───┴──────────── coalitions, separated by ':'
//!     └─────────────────── existential
//! ```
//!
//! Options arrive as raw identifiers from the language layer and are decoded
//! exactly once into [`StrategyOption`]; anything unrecognised is rejected
//! with the operator's display form in the error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Equilibrium type requested by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquilibriumType {
    Nash,
    Correlated,
}

/// Optimality criterion used to pick among equilibria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquilibriumCriterion {
    /// Maximise the sum of payoffs.
    Social,
    /// Minimise the spread of payoffs.
    Fair,
}

/// The closed set of options accepted in `{...}` after a strategy operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOption {
    Nash,
    Correlated,
    Social,
    Fair,
}

impl FromStr for StrategyOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nash" => Ok(StrategyOption::Nash),
            "correlated" | "corr" => Ok(StrategyOption::Correlated),
            "social" => Ok(StrategyOption::Social),
            "fair" => Ok(StrategyOption::Fair),
            _ => Err(()),
        }
    }
}

/// A set of players acting together, named as in the model.
///
/// Members are kept as written (names or integer ids); resolving them
/// against a concrete game is the game model's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coalition {
    players: Vec<String>,
    all_players: bool,
}

impl Coalition {
    /// The empty coalition.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let players: Vec<String> = players.into_iter().map(Into::into).collect();
        let all_players = players.len() == 1 && players[0] == "*";
        if all_players {
            return Self::all();
        }
        Self {
            players,
            all_players: false,
        }
    }

    /// The `*` coalition containing every player.
    pub fn all() -> Self {
        Self {
            players: Vec::new(),
            all_players: true,
        }
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn is_all_players(&self) -> bool {
        self.all_players
    }

    pub fn is_empty(&self) -> bool {
        !self.all_players && self.players.is_empty()
    }
}

impl fmt::Display for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_players {
            write!(f, "*")
        } else {
            write!(f, "{}", self.players.join(","))
        }
    }
}

/// Strategy quantification as carried by a `<<..>>` / `[[..]]` operator.
///
/// The coalition list is never empty: the degenerate case is a single empty
/// coalition, meaning every player is an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOperator {
    there_exists: bool,
    coalitions: Vec<Coalition>,
    equilibrium_type: Option<EquilibriumType>,
    equilibrium_criterion: Option<EquilibriumCriterion>,
    options: Vec<String>,
}

impl StrategyOperator {
    /// `<<>>`: there exists a strategy.
    pub fn exists() -> Self {
        Self::new(true)
    }

    /// `[[]]`: for all strategies.
    pub fn forall() -> Self {
        Self::new(false)
    }

    pub fn new(there_exists: bool) -> Self {
        Self {
            there_exists,
            coalitions: vec![Coalition::new()],
            equilibrium_type: None,
            equilibrium_criterion: None,
            options: Vec::new(),
        }
    }

    /// Replace the coalition list with a single coalition.
    pub fn set_coalition(&mut self, coalition: Coalition) {
        self.coalitions = vec![coalition];
    }

    /// Replace the coalition list. An empty list collapses to the single
    /// empty coalition.
    pub fn set_coalitions(&mut self, coalitions: Vec<Coalition>) {
        self.coalitions = if coalitions.is_empty() {
            vec![Coalition::new()]
        } else {
            coalitions
        };
    }

    pub fn with_coalition(mut self, coalition: Coalition) -> Self {
        self.set_coalition(coalition);
        self
    }

    pub fn with_coalitions(mut self, coalitions: Vec<Coalition>) -> Self {
        self.set_coalitions(coalitions);
        self
    }

    /// Decode the `{...}` options.
    ///
    /// Each option sets the equilibrium type or criterion; a later option of
    /// the same kind overrides an earlier one. Unknown options are errors,
    /// and leave the operator unchanged.
    pub fn process_options(&mut self, options: &[&str]) -> Result<(), CoreError> {
        let decoded = options
            .iter()
            .map(|raw| {
                let raw = raw.trim();
                raw.parse::<StrategyOption>()
                    .map(|option| (option, raw))
                    .map_err(|()| CoreError::UnknownOption {
                        option: raw.to_string(),
                        operator: self.operator_string().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (option, raw) in decoded {
            match option {
                StrategyOption::Nash => self.equilibrium_type = Some(EquilibriumType::Nash),
                StrategyOption::Correlated => {
                    self.equilibrium_type = Some(EquilibriumType::Correlated)
                }
                StrategyOption::Social => {
                    self.equilibrium_criterion = Some(EquilibriumCriterion::Social)
                }
                StrategyOption::Fair => {
                    self.equilibrium_criterion = Some(EquilibriumCriterion::Fair)
                }
            }
            self.options.push(raw.to_string());
        }
        Ok(())
    }

    pub fn is_there_exists(&self) -> bool {
        self.there_exists
    }

    /// `"<<>>"` or `"[[]]"`.
    pub fn operator_string(&self) -> &'static str {
        if self.there_exists {
            "<<>>"
        } else {
            "[[]]"
        }
    }

    /// The first coalition.
    pub fn coalition(&self) -> &Coalition {
        &self.coalitions[0]
    }

    pub fn coalitions(&self) -> &[Coalition] {
        &self.coalitions
    }

    pub fn num_coalitions(&self) -> usize {
        self.coalitions.len()
    }

    pub fn coalition_is_all_players(&self) -> bool {
        self.coalition().is_all_players()
    }

    pub fn equilibrium_type(&self) -> Option<EquilibriumType> {
        self.equilibrium_type
    }

    pub fn equilibrium_criterion(&self) -> Option<EquilibriumCriterion> {
        self.equilibrium_criterion
    }

    /// Was any equilibrium option given?
    pub fn is_equilibrium(&self) -> bool {
        self.equilibrium_type.is_some() || self.equilibrium_criterion.is_some()
    }
}

impl Default for StrategyOperator {
    fn default() -> Self {
        Self::exists()
    }
}

impl fmt::Display for StrategyOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.there_exists {
            ("<<", ">>")
        } else {
            ("[[", "]]")
        };
        let coalitions: Vec<String> = self.coalitions.iter().map(|c| c.to_string()).collect();
        write!(f, "{open}{}{close}", coalitions.join(":"))?;
        if !self.options.is_empty() {
            write!(f, "{{{}}}", self.options.join(","))?;
        }
        Ok(())
    }
}
