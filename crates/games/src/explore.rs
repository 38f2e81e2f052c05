//! Breadth-first state-space exploration.
//!
//! A [`ModelGenerator`] describes a game symbolically: initial states, the
//! owner of a state, and the [`Choice`]s enabled in it. [`explore`] expands
//! every reachable state once, computes each outcome's target through
//! [`Choice::compute_target`], and records the result as an explicit
//! [`Smg`]. States are numbered in discovery order.

use gamecheck_choice::{Choice, ModuleOrAction};
use gamecheck_core::{State, VarList};
use gamecheck_prob::{Distribution, Evaluator};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::{debug, info, trace};

use crate::error::GameError;
use crate::model::Mdp;
use crate::player::PlayerMap;
use crate::smg::Smg;

/// Symbolic description of a game.
pub trait ModelGenerator<E: Evaluator> {
    /// Declared variables; every state has one value per variable.
    fn vars(&self) -> &VarList;

    /// Player names; player `k` of this list gets id `k + 1`.
    fn player_names(&self) -> Vec<String>;

    fn initial_states(&self) -> Result<Vec<State>, GameError>;

    /// Raw owner of `state` (0 for the scheduler).
    fn owner(&self, state: &State) -> Result<usize, GameError>;

    /// Choices enabled in `state`, already composed across synchronising
    /// modules.
    fn choices(&self, state: &State) -> Result<Vec<Choice<E>>, GameError>;

    /// Label recorded for choices generated by `owner`.
    fn action_label(&self, _owner: ModuleOrAction) -> Option<String> {
        None
    }

    /// Reward for taking `choice` in `state`.
    fn transition_reward(&self, _state: &State, _choice: &Choice<E>) -> f64 {
        0.0
    }
}

/// Exploration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreOptions {
    /// Add a self-loop to states without choices instead of failing.
    pub fix_deadlocks: bool,
    /// Abort once more than this many states have been discovered.
    pub max_states: Option<usize>,
}

impl Default for ExploreOptions {
    fn default() -> Self {
        Self {
            fix_deadlocks: true,
            max_states: None,
        }
    }
}

/// An explored game together with the state each index stands for.
#[derive(Debug, Clone)]
pub struct ExploredModel {
    pub game: Smg,
    pub states: Vec<State>,
    index: FxHashMap<State, usize>,
    /// States that had no choice and were given a self-loop.
    pub deadlocks: Vec<usize>,
}

impl ExploredModel {
    pub fn index_of(&self, state: &State) -> Option<usize> {
        self.index.get(state).copied()
    }
}

struct Frontier {
    states: Vec<State>,
    index: FxHashMap<State, usize>,
    queue: VecDeque<usize>,
    limit: Option<usize>,
}

impl Frontier {
    /// Index of `state`, adding it to the game (owner set on expansion).
    fn intern(&mut self, state: State, game: &mut Smg) -> Result<usize, GameError> {
        if let Some(&s) = self.index.get(&state) {
            return Ok(s);
        }
        if let Some(limit) = self.limit {
            if self.states.len() >= limit {
                return Err(GameError::StateSpaceLimit { limit });
            }
        }
        let s = game.add_state(0);
        self.index.insert(state.clone(), s);
        self.states.push(state);
        self.queue.push_back(s);
        Ok(s)
    }
}

/// Explore every state reachable from the generator's initial states.
pub fn explore<E, G>(generator: &G, options: &ExploreOptions) -> Result<ExploredModel, GameError>
where
    E: Evaluator,
    G: ModelGenerator<E> + ?Sized,
{
    let mut game = Smg::with_players(PlayerMap::from_names(generator.player_names()));
    let mut frontier = Frontier {
        states: Vec::new(),
        index: FxHashMap::default(),
        queue: VecDeque::new(),
        limit: options.max_states,
    };
    let mut deadlocks = Vec::new();

    for init in generator.initial_states()? {
        let s = frontier.intern(init, &mut game)?;
        game.add_initial_state(s)?;
    }

    while let Some(s) = frontier.queue.pop_front() {
        let state = frontier.states[s].clone();
        game.set_player(s, generator.owner(&state)?)?;

        let choices = generator.choices(&state)?;
        trace!("Expanding state {} {} with {} choices", s, state, choices.len());
        if choices.is_empty() {
            if !options.fix_deadlocks {
                return Err(GameError::Deadlock {
                    state: state.to_string(),
                });
            }
            game.add_choice(s, Distribution::point(s))?;
            deadlocks.push(s);
            continue;
        }

        for choice in &choices {
            let distribution = successors(choice, &state, generator.vars(), |t| {
                frontier.intern(t, &mut game)
            })?;
            let k = match generator.action_label(choice.module_or_action()) {
                Some(label) => game.add_action_labelled_choice(s, distribution, label)?,
                None => game.add_choice(s, distribution)?,
            };
            let reward = generator.transition_reward(&state, choice);
            if reward != 0.0 {
                game.set_transition_reward(s, k, reward)?;
            }
        }
    }

    if !deadlocks.is_empty() {
        debug!("Added self-loops to {} deadlock states", deadlocks.len());
    }
    info!(
        "Explored {} states, {} transitions",
        frontier.states.len(),
        game.num_transitions_total()
    );

    Ok(ExploredModel {
        game,
        states: frontier.states,
        index: frontier.index,
        deadlocks,
    })
}

/// The distribution of `choice` from `state`, interning targets as they
/// are found. Outcomes leading to the same state are merged.
fn successors<E: Evaluator>(
    choice: &Choice<E>,
    state: &State,
    vars: &VarList,
    mut intern: impl FnMut(State) -> Result<usize, GameError>,
) -> Result<Distribution, GameError> {
    if choice.clock_guard().is_some() {
        return Err(GameError::UnsupportedClockGuard {
            state: state.to_string(),
        });
    }
    choice.check_for_errors(state, vars)?;

    let eval = choice.evaluator();
    let mut distribution = Distribution::new();
    for i in 0..choice.size() {
        let probability = choice.probability(i)?;
        if eval.is_zero(probability) {
            continue;
        }
        let target = intern(choice.compute_target(i, state)?)?;
        let p = eval.to_f64(probability);
        distribution
            .add(target, p)
            .map_err(|source| GameError::BadDistribution {
                state: state.to_string(),
                source,
            })?;
    }
    distribution
        .check_normalized()
        .map_err(|source| GameError::BadDistribution {
            state: state.to_string(),
            source,
        })?;
    Ok(distribution)
}
