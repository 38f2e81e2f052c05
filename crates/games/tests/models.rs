//! Integration tests for game models: coalitions, qualitative steps and
//! exploration.

use gamecheck_choice::{compose, Choice, ChoiceBuilder, Update};
use gamecheck_core::{Expression, State, Value, VarDecl, VarList, VarType};
use gamecheck_games::{
    explore, ExploreOptions, GameError, Mdp, MdpExplicit, MinMax, ModelGenerator, PlayerMap,
    RowFilter, Smg, StateSet, TurnBased,
};
use gamecheck_prob::{Distribution, FloatEvaluator};
use proptest::prelude::*;

// ============================================================================
// Coalitions
// ============================================================================

#[test]
fn test_three_player_coalition() {
    let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
    let owners = [1, 2, 3, 3, 1, 2];
    g.add_states(owners);

    g.set_coalition(&["p1"]).unwrap();
    for (s, &owner) in owners.iter().enumerate() {
        let expected = if owner == 1 { 1 } else { 2 };
        assert_eq!(g.player(s), expected, "state {s}");
    }

    g.clear_coalition();
    for (s, &owner) in owners.iter().enumerate() {
        assert_eq!(g.player(s), owner);
    }
}

#[test]
fn test_coalition_by_id_and_name_mixed() {
    let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
    g.add_states([1, 2, 3]);
    g.set_coalition(&["2", "p3"]).unwrap();
    assert_eq!(g.coalition(), Some(&[2, 3][..]));
    assert_eq!((g.player(0), g.player(1), g.player(2)), (2, 1, 1));
}

#[test]
fn test_game_serializes() {
    let mut g = Smg::with_players(PlayerMap::from_names(["p1"]));
    g.add_state(1);
    g.add_choice(0, Distribution::point(0)).unwrap();
    let json = serde_json::to_string(&g).unwrap();
    let back: Smg = serde_json::from_str(&json).unwrap();
    assert_eq!(back, g);
}

// ============================================================================
// Qualitative fixpoints
// ============================================================================

/// Random MDPs: up to 6 states, 1-3 choices each, 1-3 successors per choice.
fn arb_mdp() -> impl Strategy<Value = MdpExplicit> {
    (2usize..7).prop_flat_map(|n| {
        let choice = proptest::collection::vec((0..n, 1u32..5), 1..4);
        let state = proptest::collection::vec(choice, 1..4);
        proptest::collection::vec(state, n).prop_map(move |rows| {
            let mut mdp = MdpExplicit::with_states(n);
            for (s, choices) in rows.into_iter().enumerate() {
                for succ in choices {
                    let total: u32 = succ.iter().map(|&(_, w)| w).sum();
                    let d = Distribution::from_pairs(
                        succ.iter().map(|&(j, w)| (j, w as f64 / total as f64)),
                    )
                    .unwrap();
                    mdp.add_choice(s, d).unwrap();
                }
            }
            mdp
        })
    })
}

/// States that can reach `target` (least fixpoint of the exists-step).
fn reach_some(mdp: &MdpExplicit, target: &StateSet, forall: bool) -> StateSet {
    let n = mdp.num_states();
    let mut u = target.clone();
    loop {
        let mut next = StateSet::new(n);
        mdp.prob0_step(&target.complement(), &u, forall, &mut next);
        next.union_with(target);
        if next == u {
            return u;
        }
        u = next;
    }
}

proptest! {
    #[test]
    fn test_prob0_fixpoint_is_idempotent(
        mdp in arb_mdp(),
        t in 0usize..6,
        forall in any::<bool>()
    ) {
        let n = mdp.num_states();
        let target = StateSet::from_indices(n, [t % n]);
        let u = reach_some(&mdp, &target, forall);

        let mut again = StateSet::new(n);
        mdp.prob0_step(&target.complement(), &u, forall, &mut again);
        again.union_with(&target);
        prop_assert_eq!(again, u);
    }

    #[test]
    fn test_prob1_fixpoint_is_idempotent(
        mdp in arb_mdp(),
        t in 0usize..6,
        forall in any::<bool>()
    ) {
        let n = mdp.num_states();
        let target = StateSet::from_indices(n, [t % n]);
        // greatest fixpoint over u of: reach target while staying in u
        let mut u = StateSet::full(n);
        loop {
            let mut subset = u.clone();
            subset.difference_with(&target);
            let mut v = target.clone();
            loop {
                let mut next = StateSet::new(n);
                mdp.prob1_step(&subset, &u, &v, forall, &mut next);
                next.union_with(&target);
                if next == v {
                    break;
                }
                v = next;
            }
            if v == u {
                break;
            }
            u = v;
        }
        let mut subset = u.clone();
        subset.difference_with(&target);
        let mut again = StateSet::new(n);
        mdp.prob1_step(&subset, &u, &u, forall, &mut again);
        again.union_with(&target);
        prop_assert_eq!(again, u);
    }
}

#[test]
fn test_row_sum_sanity() {
    let mut mdp = MdpExplicit::with_states(2);
    mdp.add_choice(0, Distribution::from_pairs([(0, 0.6), (1, 0.4)]).unwrap())
        .unwrap();
    mdp.add_choice(0, Distribution::from_pairs([(0, 0.1), (1, 0.9)]).unwrap())
        .unwrap();
    mdp.add_choice(1, Distribution::point(1)).unwrap();

    let mut result = vec![0.0; 2];
    mdp.mv_mult_min_max(&[1.0, 1.0], MinMax::Min, &mut result, RowFilter::All);
    assert!((result[0] - 1.0).abs() < 1e-12);

    // only the mass into state 1 counts
    mdp.mv_mult_min_max(&[0.0, 1.0], MinMax::Min, &mut result, RowFilter::All);
    assert!((result[0] - 0.4).abs() < 1e-12);
}

// ============================================================================
// Exploration
// ============================================================================

/// Two players race a counter `x` in 0..=3: the owner of an even state is
/// p1, of an odd state p2. Every player may step (`x'=x+1` w.p. 1/2, else
/// stay) or reset (`x'=0`). At 3 nothing is enabled.
struct Race {
    vars: VarList,
}

impl Race {
    fn new() -> Self {
        let mut vars = VarList::new();
        vars.add(VarDecl::new("x", VarType::Int { low: 0, high: 3 }, Value::Int(0)))
            .unwrap();
        Self { vars }
    }

    fn x(state: &State) -> i64 {
        state.values()[0].as_int().unwrap_or(0)
    }

    fn set(v: Expression) -> Update {
        Update::new()
            .assign(0, "x", v, VarType::Int { low: 0, high: 3 })
            .unwrap()
    }
}

impl ModelGenerator<FloatEvaluator> for Race {
    fn vars(&self) -> &VarList {
        &self.vars
    }

    fn player_names(&self) -> Vec<String> {
        vec!["p1".into(), "p2".into()]
    }

    fn initial_states(&self) -> Result<Vec<State>, GameError> {
        Ok(vec![State::new(self.vars.initial_values())])
    }

    fn owner(&self, state: &State) -> Result<usize, GameError> {
        Ok(if Self::x(state) % 2 == 0 { 1 } else { 2 })
    }

    fn choices(&self, state: &State) -> Result<Vec<Choice<FloatEvaluator>>, GameError> {
        if Self::x(state) == 3 {
            return Ok(Vec::new());
        }
        let mut step = ChoiceBuilder::new(FloatEvaluator);
        step.set_module_or_action_index(-1)?;
        step.add(
            0.5,
            [Self::set(Expression::var(0, "x").plus(Expression::int(1)))],
        )
        .add(0.5, [Self::set(Expression::var(0, "x"))]);

        let mut reset = ChoiceBuilder::new(FloatEvaluator);
        reset.set_module_or_action_index(-1)?;
        reset.add(1.0, [Self::set(Expression::int(0))]);

        Ok(vec![step.build()?, reset.build()?])
    }

    fn transition_reward(&self, _state: &State, choice: &Choice<FloatEvaluator>) -> f64 {
        if choice.size() == 2 {
            1.0
        } else {
            0.0
        }
    }
}

#[test]
fn test_explore_race() {
    let race = Race::new();
    let explored = explore(&race, &ExploreOptions::default()).unwrap();
    let g = &explored.game;

    assert_eq!(g.num_states(), 4);
    assert_eq!(g.initial_states(), &[0]);
    assert_eq!(explored.deadlocks, vec![3]);

    let s1 = explored
        .index_of(&State::new(vec![Value::Int(1)]))
        .unwrap();
    assert_eq!(g.owner(s1), 2);
    assert_eq!(g.num_choices(s1), 2);
    assert_eq!(g.distribution(s1, 0).get(s1), 0.5);
    assert_eq!(g.transition_reward(s1, 0), 1.0);
    assert_eq!(g.transition_reward(s1, 1), 0.0);
    // deadlock fixed with a self-loop
    assert_eq!(g.distribution(3, 0).get(3), 1.0);
}

#[test]
fn test_explore_deadlock_reported() {
    let race = Race::new();
    let options = ExploreOptions {
        fix_deadlocks: false,
        max_states: None,
    };
    let err = explore(&race, &options).unwrap_err();
    assert_eq!(err.to_string(), "Deadlock in state (3)");
}

#[test]
fn test_explore_state_limit() {
    let race = Race::new();
    let options = ExploreOptions {
        fix_deadlocks: true,
        max_states: Some(2),
    };
    assert!(matches!(
        explore(&race, &options),
        Err(GameError::StateSpaceLimit { limit: 2 })
    ));
}

/// A generator whose single choice synchronises two modules with a cyclic
/// primed dependency.
struct Cyclic {
    vars: VarList,
}

impl ModelGenerator<FloatEvaluator> for Cyclic {
    fn vars(&self) -> &VarList {
        &self.vars
    }

    fn player_names(&self) -> Vec<String> {
        vec!["p1".into()]
    }

    fn initial_states(&self) -> Result<Vec<State>, GameError> {
        Ok(vec![State::new(self.vars.initial_values())])
    }

    fn owner(&self, _state: &State) -> Result<usize, GameError> {
        Ok(1)
    }

    fn choices(&self, _state: &State) -> Result<Vec<Choice<FloatEvaluator>>, GameError> {
        let range = VarType::Int { low: 0, high: 9 };
        let mut a = ChoiceBuilder::new(FloatEvaluator);
        a.set_module_or_action_index(1)?;
        let x = Expression::primed(1, "y").plus(Expression::int(1));
        a.add(1.0, [Update::new().assign(0, "x", x, range)?]);
        let mut b = ChoiceBuilder::new(FloatEvaluator);
        b.set_module_or_action_index(1)?;
        let y = Expression::primed(0, "x").plus(Expression::int(1));
        b.add(1.0, [Update::new().assign(1, "y", y, range)?]);
        Ok(vec![compose(&a.build()?, &b.build()?)])
    }
}

#[test]
fn test_explore_surfaces_cyclic_updates() {
    let mut vars = VarList::new();
    for name in ["x", "y"] {
        vars.add(VarDecl::new(name, VarType::Int { low: 0, high: 9 }, Value::Int(0)))
            .unwrap();
    }
    let err = explore(&Cyclic { vars }, &ExploreOptions::default()).unwrap_err();
    assert!(err.to_string().starts_with("Cyclic updates with variables"));
}
