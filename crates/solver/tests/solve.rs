//! End-to-end solving: iteration schemes, termination, queries and
//! equilibria.

use gamecheck_core::{Coalition, EquilibriumCriterion, EquilibriumType, StrategyOperator};
use gamecheck_games::{Mdp, MdpExplicit, PlayerMap, Sides, Smg, StateSet, Stpg, TurnBased};
use gamecheck_prob::Distribution;
use gamecheck_solver::{
    equilibrium, reach_prob, reach_reward, DiffMeasure, EquilibriumChoice, GameQuery, IterMethod,
    MinMax, SolverConfig, SolverError, Termination,
};
use proptest::prelude::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ============================================================================
// Jacobi vs Gauss-Seidel
// ============================================================================

/// Random two-player games: up to 6 states, 1-3 choices, 1-3 successors.
fn arb_stpg() -> impl Strategy<Value = Stpg> {
    (2usize..7).prop_flat_map(|n| {
        let choice = proptest::collection::vec((0..n, 1u32..5), 1..4);
        let state = (1usize..3, proptest::collection::vec(choice, 1..4));
        proptest::collection::vec(state, n).prop_map(move |rows| {
            let mut g = Stpg::new();
            for (player, _) in &rows {
                g.add_state(*player).unwrap();
            }
            for (s, (_, choices)) in rows.into_iter().enumerate() {
                for succ in choices {
                    let total: u32 = succ.iter().map(|&(_, w)| w).sum();
                    let d = Distribution::from_pairs(
                        succ.iter().map(|&(j, w)| (j, w as f64 / total as f64)),
                    )
                    .unwrap();
                    g.add_choice(s, d).unwrap();
                }
            }
            g
        })
    })
}

proptest! {
    #[test]
    fn test_jacobi_and_gauss_seidel_agree(
        g in arb_stpg(),
        t in 0usize..6,
        max in any::<bool>()
    ) {
        let n = g.num_states();
        let target = StateSet::from_indices(n, [t % n]);
        let dir = g.by_player(Sides::opposed(MinMax::from_min(!max)));
        let tight = SolverConfig::new().with_epsilon(1e-12).with_max_iters(100_000);

        let jacobi = tight.clone().with_method(IterMethod::Jacobi);
        let jac = reach_prob(&g, None, &target, dir, &jacobi).unwrap();
        let gs = reach_prob(&g, None, &target, dir, &tight).unwrap();
        prop_assert!(jac.is_converged() && gs.is_converged());
        for s in 0..n {
            prop_assert!((jac.values[s] - gs.values[s]).abs() < 1e-6, "state {}", s);
        }
    }

    #[test]
    fn test_parallel_jacobi_matches_sequential(g in arb_stpg(), t in 0usize..6) {
        let n = g.num_states();
        let target = StateSet::from_indices(n, [t % n]);
        let dir = g.by_player(Sides::opposed(MinMax::Max));
        let config = SolverConfig::new().with_method(IterMethod::Jacobi);

        let seq = reach_prob(&g, None, &target, dir, &config).unwrap();
        let parallel = config.clone().with_parallel(true);
        let par = reach_prob(&g, None, &target, dir, &parallel).unwrap();
        prop_assert_eq!(seq.values, par.values);
        prop_assert_eq!(seq.iterations, par.iterations);
    }
}

// ============================================================================
// Termination
// ============================================================================

/// 0 and 1 pass the token back and forth, each leaking half to 2 (target)
/// or 3 (sink): convergence is geometric, never exact.
fn ping_pong() -> Stpg {
    let mut g = Stpg::new();
    for _ in 0..4 {
        g.add_state(1).unwrap();
    }
    g.add_choice(0, Distribution::from_pairs([(1, 0.5), (2, 0.25), (3, 0.25)]).unwrap())
        .unwrap();
    g.add_choice(1, Distribution::from_pairs([(0, 0.5), (2, 0.25), (3, 0.25)]).unwrap())
        .unwrap();
    g.add_choice(2, Distribution::point(2)).unwrap();
    g.add_choice(3, Distribution::point(3)).unwrap();
    g
}

#[test]
fn test_iteration_cap_is_reported() {
    init_logging();
    let target = StateSet::from_indices(4, [2]);
    let config = SolverConfig::new().with_max_iters(3).with_epsilon(1e-12);
    let r = reach_prob(&ping_pong(), None, &target, MinMax::Max, &config).unwrap();
    assert_eq!(r.iterations, 3);
    assert!(matches!(r.termination, Termination::IterationCap { .. }));
    assert!(matches!(
        r.require_converged(),
        Err(SolverError::NotConverged { iterations: 3, .. })
    ));

    let r = reach_prob(&ping_pong(), None, &target, MinMax::Max, &SolverConfig::default())
        .unwrap()
        .require_converged()
        .unwrap();
    assert!((r.values[0] - 0.5).abs() < 1e-5);
}

#[test]
fn test_time_budget_is_reported() {
    let target = StateSet::from_indices(4, [2]);
    let config = SolverConfig::new()
        .with_epsilon(1e-12)
        .with_time_budget_ms(0);
    let r = reach_prob(&ping_pong(), None, &target, MinMax::Max, &config).unwrap();
    assert_eq!(r.iterations, 1);
    assert!(matches!(r.termination, Termination::TimeBudget { .. }));
}

#[test]
fn test_relative_termination() {
    let target = StateSet::from_indices(4, [2]);
    let config = SolverConfig::new()
        .with_termination(DiffMeasure::Relative)
        .with_method(IterMethod::Jacobi);
    let r = reach_prob(&ping_pong(), None, &target, MinMax::Min, &config).unwrap();
    assert!(r.is_converged());
    assert!((r.values[1] - 0.5).abs() < 1e-5);
}

#[test]
fn test_invalid_config_fails_before_solving() {
    let target = StateSet::from_indices(4, [2]);
    let config = SolverConfig::new().with_epsilon(-1.0);
    assert!(matches!(
        reach_prob(&ping_pong(), None, &target, MinMax::Max, &config),
        Err(SolverError::InvalidConfig { .. })
    ));
}

// ============================================================================
// Queries on multiplayer games
// ============================================================================

/// p1 owns 0, p2 owns 1, p3 owns 2. Each either moves on or drops into
/// the sink 4; state 3 is the goal.
fn relay() -> Smg {
    let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
    g.add_states([1, 2, 3, 1, 1]);
    for s in 0..3 {
        g.add_choice(s, Distribution::point(s + 1)).unwrap();
        g.add_choice(s, Distribution::point(4)).unwrap();
    }
    g.add_choice(3, Distribution::point(3)).unwrap();
    g.add_choice(4, Distribution::point(4)).unwrap();
    g
}

#[test]
fn test_coalition_decides_relay() {
    let target = StateSet::from_indices(5, [3]);
    let config = SolverConfig::new().with_strategy(true);

    let alone = GameQuery::exists(["p1"], MinMax::Max);
    assert_eq!(alone.reach_prob(&relay(), &target, &config).unwrap().value(0), 0.0);

    let all = GameQuery::exists(["p1", "p2", "p3"], MinMax::Max);
    let r = all.reach_prob(&relay(), &target, &config).unwrap();
    assert_eq!(r.value(0), 1.0);

    // [[p2,p3]] Pmin: p2 and p3 maximise, p1 minimises
    let forall = GameQuery::forall(["p2", "p3"], MinMax::Min);
    let r = forall.reach_prob(&relay(), &target, &config).unwrap();
    assert_eq!(r.value(1), 1.0);
    assert_eq!(r.value(0), 0.0);
}

#[test]
fn test_strategy_extraction_without_precomputation() {
    let target = StateSet::from_indices(5, [3]);
    let config = SolverConfig::new()
        .with_strategy(true)
        .with_precomputation(false);
    let query = GameQuery::exists(["p1", "p2", "p3"], MinMax::Max);
    let r = query.reach_prob(&relay(), &target, &config).unwrap();
    let strategy = r.strategy.unwrap();
    assert_eq!(strategy.choice(0), Some(0));
    assert_eq!(strategy.choice(2), Some(0));
    assert_eq!(strategy.choice(3), None);
}

#[test]
fn test_reward_query() {
    let mut g = relay();
    for s in 0..3 {
        g.set_transition_reward(s, 0, 1.0).unwrap();
    }
    let target = StateSet::from_indices(5, [3]);
    let config = SolverConfig::default();

    let all = GameQuery::exists(["*"], MinMax::Min);
    let r = all.reach_reward(&g, &target, &config).unwrap();
    assert!((r.value(0) - 3.0).abs() < 1e-9);
    assert_eq!(r.value(4), f64::INFINITY);

    // p3 can always escape to the sink
    let opposed = GameQuery::exists(["p1", "p2"], MinMax::Min);
    let r = opposed.reach_reward(&g, &target, &config).unwrap();
    assert_eq!(r.value(0), f64::INFINITY);
}

#[test]
fn test_empty_choice_list_is_fatal() {
    let mut g = relay();
    g.add_state(2);
    let target = StateSet::from_indices(6, [3]);
    let query = GameQuery::exists(["p1"], MinMax::Max);
    assert_eq!(
        query
            .reach_prob(&g, &target, &SolverConfig::default())
            .unwrap_err(),
        SolverError::EmptyChoiceList { state: 5 }
    );
    assert!(matches!(
        reach_reward(&g, &target, MinMax::Max, &SolverConfig::default()),
        Err(SolverError::EmptyChoiceList { state: 5 })
    ));
}

#[test]
fn test_zero_weight_outcome_is_not_an_edge() {
    // 0 -> {1: 1.0, 2: 0.0} with reward 1; 2 is a sink
    let mut mdp = MdpExplicit::with_states(3);
    mdp.add_choice(0, Distribution::from_pairs([(1, 1.0), (2, 0.0)]).unwrap())
        .unwrap();
    mdp.set_transition_reward(0, 0, 1.0).unwrap();
    mdp.add_choice(1, Distribution::point(1)).unwrap();
    mdp.add_choice(2, Distribution::point(2)).unwrap();
    let target = StateSet::from_indices(3, [1]);

    let r = reach_reward(&mdp, &target, MinMax::Min, &SolverConfig::default()).unwrap();
    assert_eq!(r.value(0), 1.0);
    assert!(r.values.iter().all(|v| !v.is_nan()));

    let p = reach_prob(&mdp, None, &target, MinMax::Min, &SolverConfig::default()).unwrap();
    assert_eq!(p.value(0), 1.0);
}

/// 0: [stay, go to 1]; 1: [stay, go to the target 2].
fn stay_or_go() -> MdpExplicit {
    let mut mdp = MdpExplicit::with_states(3);
    for s in 0..2 {
        mdp.add_choice(s, Distribution::point(s)).unwrap();
        mdp.add_choice(s, Distribution::point(s + 1)).unwrap();
    }
    mdp.add_choice(2, Distribution::point(2)).unwrap();
    mdp
}

#[test]
fn test_maximising_strategy_reaches_target() {
    let target = StateSet::from_indices(3, [2]);
    for precomputation in [true, false] {
        let config = SolverConfig::new()
            .with_strategy(true)
            .with_precomputation(precomputation);
        let r = reach_prob(&stay_or_go(), None, &target, MinMax::Max, &config).unwrap();
        assert_eq!(r.value(0), 1.0);
        let strategy = r.strategy.unwrap();
        assert_eq!(strategy.optimal_choices(0), &[0, 1]);
        assert_eq!(strategy.choice(0), Some(1));
        assert_eq!(strategy.choice(1), Some(1));
        assert_eq!(strategy.choice(2), None);
    }

    let config = SolverConfig::new().with_strategy(true);
    let min = reach_prob(&stay_or_go(), None, &target, MinMax::Min, &config).unwrap();
    assert_eq!(min.value(0), 0.0);
    assert_eq!(min.strategy.unwrap().choice(0), Some(0));
}

// ============================================================================
// Equilibria
// ============================================================================

/// State 0 belongs to p3, outside both coalitions, and picks a split:
///   a: (1.0, 0.5)   b: (0.6, 0.6)   c: (0.0, 1.0)
/// Terminal states: 1 in both targets, 2 in target 0 only, 3 in target 1
/// only, 4 in neither.
fn splits() -> Smg {
    let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
    g.add_states([3, 1, 1, 2, 2]);
    g.add_choice(0, Distribution::from_pairs([(1, 0.5), (2, 0.5)]).unwrap())
        .unwrap();
    g.add_choice(0, Distribution::from_pairs([(1, 0.6), (4, 0.4)]).unwrap())
        .unwrap();
    g.add_choice(0, Distribution::point(3)).unwrap();
    for s in 1..5 {
        g.add_choice(s, Distribution::point(s)).unwrap();
    }
    g
}

fn split_targets() -> Vec<StateSet> {
    vec![
        StateSet::from_indices(5, [1, 2]),
        StateSet::from_indices(5, [1, 3]),
    ]
}

fn operator(options: &[&str]) -> StrategyOperator {
    let mut op = StrategyOperator::exists()
        .with_coalitions(vec![Coalition::of(["p1"]), Coalition::of(["p2"])]);
    op.process_options(options).unwrap();
    op
}

#[test]
fn test_social_and_fair_differ() {
    init_logging();
    let config = SolverConfig::default();
    let targets = split_targets();

    let social = GameQuery::new(operator(&["nash", "social"]), MinMax::Max)
        .equilibrium_reach(&splits(), &targets, &config)
        .unwrap()
        .require_converged()
        .unwrap();
    assert_eq!(social.choices[0], Some(EquilibriumChoice::Pure(0)));
    assert_eq!(social.profile(0), vec![1.0, 0.5]);
    assert_eq!(social.choices[1], None);

    let fair = GameQuery::new(operator(&["nash", "fair"]), MinMax::Max)
        .equilibrium_reach(&splits(), &targets, &config)
        .unwrap();
    assert_eq!(fair.choices[0], Some(EquilibriumChoice::Pure(1)));
    assert!((fair.payoff(0, 0) - 0.6).abs() < 1e-12);
    assert!((fair.payoff(1, 0) - 0.6).abs() < 1e-12);
}

#[test]
fn test_correlated_fair_mixes() {
    // without b, the fairest point is halfway between a and c
    let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2", "p3"]));
    g.add_states([3, 1, 2]);
    g.add_choice(0, Distribution::point(1)).unwrap();
    g.add_choice(0, Distribution::point(2)).unwrap();
    g.add_choice(1, Distribution::point(1)).unwrap();
    g.add_choice(2, Distribution::point(2)).unwrap();
    let targets = vec![StateSet::from_indices(3, [1]), StateSet::from_indices(3, [2])];
    let coalitions = vec![vec![1], vec![2]];
    let config = SolverConfig::default();

    let r = equilibrium::solve(
        &g,
        &coalitions,
        &targets,
        EquilibriumType::Correlated,
        EquilibriumCriterion::Fair,
        &config,
    )
    .unwrap();
    match r.choices[0] {
        Some(EquilibriumChoice::Mixed {
            first: 0,
            second: 1,
            weight,
        }) => assert!((weight - 0.5).abs() < 1e-12),
        other => panic!("expected a mixture, got {other:?}"),
    }
    assert!((r.payoff(0, 0) - 0.5).abs() < 1e-12);

    let nash = equilibrium::solve(
        &g,
        &coalitions,
        &targets,
        EquilibriumType::Nash,
        EquilibriumCriterion::Fair,
        &config,
    )
    .unwrap();
    assert_eq!(nash.choices[0], Some(EquilibriumChoice::Pure(0)));
}

#[test]
fn test_nash_owner_plays_for_itself() {
    // p1 owns 0 and prefers its own target even though b helps p2 more
    let mut g = splits();
    g.set_player(0, 1).unwrap();
    let r = equilibrium::solve(
        &g,
        &[vec![1], vec![2]],
        &split_targets(),
        EquilibriumType::Nash,
        EquilibriumCriterion::Fair,
        &SolverConfig::default(),
    )
    .unwrap();
    assert_eq!(r.choices[0], Some(EquilibriumChoice::Pure(0)));
}

#[test]
fn test_equilibrium_methods_agree_on_loops() {
    // 0 (p1) either retries via 1 (p2) or settles; 1 may bounce back
    let mut g = Smg::with_players(PlayerMap::from_names(["p1", "p2"]));
    g.add_states([1, 2, 1, 1]);
    g.add_choice(0, Distribution::from_pairs([(1, 0.5), (2, 0.5)]).unwrap())
        .unwrap();
    g.add_choice(0, Distribution::point(3)).unwrap();
    g.add_choice(1, Distribution::from_pairs([(0, 0.5), (3, 0.5)]).unwrap())
        .unwrap();
    g.add_choice(1, Distribution::point(2)).unwrap();
    g.add_choice(2, Distribution::point(2)).unwrap();
    g.add_choice(3, Distribution::point(3)).unwrap();
    let targets = vec![StateSet::from_indices(4, [2]), StateSet::from_indices(4, [3])];
    let coalitions = vec![vec![1], vec![2]];

    let solve = |method| {
        let config = SolverConfig::new().with_method(method).with_epsilon(1e-12);
        equilibrium::solve(
            &g,
            &coalitions,
            &targets,
            EquilibriumType::Nash,
            EquilibriumCriterion::Social,
            &config,
        )
        .unwrap()
        .require_converged()
        .unwrap()
    };
    let jac = solve(IterMethod::Jacobi);
    let gs = solve(IterMethod::GaussSeidel);
    for k in 0..2 {
        for s in 0..4 {
            assert!((jac.payoff(k, s) - gs.payoff(k, s)).abs() < 1e-9);
        }
    }
}

#[test]
fn test_equilibrium_query_errors() {
    let config = SolverConfig::default();
    let one_target = vec![StateSet::from_indices(5, [1])];
    let err = GameQuery::new(operator(&["nash"]), MinMax::Max)
        .equilibrium_reach(&splits(), &one_target, &config)
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidQuery { .. }));

    let plain = GameQuery::exists(["p1"], MinMax::Max);
    assert!(plain
        .equilibrium_reach(&splits(), &split_targets(), &config)
        .is_err());

    let overlap = equilibrium::solve(
        &splits(),
        &[vec![1, 2], vec![2]],
        &split_targets(),
        EquilibriumType::Nash,
        EquilibriumCriterion::Social,
        &config,
    );
    assert_eq!(
        overlap.unwrap_err().to_string(),
        "Invalid query: player 2 is in coalitions 0 and 1"
    );
}
