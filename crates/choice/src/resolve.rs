//! Target-state computation.
//!
//! Without primed reads every assignment reads the current state only, so
//! the updates are applied in order onto a copy of it.
//!
//! With primed reads (`x' = y' + 1`) an assignment may depend on values of
//! the state under construction. Assignments become nodes of a dependency
//! graph with an edge `y -> x` whenever `x`'s right-hand side reads `y'` and
//! `y` is assigned in the same transition. Passes over the graph evaluate
//! every node whose predecessors are all resolved; a pass that resolves
//! nothing means the remaining nodes sit on a cycle.

use gamecheck_core::{CoreError, EvalContext, State};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::ChoiceError;
use crate::update::{Update, UpdateElement};

/// Apply `updates` in order; every right-hand side reads `state`.
pub(crate) fn compute_target_simple(
    updates: &[Arc<Update>],
    state: &State,
) -> Result<State, ChoiceError> {
    let mut next = state.to_scratch();
    for update in updates {
        update
            .apply(state.values(), &mut next)
            .map_err(|source| ChoiceError::Evaluation {
                state: state.to_string(),
                source,
            })?;
    }
    Ok(State::new(next))
}

/// Dependency-ordered evaluation for updates that read primed variables.
pub(crate) fn compute_target_with_primes(
    updates: &[Arc<Update>],
    state: &State,
) -> Result<State, ChoiceError> {
    let graph = dependency_graph(updates, state)?;

    let mut next = state.to_scratch();
    let mut resolved = vec![false; graph.node_count()];
    let mut remaining = graph.node_count();

    while remaining > 0 {
        let before = remaining;
        for node in graph.node_indices() {
            if resolved[node.index()] {
                continue;
            }
            let ready = graph
                .neighbors_directed(node, Direction::Incoming)
                .all(|dep| resolved[dep.index()]);
            if !ready {
                continue;
            }
            let element = graph[node];
            let value = element
                .evaluate(&EvalContext::with_next(state.values(), &next))
                .map_err(|source| ChoiceError::Evaluation {
                    state: state.to_string(),
                    source,
                })?;
            let count = next.len();
            let slot = next
                .get_mut(element.var_index)
                .ok_or(ChoiceError::Core(CoreError::VariableOutOfRange {
                    index: element.var_index,
                    count,
                }))?;
            *slot = value;
            resolved[node.index()] = true;
            remaining -= 1;
        }

        if remaining == before {
            let variables = graph
                .node_indices()
                .filter(|n| !resolved[n.index()])
                .map(|n| graph[n].var_name.clone())
                .collect();
            return Err(ChoiceError::CyclicUpdates {
                variables,
                state: state.to_string(),
            });
        }
    }

    Ok(State::new(next))
}

/// One node per assigned variable; edges run from a primed-read variable to
/// the assignment reading it.
fn dependency_graph<'a>(
    updates: &'a [Arc<Update>],
    state: &State,
) -> Result<DiGraph<&'a UpdateElement, ()>, ChoiceError> {
    let mut graph: DiGraph<&UpdateElement, ()> = DiGraph::new();
    let mut by_var: FxHashMap<usize, NodeIndex> = FxHashMap::default();

    for element in updates.iter().flat_map(|u| u.elements()) {
        if by_var.contains_key(&element.var_index) {
            return Err(ChoiceError::MultipleUpdates {
                variable: element.var_name.clone(),
                state: state.to_string(),
            });
        }
        let node = graph.add_node(element);
        by_var.insert(element.var_index, node);
    }

    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    for node in nodes {
        for read in graph[node].expr.primed_vars() {
            if let Some(&dep) = by_var.get(&read) {
                graph.add_edge(dep, node, ());
            }
        }
    }

    Ok(graph)
}
