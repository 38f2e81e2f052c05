//! Choices: weighted lists of update-lists, owned by one module or action.
//!
//! A [`Choice`] is immutable. Build one with a [`ChoiceBuilder`]; combine
//! two with [`compose`](crate::compose). Element `i` pairs a probability
//! (or rate) with the list of updates applied together when that outcome
//! fires. The updates are shared behind `Arc` so composition never copies
//! expression trees.

use gamecheck_core::{CoreError, Expression, State, VarList};
use gamecheck_prob::Evaluator;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::error::ChoiceError;
use crate::resolve;
use crate::update::Update;

// ============================================================================
// Module / action index
// ============================================================================

/// Who generated a choice: a single module acting alone, or a synchronising
/// action shared by several modules. Indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleOrAction {
    Module(usize),
    Action(usize),
}

impl ModuleOrAction {
    /// Decode the signed one-based encoding: `-i` is module `i`, `+i` is
    /// action `i`. Zero is invalid.
    pub fn from_encoded(index: i32) -> Result<Self, ChoiceError> {
        match index {
            0 => Err(ChoiceError::InvalidModuleOrAction { index }),
            i if i < 0 => Ok(ModuleOrAction::Module((-(i as i64) - 1) as usize)),
            i => Ok(ModuleOrAction::Action((i - 1) as usize)),
        }
    }

    /// The signed one-based encoding accepted by [`from_encoded`](Self::from_encoded).
    pub fn encoded(&self) -> i32 {
        match *self {
            ModuleOrAction::Module(m) => -(m as i32) - 1,
            ModuleOrAction::Action(a) => a as i32 + 1,
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, ModuleOrAction::Action(_))
    }
}

// ============================================================================
// Elements
// ============================================================================

/// One outcome: a probability and the updates it applies.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Outcome<V> {
    pub(crate) probability: V,
    pub(crate) updates: Vec<Arc<Update>>,
}

// ============================================================================
// Builder
// ============================================================================

/// Mutable staging area for a [`Choice`].
#[derive(Debug, Clone)]
pub struct ChoiceBuilder<E: Evaluator> {
    pub(crate) eval: E,
    pub(crate) module_or_action: Option<ModuleOrAction>,
    pub(crate) outcomes: Vec<Outcome<E::Value>>,
    pub(crate) clock_guard: Option<Expression>,
}

impl<E: Evaluator> ChoiceBuilder<E> {
    pub fn new(eval: E) -> Self {
        Self {
            eval,
            module_or_action: None,
            outcomes: Vec::new(),
            clock_guard: None,
        }
    }

    /// Append an outcome with weight `probability` applying `updates`.
    pub fn add(
        &mut self,
        probability: E::Value,
        updates: impl IntoIterator<Item = Update>,
    ) -> &mut Self {
        self.outcomes.push(Outcome {
            probability,
            updates: updates.into_iter().map(Arc::new).collect(),
        });
        self
    }

    /// Set the owning module/action from its signed encoding.
    pub fn set_module_or_action_index(&mut self, index: i32) -> Result<&mut Self, ChoiceError> {
        self.module_or_action = Some(ModuleOrAction::from_encoded(index)?);
        Ok(self)
    }

    pub fn set_module_or_action(&mut self, owner: ModuleOrAction) -> &mut Self {
        self.module_or_action = Some(owner);
        self
    }

    /// Set the clock guard (real-time models only).
    pub fn set_clock_guard(&mut self, guard: Expression) -> &mut Self {
        self.clock_guard = Some(guard);
        self
    }

    /// Multiply every outcome's probability by `factor`.
    pub fn scale_probabilities_by(&mut self, factor: &E::Value) -> &mut Self {
        for outcome in &mut self.outcomes {
            outcome.probability = self.eval.multiply(&outcome.probability, factor);
        }
        self
    }

    pub fn size(&self) -> usize {
        self.outcomes.len()
    }

    /// Freeze into an immutable [`Choice`].
    pub fn build(self) -> Result<Choice<E>, ChoiceError> {
        let module_or_action = self
            .module_or_action
            .ok_or(ChoiceError::MissingModuleOrAction)?;
        Ok(Choice::from_parts(
            self.eval,
            module_or_action,
            self.outcomes,
            self.clock_guard,
        ))
    }
}

// ============================================================================
// Choice
// ============================================================================

/// An immutable probabilistic choice.
#[derive(Debug, Clone)]
pub struct Choice<E: Evaluator> {
    pub(crate) eval: E,
    pub(crate) module_or_action: ModuleOrAction,
    pub(crate) outcomes: Vec<Outcome<E::Value>>,
    pub(crate) clock_guard: Option<Expression>,
    contains_primes: bool,
}

impl<E: Evaluator> Choice<E> {
    pub(crate) fn from_parts(
        eval: E,
        module_or_action: ModuleOrAction,
        outcomes: Vec<Outcome<E::Value>>,
        clock_guard: Option<Expression>,
    ) -> Self {
        let contains_primes = outcomes
            .iter()
            .flat_map(|o| o.updates.iter())
            .any(|u| u.contains_primes());
        Self {
            eval,
            module_or_action,
            outcomes,
            clock_guard,
            contains_primes,
        }
    }

    /// Copy back into a builder for further modification.
    pub fn to_builder(&self) -> ChoiceBuilder<E> {
        ChoiceBuilder {
            eval: self.eval.clone(),
            module_or_action: Some(self.module_or_action),
            outcomes: self.outcomes.clone(),
            clock_guard: self.clock_guard.clone(),
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.eval
    }

    pub fn module_or_action(&self) -> ModuleOrAction {
        self.module_or_action
    }

    pub fn clock_guard(&self) -> Option<&Expression> {
        self.clock_guard.as_ref()
    }

    /// Number of outcomes.
    pub fn size(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Does any update read a primed variable? Decided once at construction.
    pub fn contains_primes(&self) -> bool {
        self.contains_primes
    }

    fn outcome(&self, i: usize) -> Result<&Outcome<E::Value>, ChoiceError> {
        self.outcomes.get(i).ok_or(ChoiceError::ElementOutOfRange {
            index: i,
            size: self.outcomes.len(),
        })
    }

    pub fn probability(&self, i: usize) -> Result<&E::Value, ChoiceError> {
        Ok(&self.outcome(i)?.probability)
    }

    pub fn updates(&self, i: usize) -> Result<&[Arc<Update>], ChoiceError> {
        Ok(&self.outcome(i)?.updates)
    }

    /// Sum of all outcome probabilities.
    pub fn probability_sum(&self) -> E::Value {
        self.eval.sum(self.outcomes.iter().map(|o| &o.probability))
    }

    /// Index of the outcome whose cumulative-probability bucket contains
    /// `x`.
    ///
    /// Buckets are half-open: with probabilities `[0.3, 0.7]`, `x = 0.29`
    /// selects 0 and `x = 0.3` selects 1. Points at or beyond the sum select
    /// the last outcome; negative points are rejected.
    pub fn index_by_probability_sum(&self, x: &E::Value) -> Result<usize, ChoiceError> {
        let zero = self.eval.zero();
        if self.outcomes.is_empty() || !self.eval.geq(x, &zero) {
            return Err(ChoiceError::SampleOutOfRange { x: x.to_string() });
        }
        let mut acc = zero;
        let mut i = 0;
        while i < self.outcomes.len() && self.eval.geq(x, &acc) {
            acc = self.eval.add(&acc, &self.outcomes[i].probability);
            i += 1;
        }
        Ok(i - 1)
    }

    /// Draw an outcome index with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, ChoiceError> {
        let total = self.eval.to_f64(&self.probability_sum());
        let x = self.eval.from_f64(rng.gen::<f64>() * total)?;
        self.index_by_probability_sum(&x)
    }

    /// The successor of `state` reached through outcome `i`.
    pub fn compute_target(&self, i: usize, state: &State) -> Result<State, ChoiceError> {
        let updates = &self.outcome(i)?.updates;
        if self.contains_primes {
            resolve::compute_target_with_primes(updates, state)
        } else {
            resolve::compute_target_simple(updates, state)
        }
    }

    /// Variables assigned by outcome `i` with the values they take from
    /// `state`, e.g. `(x'=3)&(y'=2)`.
    pub fn update_string(&self, i: usize, state: &State) -> Result<String, ChoiceError> {
        let target = self.compute_target(i, state)?;
        let mut out = String::new();
        for update in &self.outcome(i)?.updates {
            for element in update.elements() {
                if !out.is_empty() {
                    out.push('&');
                }
                let value = target.get(element.var_index)?;
                out.push_str(&format!("({}'={})", element.var_name, value));
            }
        }
        Ok(out)
    }

    /// Symbolic form of outcome `i`'s updates.
    pub fn update_string_full(&self, i: usize) -> Result<String, ChoiceError> {
        let strings: Vec<String> = self
            .outcome(i)?
            .updates
            .iter()
            .map(|u| u.to_string())
            .collect();
        Ok(strings.join(" & "))
    }

    /// Fail if any outcome, taken from `state`, errors or leaves a variable
    /// outside its declared range.
    pub fn check_for_errors(&self, state: &State, vars: &VarList) -> Result<(), ChoiceError> {
        for i in 0..self.outcomes.len() {
            let target = self.compute_target(i, state)?;
            for update in &self.outcomes[i].updates {
                for element in update.elements() {
                    let value = target.get(element.var_index)?;
                    vars.check_in_range(element.var_index, value)
                        .map_err(|e| match e {
                            CoreError::ValueOutOfRange { variable, value } => {
                                ChoiceError::OutOfRange {
                                    variable,
                                    value,
                                    state: state.to_string(),
                                }
                            }
                            other => ChoiceError::from(other),
                        })?;
                }
            }
        }
        Ok(())
    }
}

impl<E: Evaluator> fmt::Display for Choice<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(guard) = &self.clock_guard {
            write!(f, "({guard}) ")?;
        }
        for (i, outcome) in self.outcomes.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}:", outcome.probability)?;
            if outcome.updates.is_empty() {
                write!(f, "true")?;
            }
            for (k, update) in outcome.updates.iter().enumerate() {
                if k > 0 {
                    write!(f, " & ")?;
                }
                write!(f, "{update}")?;
            }
        }
        Ok(())
    }
}
