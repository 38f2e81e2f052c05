//! Product composition of choices.
//!
//! Synchronising modules on a shared action takes the product of their
//! choices: every pair of outcomes becomes one outcome whose probability is
//! the product and whose update list is the concatenation. Outcomes of the
//! right operand vary slowest, so with `a = [a0, a1]` and `b = [b0, b1]` the
//! result is `[a0·b0, a1·b0, a0·b1, a1·b1]`.

use gamecheck_core::Expression;
use gamecheck_prob::Evaluator;

use crate::choice::{Choice, ChoiceBuilder, Outcome};

fn product<E: Evaluator>(
    eval: &E,
    a: &[Outcome<E::Value>],
    b: &[Outcome<E::Value>],
) -> Vec<Outcome<E::Value>> {
    if b.is_empty() {
        return a.to_vec();
    }
    if a.is_empty() {
        return b.to_vec();
    }
    let mut out = Vec::with_capacity(a.len() * b.len());
    for right in b {
        for left in a {
            let mut updates = Vec::with_capacity(left.updates.len() + right.updates.len());
            updates.extend(left.updates.iter().cloned());
            updates.extend(right.updates.iter().cloned());
            out.push(Outcome {
                probability: eval.multiply(&right.probability, &left.probability),
                updates,
            });
        }
    }
    out
}

fn conjoin_guards(a: Option<&Expression>, b: Option<&Expression>) -> Option<Expression> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Expression::and(a.clone(), b.clone())),
        (Some(g), None) | (None, Some(g)) => Some(g.clone()),
        (None, None) => None,
    }
}

/// The product of `a` and `b`, owned by `a`'s module/action.
///
/// Clock guards are conjoined. Composing with an empty choice returns the
/// other operand's outcomes unchanged.
pub fn compose<E: Evaluator>(a: &Choice<E>, b: &Choice<E>) -> Choice<E> {
    Choice::from_parts(
        a.eval.clone(),
        a.module_or_action,
        product(&a.eval, &a.outcomes, &b.outcomes),
        conjoin_guards(a.clock_guard.as_ref(), b.clock_guard.as_ref()),
    )
}

impl<E: Evaluator> ChoiceBuilder<E> {
    /// Replace this builder's outcomes with their product with `other`'s.
    pub fn product_with(&mut self, other: &Choice<E>) -> &mut Self {
        self.outcomes = product(&self.eval, &self.outcomes, &other.outcomes);
        self.clock_guard = conjoin_guards(self.clock_guard.as_ref(), other.clock_guard.as_ref());
        self
    }
}
