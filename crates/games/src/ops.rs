//! Row kernels shared by every model's single-step operations.

use gamecheck_prob::Distribution;

use crate::model::MinMax;

/// Relative tolerance under which two choice values count as tied.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// Are `a` and `b` equal up to [`TIE_TOLERANCE`]?
pub fn doubles_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= TIE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// `forall`: does `pred` hold for every choice? Otherwise: for some choice?
pub(crate) fn quantify(n: usize, forall: bool, mut pred: impl FnMut(usize) -> bool) -> bool {
    if forall {
        (0..n).all(&mut pred)
    } else {
        (0..n).any(&mut pred)
    }
}

/// `Σ_j p_j·vect[j]`.
pub(crate) fn row_value(dist: &Distribution, vect: &[f64]) -> f64 {
    dist.iter().map(|(j, p)| p * vect[j]).sum()
}

/// Best value over `n` choices; 0 for a state without choices.
pub(crate) fn best(n: usize, dir: MinMax, mut value: impl FnMut(usize) -> f64) -> f64 {
    let mut best: Option<f64> = None;
    for i in 0..n {
        let v = value(i);
        best = match best {
            Some(b) if !dir.better(v, b) => Some(b),
            _ => Some(v),
        };
    }
    best.unwrap_or(0.0)
}

/// Indices of the choices whose value is (close to) `val`.
pub(crate) fn ties(n: usize, val: f64, mut value: impl FnMut(usize) -> f64) -> Vec<usize> {
    (0..n).filter(|&i| doubles_close(value(i), val)).collect()
}

/// `(reward + Σ_{j≠s} p_j·vect[j]) / (1 - p_s)`, or `None` when the
/// choice is a pure self-loop.
pub(crate) fn jacobi_value(
    s: usize,
    dist: &Distribution,
    vect: &[f64],
    reward: f64,
) -> Option<f64> {
    let mut d = reward;
    let mut diag = 1.0;
    for (j, p) in dist.iter() {
        if j == s {
            diag -= p;
        } else {
            d += p * vect[j];
        }
    }
    (diag > 0.0).then(|| d / diag)
}
