//! Dense direct solve for the influence system

use super::{Mat, Vector};
use crate::error::{BEMError, BEMResult};

/// Smallest admissible |u_ii| / max |u_jj| on the LU diagonal
pub const PIVOT_RATIO_LIMIT: f64 = 1e-14;

/// Solve `a x = b` with partially pivoted LU.
///
/// Fails with `SingularMatrix` when a pivot collapses relative to the
/// largest one, and with `NonFinite` if the solution is not finite.
pub fn solve_lu(a: &Mat, b: &Vector) -> BEMResult<Vector> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(BEMError::DimensionMismatch { expected: n, got: a.ncols() });
    }
    if b.len() != n {
        return Err(BEMError::DimensionMismatch { expected: n, got: b.len() });
    }
    if n == 0 {
        return Ok(Vector::zeros(0));
    }

    let lu = a.clone().lu();
    let u = lu.u();

    let mut max_pivot: f64 = 0.0;
    let mut min_pivot = f64::INFINITY;
    for i in 0..n {
        let p = u[(i, i)].abs();
        max_pivot = max_pivot.max(p);
        min_pivot = min_pivot.min(p);
    }
    if !max_pivot.is_finite() {
        return Err(BEMError::NonFinite("LU factorisation".to_string()));
    }
    if max_pivot == 0.0 || min_pivot / max_pivot < PIVOT_RATIO_LIMIT {
        return Err(BEMError::SingularMatrix(format!(
            "pivot ratio {:.3e} below {:.0e}",
            if max_pivot == 0.0 { 0.0 } else { min_pivot / max_pivot },
            PIVOT_RATIO_LIMIT
        )));
    }

    let x = lu
        .solve(b)
        .ok_or_else(|| BEMError::SingularMatrix("LU back-substitution failed".to_string()))?;

    if x.iter().any(|v| !v.is_finite()) {
        return Err(BEMError::NonFinite("direct solution".to_string()));
    }
    Ok(x)
}

/// Largest admissible lower bound on the condition number, see
/// `condition_lower_bound`
pub const CONDITION_LIMIT: f64 = 1e12;

/// Lower bound on the infinity-norm condition number of `a` from one
/// solved system: ||A|| ||x|| / ||b|| <= ||A|| ||A^-1||. Zero for a zero
/// right-hand side.
pub fn condition_lower_bound(a: &Mat, x: &Vector, b: &Vector) -> f64 {
    let b_norm = b.amax();
    if b_norm == 0.0 {
        return 0.0;
    }
    let a_norm = a
        .row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max);
    a_norm * x.amax() / b_norm
}

/// Reject a solution whose system is numerically singular even though
/// every pivot passed
pub fn check_conditioning(a: &Mat, x: &Vector, b: &Vector) -> BEMResult<f64> {
    let estimate = condition_lower_bound(a, x, b);
    if !(estimate <= CONDITION_LIMIT) {
        return Err(BEMError::NumericalSingularity(format!(
            "condition number at least {:.3e} (limit {:.0e})",
            estimate, CONDITION_LIMIT
        )));
    }
    Ok(estimate)
}
