//! Jacobi-preconditioned BiCGStab for unsymmetric dense systems

use super::{Mat, Vector};

const BREAKDOWN: f64 = 1e-30;

/// BiCGStab configuration
#[derive(Debug, Clone, Copy)]
pub struct BiCgStabConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative residual ||b - Ax|| / ||b|| at which iteration stops
    pub tolerance: f64,
}

impl Default for BiCgStabConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
        }
    }
}

/// BiCGStab result
#[derive(Debug, Clone)]
pub struct BiCgStabSolution {
    pub x: Vector,
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    pub converged: bool,
}

/// Inverse-diagonal preconditioner
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vector,
}

impl JacobiPreconditioner {
    pub fn from_matrix(a: &Mat) -> Self {
        let n = a.nrows().min(a.ncols());
        let inv_diag = Vector::from_iterator(
            n,
            (0..n).map(|i| {
                let d = a[(i, i)];
                // Fallback for vanishing diagonal entries
                if d.abs() < 1e-15 || !d.is_finite() {
                    1.0
                } else {
                    1.0 / d
                }
            }),
        );
        Self { inv_diag }
    }

    #[inline]
    pub fn apply(&self, r: &Vector) -> Vector {
        r.component_mul(&self.inv_diag)
    }
}

/// Solve `a x = b` with right-preconditioned BiCGStab.
///
/// `x0` seeds the iteration when its length matches; otherwise the
/// iteration starts from zero.
pub fn bicgstab(a: &Mat, b: &Vector, x0: Option<&Vector>, config: &BiCgStabConfig) -> BiCgStabSolution {
    let n = b.len();
    let precond = JacobiPreconditioner::from_matrix(a);

    let mut x = match x0 {
        Some(guess) if guess.len() == n => guess.clone(),
        _ => Vector::zeros(n),
    };

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return BiCgStabSolution {
            x: Vector::zeros(n),
            iterations: 0,
            residual: 0.0,
            converged: true,
        };
    }

    let mut r = b - a * &x;
    let mut residual = r.norm() / b_norm;
    if residual < config.tolerance {
        return BiCgStabSolution { x, iterations: 0, residual, converged: true };
    }

    let r_hat = r.clone();
    let mut rho = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;
    let mut p = Vector::zeros(n);
    let mut v = Vector::zeros(n);

    for iter in 0..config.max_iterations {
        let rho_new = r_hat.dot(&r);
        if rho_new.abs() < BREAKDOWN {
            return BiCgStabSolution { x, iterations: iter, residual, converged: false };
        }

        let beta = (rho_new / rho) * (alpha / omega);
        rho = rho_new;

        // p = r + beta (p - omega v)
        p.axpy(-omega, &v, 1.0);
        p = &r + beta * &p;

        let p_hat = precond.apply(&p);
        v = a * &p_hat;

        let r_hat_v = r_hat.dot(&v);
        if r_hat_v.abs() < BREAKDOWN {
            return BiCgStabSolution { x, iterations: iter, residual, converged: false };
        }
        alpha = rho / r_hat_v;

        let s = &r - alpha * &v;
        let s_norm = s.norm() / b_norm;
        if s_norm < config.tolerance {
            x.axpy(alpha, &p_hat, 1.0);
            return BiCgStabSolution {
                x,
                iterations: iter + 1,
                residual: s_norm,
                converged: true,
            };
        }

        let s_hat = precond.apply(&s);
        let t = a * &s_hat;
        let tt = t.dot(&t);
        if tt < BREAKDOWN {
            return BiCgStabSolution { x, iterations: iter, residual, converged: false };
        }
        omega = t.dot(&s) / tt;

        x.axpy(alpha, &p_hat, 1.0);
        x.axpy(omega, &s_hat, 1.0);
        r = s - omega * &t;

        residual = r.norm() / b_norm;
        if !residual.is_finite() {
            return BiCgStabSolution { x, iterations: iter + 1, residual, converged: false };
        }
        if residual < config.tolerance {
            return BiCgStabSolution {
                x,
                iterations: iter + 1,
                residual,
                converged: true,
            };
        }
        if omega.abs() < BREAKDOWN {
            return BiCgStabSolution { x, iterations: iter + 1, residual, converged: false };
        }
    }

    BiCgStabSolution {
        x,
        iterations: config.max_iterations,
        residual,
        converged: false,
    }
}
