//! Direct / iterative solve policy with solution caching and warm start

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{BemConfig, SolverOptions};
use crate::error::{BEMError, BEMResult};
use crate::math::{bicgstab, check_conditioning, solve_lu, BiCgStabConfig, Mat, Vector};

/// Upper bound on matrix entries sampled for the solution cache key
const HASH_SAMPLES: usize = 4096;

/// How a system was solved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMethod {
    DirectLu,
    BiCgStab,
}

/// Diagnostics of the last `solve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub method: SolveMethod,
    pub dofs: usize,
    pub iterations: usize,
    pub residual: f64,
    pub cache_hit: bool,
    pub warm_started: bool,
    /// Lower bound on the condition number of the system
    pub condition_estimate: f64,
}

/// Solves the influence system. Holds mutable cache and warm-start state,
/// so one instance serves one caller at a time.
#[derive(Debug, Clone)]
pub struct MatrixSolverService {
    direct_threshold: usize,
    tolerance: f64,
    max_iterations: usize,
    caching_enabled: bool,
    cache: Option<(blake3::Hash, Vector)>,
    previous_solution: Option<Vector>,
    last_report: Option<SolveReport>,
}

impl MatrixSolverService {
    pub fn new(direct_threshold: usize, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            direct_threshold,
            tolerance,
            max_iterations,
            caching_enabled: true,
            cache: None,
            previous_solution: None,
            last_report: None,
        }
    }

    pub fn from_settings(options: &SolverOptions, config: &BemConfig) -> Self {
        let mut service = Self::new(config.direct_solver_threshold, options.tolerance, options.max_iterations);
        service.caching_enabled = config.caching_enabled;
        service
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    /// Re-apply settings, keeping warm-start state
    pub fn configure(&mut self, options: &SolverOptions, config: &BemConfig) {
        self.direct_threshold = config.direct_solver_threshold;
        self.tolerance = options.tolerance;
        self.max_iterations = options.max_iterations;
        self.caching_enabled = config.caching_enabled;
        if !self.caching_enabled {
            self.cache = None;
        }
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    /// Forget the cached solution and the warm-start vector
    pub fn clear_cache(&mut self) {
        self.cache = None;
        self.previous_solution = None;
    }

    pub fn solve(&mut self, a: &Mat, b: &Vector) -> BEMResult<Vector> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(BEMError::DimensionMismatch { expected: n, got: a.ncols() });
        }
        if b.len() != n {
            return Err(BEMError::DimensionMismatch { expected: n, got: b.len() });
        }

        let key = sampled_hash(a, b);
        if self.caching_enabled {
            if let Some((hash, x)) = &self.cache {
                if *hash == key {
                    debug!("solution cache hit ({} dofs)", n);
                    if let Some(report) = self.last_report.as_mut() {
                        report.cache_hit = true;
                    }
                    return Ok(x.clone());
                }
            }
        }

        let (x, mut report) = if n < self.direct_threshold {
            let x = solve_lu(a, b)?;
            let residual = relative_residual(a, &x, b);
            (
                x,
                SolveReport {
                    method: SolveMethod::DirectLu,
                    dofs: n,
                    iterations: 0,
                    residual,
                    cache_hit: false,
                    warm_started: false,
                    condition_estimate: 0.0,
                },
            )
        } else {
            self.solve_iterative(a, b)?
        };

        report.condition_estimate = check_conditioning(a, &x, b)?;

        debug!(
            "{:?} solve: {} dofs, {} iterations, residual {:.3e}, condition >= {:.3e}",
            report.method, n, report.iterations, report.residual, report.condition_estimate
        );

        self.previous_solution = Some(x.clone());
        if self.caching_enabled {
            self.cache = Some((key, x.clone()));
        }
        self.last_report = Some(report);
        Ok(x)
    }

    fn solve_iterative(&mut self, a: &Mat, b: &Vector) -> BEMResult<(Vector, SolveReport)> {
        let n = b.len();
        let guess = match &self.previous_solution {
            Some(prev) if prev.len() == n => Some(prev),
            Some(prev) => {
                warn!("warm start discarded: previous solution has {} dofs, system has {}", prev.len(), n);
                None
            }
            None => None,
        };
        let warm_started = guess.is_some();

        let config = BiCgStabConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        };
        let sol = bicgstab(a, b, guess, &config);

        if !sol.converged {
            return Err(BEMError::ConvergenceFailed {
                iterations: sol.iterations,
                residual: sol.residual,
            });
        }
        if sol.x.iter().any(|v| !v.is_finite()) {
            return Err(BEMError::NonFinite("iterative solution".to_string()));
        }

        let report = SolveReport {
            method: SolveMethod::BiCgStab,
            dofs: n,
            iterations: sol.iterations,
            residual: sol.residual,
            cache_hit: false,
            warm_started,
            condition_estimate: 0.0,
        };
        Ok((sol.x, report))
    }
}

fn relative_residual(a: &Mat, x: &Vector, b: &Vector) -> f64 {
    let b_norm = b.norm();
    if b_norm == 0.0 {
        return (a * x).norm();
    }
    (b - a * x).norm() / b_norm
}

/// Hash of the dimensions, the diagonal, the full right-hand side and a
/// strided sample of the matrix entries
fn sampled_hash(a: &Mat, b: &Vector) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(a.nrows() as u64).to_le_bytes());
    hasher.update(&(a.ncols() as u64).to_le_bytes());

    let n = a.nrows().min(a.ncols());
    for i in 0..n {
        hasher.update(&a[(i, i)].to_le_bytes());
    }
    let entries = a.as_slice();
    let stride = (entries.len() / HASH_SAMPLES).max(1);
    for v in entries.iter().step_by(stride) {
        hasher.update(&v.to_le_bytes());
    }
    for v in b.iter() {
        hasher.update(&v.to_le_bytes());
    }
    hasher.finalize()
}
