//! Result types for BEM analysis

use serde::{Deserialize, Serialize};

use crate::elements::BoundaryElement;
use crate::error::{BEMError, BEMResult};
use crate::evaluation::FieldEvaluator;
use crate::integrator::ElementIntegrator;
use crate::linear_solver::SolveMethod;
use crate::loads::FarFieldStress;
use crate::math::{Bounds, Point2, Vector};
use crate::postprocess::{post_process, Principal3D, StressInvariants, StrengthCriterion};
use crate::analysis::PlaneAnalysis;

/// Total stress and induced displacement at one location
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldPoint {
    pub location: Point2,
    /// Induced displacement
    pub ux: f64,
    pub uy: f64,
    pub uz: f64,
    pub sxx: f64,
    pub syy: f64,
    pub szz: f64,
    pub sxy: f64,
    pub syz: f64,
    pub szx: f64,
    /// Major (most compressive) in-plane principal stress
    pub sigma1: f64,
    /// Minor in-plane principal stress
    pub sigma3: f64,
    /// Direction of `sigma1`, degrees in [-90, 90)
    pub angle: f64,
    pub principal: Principal3D,
    pub invariants: StressInvariants,
    pub strength_factor: Option<f64>,
}

impl FieldPoint {
    pub fn at(location: Point2) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    pub fn displacement_magnitude(&self) -> f64 {
        (self.ux.powi(2) + self.uy.powi(2) + self.uz.powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        [self.ux, self.uy, self.uz, self.sxx, self.syy, self.szz, self.sxy, self.syz, self.szx]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Regular output grid, row-major from (min_x, min_y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputGrid {
    pub bounds: Bounds,
    pub nx: usize,
    pub ny: usize,
}

impl OutputGrid {
    pub fn new(bounds: Bounds, nx: usize, ny: usize) -> Self {
        Self { bounds, nx, ny }
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn point(&self, i: usize, j: usize) -> Point2 {
        let fx = if self.nx > 1 { i as f64 / (self.nx - 1) as f64 } else { 0.5 };
        let fy = if self.ny > 1 { j as f64 / (self.ny - 1) as f64 } else { 0.5 };
        Point2::new(
            self.bounds.min_x + fx * self.bounds.width(),
            self.bounds.min_y + fy * self.bounds.height(),
        )
    }

    pub fn points(&self) -> Vec<Point2> {
        (0..self.ny)
            .flat_map(|j| (0..self.nx).map(move |i| (i, j)))
            .map(|(i, j)| self.point(i, j))
            .collect()
    }

    pub fn validate(&self) -> BEMResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(BEMError::InvalidInput("output grid needs at least one point per axis".to_string()));
        }
        let b = &self.bounds;
        if ![b.min_x, b.min_y, b.max_x, b.max_y].iter().all(|v| v.is_finite()) || b.width() < 0.0 || b.height() < 0.0 {
            return Err(BEMError::InvalidInput("output grid bounds are invalid".to_string()));
        }
        Ok(())
    }
}

/// One output grid sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StressSample {
    pub x: f64,
    pub y: f64,
    pub sigma1: f64,
    pub sigma3: f64,
    /// Direction of `sigma1`, degrees in [-90, 90)
    pub angle: f64,
    pub ux: f64,
    pub uy: f64,
    /// False inside excavations, above ground, or with no field data
    pub valid: bool,
}

/// Stress field sampled on the caller's grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressField {
    pub grid: OutputGrid,
    pub samples: Vec<StressSample>,
}

impl StressField {
    pub fn sample(&self, i: usize, j: usize) -> Option<&StressSample> {
        if i >= self.grid.nx || j >= self.grid.ny {
            return None;
        }
        self.samples.get(j * self.grid.nx + i)
    }

    pub fn valid_samples(&self) -> impl Iterator<Item = &StressSample> {
        self.samples.iter().filter(|s| s.valid)
    }

    /// Most compressive sigma1 over valid samples
    pub fn min_sigma1(&self) -> Option<f64> {
        self.valid_samples().map(|s| s.sigma1).reduce(f64::min)
    }

    pub fn to_json(&self) -> BEMResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> BEMResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Wall-clock time per pipeline stage in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub cache_check_ms: f64,
    pub discretization_ms: f64,
    pub matrix_assembly_ms: f64,
    pub rhs_ms: f64,
    pub solve_ms: f64,
    pub extraction_ms: f64,
    pub grid_generation_ms: f64,
    pub field_evaluation_ms: f64,
    pub post_processing_ms: f64,
    pub interpolation_ms: f64,
    pub total_ms: f64,
}

/// Diagnostics of the most recent solve
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolverStatistics {
    pub timings: StageTimings,
    pub result_cache_hit: bool,
    pub matrix_cache_hit: bool,
    pub solution_cache_hit: bool,
    pub element_count: usize,
    pub field_point_count: usize,
    pub dofs: usize,
    pub solve_method: Option<SolveMethod>,
    pub iterations: usize,
    pub residual: f64,
    pub half_space_used: bool,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Everything one solve produced
#[derive(Debug, Clone)]
pub struct BemAnalysis {
    pub stress_field: StressField,
    /// Elements carrying their solved fictitious tractions
    pub elements: Vec<BoundaryElement>,
    pub field_points: Vec<FieldPoint>,
    /// Raw solution vector, [shear, normal] per element
    pub solution: Vector,
    pub far_field: FarFieldStress,
    pub plane: PlaneAnalysis,
    pub nu: f64,
    /// Ground level when the half-space correction was applied
    pub half_space: Option<f64>,
    pub(crate) integrator: ElementIntegrator,
}

impl BemAnalysis {
    /// Evaluate stresses and displacements at an arbitrary point
    pub fn evaluate(&self, point: Point2) -> FieldPoint {
        self.evaluate_with(point, None)
    }

    pub fn evaluate_with(&self, point: Point2, criterion: Option<&dyn StrengthCriterion>) -> FieldPoint {
        let mut fp = [self.evaluator().evaluate(point)];
        post_process(&mut fp, criterion);
        fp[0]
    }

    pub fn evaluator(&self) -> FieldEvaluator<'_> {
        FieldEvaluator::new(
            &self.integrator,
            &self.elements,
            self.far_field.to_cartesian(),
            self.plane,
            self.nu,
            self.half_space,
        )
    }
}
