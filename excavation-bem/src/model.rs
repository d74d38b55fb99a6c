//! BEM model - problem definition and the solver pipeline

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{BemConfig, SolverOptions};
use crate::assembly::{build_rhs, InfluenceMatrixBuilder};
use crate::cache::{configuration_hash, BEMResultCache};
use crate::discretize::discretize;
use crate::elements::{Boundary, BoundaryConditionType, BoundaryElement, Material};
use crate::error::{BEMError, BEMResult};
use crate::evaluation::FieldEvaluator;
use crate::grid::{analysis_bounds, AdaptiveGridGenerator, FieldPointGenerator};
use crate::integrator::{ElementIntegrator, IntegratorConfig};
use crate::interpolation::BucketInterpolator;
use crate::linear_solver::MatrixSolverService;
use crate::loads::FarFieldStress;
use crate::math::Point2;
use crate::postprocess::{post_process, StrengthCriterion};
use crate::results::{BemAnalysis, FieldPoint, OutputGrid, SolverStatistics, StressField, StressSample};

/// Output grid resolution used when the problem does not supply one
pub const DEFAULT_OUTPUT_RESOLUTION: usize = 50;

/// Vertices may sit this far above the ground surface
const GROUND_TOLERANCE: f64 = 1e-9;

/// Prescribed condition applied to every element of one boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub boundary_id: usize,
    pub bc_type: BoundaryConditionType,
    /// Shear traction or displacement, element frame
    pub shear: f64,
    /// Normal traction or displacement, element frame
    pub normal: f64,
}

impl BoundaryCondition {
    pub fn traction(boundary_id: usize, shear: f64, normal: f64) -> Self {
        Self { boundary_id, bc_type: BoundaryConditionType::Traction, shear, normal }
    }

    pub fn displacement(boundary_id: usize, shear: f64, normal: f64) -> Self {
        Self { boundary_id, bc_type: BoundaryConditionType::Displacement, shear, normal }
    }
}

/// Geometry, material and loading of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BemProblem {
    pub boundaries: Vec<Boundary>,
    pub material: Material,
    pub far_field: FarFieldStress,
    /// Traction-free horizontal surface; rock lies below it
    pub ground_surface_y: Option<f64>,
    pub output_grid: Option<OutputGrid>,
    /// Non-default conditions; unlisted excavations are traction-free
    pub conditions: Vec<BoundaryCondition>,
}

impl BemProblem {
    pub fn new(material: Material, far_field: FarFieldStress) -> Self {
        Self {
            boundaries: Vec::new(),
            material,
            far_field,
            ground_surface_y: None,
            output_grid: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundaries.push(boundary);
        self
    }

    pub fn with_ground_surface(mut self, y: f64) -> Self {
        self.ground_surface_y = Some(y);
        self
    }

    pub fn with_output_grid(mut self, grid: OutputGrid) -> Self {
        self.output_grid = Some(grid);
        self
    }

    pub fn with_condition(mut self, condition: BoundaryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn excavations(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.iter().filter(|b| b.is_excavation())
    }

    /// Whether a point lies in rock (outside every excavation and below ground)
    pub fn is_in_rock(&self, p: &Point2) -> bool {
        if let Some(g) = self.ground_surface_y {
            if p.y > g {
                return false;
            }
        }
        !self.excavations().any(|b| b.contains(p))
    }
}

/// Runs discretisation, assembly, solve and field recovery, caching each
/// stage. One instance serves one caller at a time.
pub struct BoundaryElementSolver {
    options: SolverOptions,
    config: BemConfig,
    integrator_config: IntegratorConfig,
    matrix_builder: InfluenceMatrixBuilder,
    linear_solver: MatrixSolverService,
    result_cache: BEMResultCache,
    grid_generator: Box<dyn FieldPointGenerator>,
    strength_criterion: Option<Arc<dyn StrengthCriterion>>,
    statistics: SolverStatistics,
}

impl BoundaryElementSolver {
    pub fn new(options: SolverOptions, config: BemConfig) -> BEMResult<Self> {
        options.validate()?;
        config.validate()?;
        Ok(Self {
            matrix_builder: InfluenceMatrixBuilder::new(config.caching_enabled),
            linear_solver: MatrixSolverService::from_settings(&options, &config),
            grid_generator: Box::new(AdaptiveGridGenerator::default().with_padding(config.grid_padding)),
            result_cache: BEMResultCache::new(),
            integrator_config: IntegratorConfig::default(),
            strength_criterion: None,
            statistics: SolverStatistics::default(),
            options,
            config,
        })
    }

    pub fn with_grid_generator(mut self, generator: Box<dyn FieldPointGenerator>) -> Self {
        self.grid_generator = generator;
        self.result_cache.clear();
        self
    }

    pub fn with_strength_criterion(mut self, criterion: Arc<dyn StrengthCriterion>) -> Self {
        self.strength_criterion = Some(criterion);
        self.result_cache.clear();
        self
    }

    pub fn with_integrator_config(mut self, config: IntegratorConfig) -> Self {
        self.integrator_config = config;
        self
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn config(&self) -> &BemConfig {
        &self.config
    }

    pub fn set_options(&mut self, options: SolverOptions) -> BEMResult<()> {
        options.validate()?;
        self.linear_solver.configure(&options, &self.config);
        self.options = options;
        Ok(())
    }

    pub fn set_config(&mut self, config: BemConfig) -> BEMResult<()> {
        config.validate()?;
        self.matrix_builder.set_caching(config.caching_enabled);
        self.linear_solver.configure(&self.options, &config);
        if !config.caching_enabled {
            self.result_cache.clear();
        }
        self.config = config;
        Ok(())
    }

    /// Statistics of the most recent `solve`
    pub fn last_statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    /// Drop the result, matrix and solution caches
    pub fn clear_caches(&mut self) {
        self.result_cache.clear();
        self.matrix_builder.invalidate();
        self.linear_solver.clear_cache();
    }

    /// Whether `problem` can be analysed with the current settings
    pub fn can_solve(&self, problem: &BemProblem) -> bool {
        match self.check(problem) {
            Ok(()) => true,
            Err(e) => {
                debug!("problem rejected: {}", e);
                false
            }
        }
    }

    /// Reasoned form of `can_solve`
    pub fn check(&self, problem: &BemProblem) -> BEMResult<()> {
        self.options.validate()?;
        self.config.validate()?;
        problem.material.validate()?;
        problem.far_field.validate()?;

        if problem.excavations().next().is_none() {
            return Err(BEMError::InvalidGeometry("at least one excavation is required".to_string()));
        }
        for boundary in &problem.boundaries {
            boundary.validate()?;
        }
        if let Some(ground) = problem.ground_surface_y {
            if !ground.is_finite() {
                return Err(BEMError::InvalidInput("ground surface level must be finite".to_string()));
            }
            for b in problem.excavations() {
                if b.vertices.iter().any(|v| v.y > ground + GROUND_TOLERANCE) {
                    return Err(BEMError::InvalidGeometry(format!(
                        "excavation {} extends above the ground surface",
                        b.id
                    )));
                }
                let on_surface = |p: &Point2| (p.y - ground).abs() <= GROUND_TOLERANCE;
                if b.segments().any(|(s, e)| on_surface(&s) && on_surface(&e)) {
                    return Err(BEMError::InvalidGeometry(format!(
                        "excavation {} has an edge on the ground surface",
                        b.id
                    )));
                }
            }
        }
        if let Some(grid) = &problem.output_grid {
            grid.validate()?;
        }
        for bc in &problem.conditions {
            if !problem.excavations().any(|b| b.id == bc.boundary_id) {
                return Err(BEMError::InvalidInput(format!(
                    "boundary condition refers to unknown excavation {}",
                    bc.boundary_id
                )));
            }
            if !(bc.shear.is_finite() && bc.normal.is_finite()) {
                return Err(BEMError::InvalidInput("boundary condition values must be finite".to_string()));
            }
        }
        Ok(())
    }

    // ========================
    // Solve Pipeline
    // ========================

    /// Solve `problem`. Any failure aborts the whole pipeline: it is
    /// recorded in `last_statistics` and returned, and nothing is cached.
    pub fn solve(&mut self, problem: &BemProblem) -> BEMResult<Arc<BemAnalysis>> {
        let started = Instant::now();
        let mut stats = SolverStatistics::default();

        let outcome = self.run_pipeline(problem, &mut stats);
        stats.timings.total_ms = elapsed_ms(started);

        match outcome {
            Ok(analysis) => {
                stats.success = true;
                info!(
                    "BEM solve finished in {:.1} ms: {} elements, {} field points{}",
                    stats.timings.total_ms,
                    stats.element_count,
                    stats.field_point_count,
                    if stats.result_cache_hit { " (cached)" } else { "" }
                );
                self.statistics = stats;
                Ok(analysis)
            }
            Err(e) => {
                error!("BEM solve failed after {:.1} ms: {}", stats.timings.total_ms, e);
                stats.success = false;
                stats.error_message = Some(e.to_string());
                self.statistics = stats;
                Err(e)
            }
        }
    }

    fn run_pipeline(&mut self, problem: &BemProblem, stats: &mut SolverStatistics) -> BEMResult<Arc<BemAnalysis>> {
        self.check(problem)?;

        // Cache check
        let t = Instant::now();
        let key = configuration_hash(problem, &self.options, &self.config, &self.integrator_config);
        if self.config.caching_enabled {
            if let Some(hit) = self.result_cache.get(&key) {
                stats.timings.cache_check_ms = elapsed_ms(t);
                stats.result_cache_hit = true;
                stats.element_count = hit.elements.len();
                stats.field_point_count = hit.field_points.len();
                stats.dofs = 2 * hit.elements.len();
                stats.half_space_used = hit.half_space.is_some();
                debug!("result cache hit");
                return Ok(hit);
            }
        }
        stats.timings.cache_check_ms = elapsed_ms(t);

        // Discretisation
        let t = Instant::now();
        let mut elements = discretize(&problem.boundaries, self.options.target_element_count, &self.config)?;
        apply_conditions(&mut elements, problem);
        stats.element_count = elements.len();
        stats.dofs = 2 * elements.len();
        stats.timings.discretization_ms = elapsed_ms(t);

        // Influence matrix
        let t = Instant::now();
        let half_space = match problem.ground_surface_y {
            Some(g) if elements.len() <= self.config.half_space_element_threshold => Some(g),
            Some(_) => {
                warn!(
                    "half-space correction disabled: {} elements exceed threshold {}",
                    elements.len(),
                    self.config.half_space_element_threshold
                );
                None
            }
            None => None,
        };
        stats.half_space_used = half_space.is_some();

        let integrator = ElementIntegrator::new(&problem.material, self.options.plane, self.integrator_config.clone());
        let matrix = self.matrix_builder.build_matrix(
            &integrator,
            &elements,
            half_space.unwrap_or(0.0),
            half_space.is_some(),
        )?;
        stats.matrix_cache_hit = self.matrix_builder.last_build_was_cached();
        stats.timings.matrix_assembly_ms = elapsed_ms(t);

        // Right-hand side
        let t = Instant::now();
        let rhs = build_rhs(&elements, &problem.far_field)?;
        stats.timings.rhs_ms = elapsed_ms(t);

        // Solve
        let t = Instant::now();
        let solution = self.linear_solver.solve(&matrix, &rhs)?;
        if let Some(report) = self.linear_solver.last_report() {
            stats.solution_cache_hit = report.cache_hit;
            stats.solve_method = Some(report.method);
            stats.iterations = report.iterations;
            stats.residual = report.residual;
        }
        stats.timings.solve_ms = elapsed_ms(t);

        // Boundary value extraction
        let t = Instant::now();
        if solution.len() != 2 * elements.len() {
            return Err(BEMError::DimensionMismatch { expected: 2 * elements.len(), got: solution.len() });
        }
        for (i, el) in elements.iter_mut().enumerate() {
            el.set_solution(solution[2 * i], solution[2 * i + 1]);
        }
        stats.timings.extraction_ms = elapsed_ms(t);

        // Field points
        let t = Instant::now();
        let points = self.grid_generator.generate(&problem.boundaries, &elements, problem.ground_surface_y);
        if points.is_empty() {
            return Err(BEMError::AnalysisFailed("field point generator produced no points".to_string()));
        }
        stats.field_point_count = points.len();
        stats.timings.grid_generation_ms = elapsed_ms(t);

        // Superposition
        let t = Instant::now();
        let evaluator = FieldEvaluator::new(
            &integrator,
            &elements,
            problem.far_field.to_cartesian(),
            self.options.plane,
            problem.material.nu,
            half_space,
        );
        let mut field_points = evaluator.evaluate_all(&points);
        if let Some(bad) = field_points.iter().find(|fp| !fp.is_finite()) {
            return Err(BEMError::NonFinite(format!(
                "field evaluation at ({}, {})",
                bad.location.x, bad.location.y
            )));
        }
        stats.timings.field_evaluation_ms = elapsed_ms(t);

        // Post-processing
        let t = Instant::now();
        post_process(&mut field_points, self.strength_criterion.as_deref());
        stats.timings.post_processing_ms = elapsed_ms(t);

        // Output grid
        let t = Instant::now();
        let grid = match problem.output_grid {
            Some(grid) => grid,
            None => default_output_grid(problem, self.config.grid_padding)?,
        };
        let stress_field = interpolate_onto(&grid, &field_points, problem)?;
        stats.timings.interpolation_ms = elapsed_ms(t);

        let analysis = Arc::new(BemAnalysis {
            stress_field,
            elements,
            field_points,
            solution,
            far_field: problem.far_field,
            plane: self.options.plane,
            nu: problem.material.nu,
            half_space,
            integrator,
        });

        if self.config.caching_enabled {
            self.result_cache.store(key, Arc::clone(&analysis));
        }
        Ok(analysis)
    }
}

fn apply_conditions(elements: &mut [BoundaryElement], problem: &BemProblem) {
    for bc in &problem.conditions {
        for el in elements.iter_mut().filter(|e| e.boundary_id == bc.boundary_id) {
            el.bc_type = bc.bc_type;
            el.shear_value = bc.shear;
            el.normal_value = bc.normal;
        }
    }
}

fn default_output_grid(problem: &BemProblem, padding: f64) -> BEMResult<OutputGrid> {
    let bounds = analysis_bounds(&problem.boundaries, padding, problem.ground_surface_y)
        .ok_or_else(|| BEMError::InvalidGeometry("boundaries have no extent".to_string()))?;
    Ok(OutputGrid::new(bounds, DEFAULT_OUTPUT_RESOLUTION, DEFAULT_OUTPUT_RESOLUTION))
}

fn interpolate_onto(grid: &OutputGrid, field_points: &[FieldPoint], problem: &BemProblem) -> BEMResult<StressField> {
    let interpolator = BucketInterpolator::new(field_points)
        .ok_or_else(|| BEMError::AnalysisFailed("no field points to interpolate".to_string()))?;

    let samples = grid
        .points()
        .into_iter()
        .map(|p| {
            if !problem.is_in_rock(&p) {
                return StressSample { x: p.x, y: p.y, ..StressSample::default() };
            }
            interpolator
                .interpolate(p)
                .unwrap_or(StressSample { x: p.x, y: p.y, ..StressSample::default() })
        })
        .collect();

    Ok(StressField { grid: *grid, samples })
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::BoundaryKind;
    use crate::math::Bounds;

    fn problem() -> BemProblem {
        BemProblem::new(Material::new(10_000.0, 0.25), FarFieldStress::new(-10.0, -5.0, 0.0))
            .with_boundary(Boundary::circle(0, BoundaryKind::Excavation, Point2::default(), 1.0, 24))
            .with_output_grid(OutputGrid::new(Bounds::new(-3.0, -3.0, 3.0, 3.0), 7, 7))
    }

    fn solver() -> BoundaryElementSolver {
        BoundaryElementSolver::new(SolverOptions::default().with_element_count(24), BemConfig::default()).unwrap()
    }

    #[test]
    fn test_can_solve_rejects_bad_geometry() {
        let s = solver();
        assert!(s.can_solve(&problem()));

        let mut degenerate = problem();
        degenerate.boundaries[0].vertices.truncate(2);
        assert!(!s.can_solve(&degenerate));

        let only_outer = BemProblem::new(Material::default(), FarFieldStress::zero()).with_boundary(Boundary::rectangle(
            0,
            BoundaryKind::External,
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, 1.0),
        ));
        assert!(!s.can_solve(&only_outer));

        assert!(!s.can_solve(&problem().with_ground_surface(0.5)));
        assert!(!s.can_solve(&problem().with_condition(BoundaryCondition::traction(42, 0.0, 1.0))));
    }

    #[test]
    fn test_edge_on_ground_surface_is_rejected() {
        let mut s = solver();
        let pit = BemProblem::new(Material::new(10_000.0, 0.25), FarFieldStress::new(-10.0, -5.0, 0.0))
            .with_boundary(Boundary::rectangle(0, BoundaryKind::Excavation, Point2::new(-2.0, -4.0), Point2::new(2.0, 0.0)))
            .with_ground_surface(0.0);
        assert!(!s.can_solve(&pit));
        assert!(matches!(s.solve(&pit), Err(BEMError::InvalidGeometry(_))));
        assert!(!s.last_statistics().success);

        // Touching the surface at a single vertex is allowed
        let diamond = Boundary::excavation(
            0,
            vec![Point2::new(0.0, 0.0), Point2::new(2.0, -2.0), Point2::new(0.0, -4.0), Point2::new(-2.0, -2.0)],
        );
        let touching = BemProblem { boundaries: vec![diamond], ..pit };
        assert!(s.can_solve(&touching));
    }

    #[test]
    fn test_solve_populates_statistics() {
        let mut s = solver();
        let analysis = s.solve(&problem()).unwrap();
        let stats = s.last_statistics();
        assert!(stats.success);
        assert_eq!(stats.element_count, 24);
        assert_eq!(stats.dofs, 48);
        assert_eq!(analysis.solution.len(), 48);
        assert_eq!(analysis.stress_field.samples.len(), 49);
        assert!(stats.field_point_count > 0);
        // Centre of the opening is not rock
        assert!(!analysis.stress_field.sample(3, 3).unwrap().valid);
        assert!(analysis.stress_field.sample(0, 0).unwrap().valid);
    }

    #[test]
    fn test_failure_is_recorded() {
        let mut s = solver();
        let mut bad = problem();
        bad.boundaries[0].vertices.truncate(2);
        assert!(s.solve(&bad).is_err());
        let stats = s.last_statistics();
        assert!(!stats.success);
        assert!(stats.error_message.is_some());
    }

    #[test]
    fn test_displacement_condition_is_honoured() {
        let mut s = solver();
        let p = problem().with_condition(BoundaryCondition::displacement(0, 0.0, 0.0));
        let analysis = s.solve(&p).unwrap();
        assert!(analysis.elements.iter().all(|e| e.bc_type == BoundaryConditionType::Displacement));
        // Clamped boundary: induced displacement at a collocation point vanishes
        let el = &analysis.elements[3];
        let fp = analysis.evaluate(el.midpoint);
        assert!(fp.ux.abs() < 1e-9 && fp.uy.abs() < 1e-9);
    }
}
