//! Top-level result cache

use std::sync::Arc;

use crate::analysis::{BemConfig, ElementType, PlaneAnalysis, SolverOptions};
use crate::elements::{BoundaryConditionType, BoundaryKind};
use crate::integrator::IntegratorConfig;
use crate::model::BemProblem;
use crate::results::BemAnalysis;

/// blake3 hash over everything that influences a solve: exact vertex
/// coordinates, boundary roles and conditions, material, far field,
/// ground surface, output grid and every option value
pub fn configuration_hash(
    problem: &BemProblem,
    options: &SolverOptions,
    config: &BemConfig,
    integrator: &IntegratorConfig,
) -> blake3::Hash {
    let mut h = blake3::Hasher::new();
    let mut put = |v: f64| {
        h.update(&v.to_le_bytes());
    };

    put(problem.material.e);
    put(problem.material.nu);
    put(problem.material.g);
    put(problem.far_field.sigma1);
    put(problem.far_field.sigma3);
    put(problem.far_field.angle);
    put(problem.ground_surface_y.unwrap_or(f64::NAN));
    match &problem.output_grid {
        Some(grid) => {
            for v in [grid.bounds.min_x, grid.bounds.min_y, grid.bounds.max_x, grid.bounds.max_y] {
                put(v);
            }
            put(grid.nx as f64);
            put(grid.ny as f64);
        }
        None => put(f64::NAN),
    }
    put(options.tolerance);
    put(config.refinement_factor);
    put(config.grid_padding);
    put(integrator.endpoint_tolerance);
    put(integrator.on_element_tolerance);
    put(integrator.surface_tolerance);
    for (bound, order) in &integrator.quadrature_orders {
        put(*bound);
        put(*order as f64);
    }
    put(integrator.max_quadrature_order as f64);

    h.update(&[
        match options.plane {
            PlaneAnalysis::PlaneStrain => 0,
            PlaneAnalysis::PlaneStress => 1,
        },
        match options.element_type {
            ElementType::Constant => 0,
            ElementType::Linear => 1,
            ElementType::Quadratic => 2,
        },
        config.caching_enabled as u8,
        config.adaptive_sizing as u8,
    ]);
    for v in [
        options.target_element_count,
        options.max_iterations,
        config.direct_solver_threshold,
        config.half_space_element_threshold,
    ] {
        h.update(&(v as u64).to_le_bytes());
    }

    h.update(&(problem.boundaries.len() as u64).to_le_bytes());
    for boundary in &problem.boundaries {
        h.update(&(boundary.id as u64).to_le_bytes());
        h.update(&[match boundary.kind {
            BoundaryKind::External => 0,
            BoundaryKind::Excavation => 1,
        }]);
        h.update(&(boundary.vertices.len() as u64).to_le_bytes());
        for v in &boundary.vertices {
            h.update(&v.x.to_le_bytes());
            h.update(&v.y.to_le_bytes());
        }
    }

    h.update(&(problem.conditions.len() as u64).to_le_bytes());
    for bc in &problem.conditions {
        h.update(&(bc.boundary_id as u64).to_le_bytes());
        h.update(&[match bc.bc_type {
            BoundaryConditionType::Traction => 0,
            BoundaryConditionType::Displacement => 1,
        }]);
        h.update(&bc.shear.to_le_bytes());
        h.update(&bc.normal.to_le_bytes());
    }
    h.finalize()
}

/// Most-recent-only cache of a complete analysis
#[derive(Debug, Default)]
pub struct BEMResultCache {
    entry: Option<(blake3::Hash, Arc<BemAnalysis>)>,
}

impl BEMResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached analysis for an exact hash match
    pub fn get(&self, key: &blake3::Hash) -> Option<Arc<BemAnalysis>> {
        match &self.entry {
            Some((hash, analysis)) if hash == key => Some(Arc::clone(analysis)),
            _ => None,
        }
    }

    /// Replace the entry
    pub fn store(&mut self, key: blake3::Hash, analysis: Arc<BemAnalysis>) {
        self.entry = Some((key, analysis));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
