//! Influence matrix and right-hand side assembly
//!
//! Row layout: element i owns rows 2i (shear equation) and 2i+1 (normal
//! equation), both in element i's local frame. Column 2j+0 holds the
//! response to a unit fictitious shear traction on element j, column
//! 2j+1 the response to a unit normal traction.

use std::sync::Arc;

use log::debug;

use crate::elements::{BoundaryConditionType, BoundaryElement};
use crate::error::{BEMError, BEMResult};
use crate::integrator::{ElementIntegrator, TractionComponent};
use crate::loads::FarFieldStress;
use crate::math::{rotate_to_local, Mat, Vector};

const COMPONENTS: [(usize, TractionComponent); 2] = [(0, TractionComponent::Shear), (1, TractionComponent::Normal)];

/// Builds the dense 2N x 2N influence matrix, caching the last one by a
/// hash of the exact element geometry and integrator parameters
#[derive(Debug)]
pub struct InfluenceMatrixBuilder {
    caching_enabled: bool,
    cached: Option<(blake3::Hash, Arc<Mat>)>,
    last_build_was_cached: bool,
}

impl Default for InfluenceMatrixBuilder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InfluenceMatrixBuilder {
    pub fn new(caching_enabled: bool) -> Self {
        Self {
            caching_enabled,
            cached: None,
            last_build_was_cached: false,
        }
    }

    pub fn set_caching(&mut self, enabled: bool) {
        self.caching_enabled = enabled;
        if !enabled {
            self.invalidate();
        }
    }

    /// Drop the cached matrix
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn last_build_was_cached(&self) -> bool {
        self.last_build_was_cached
    }

    pub fn build_matrix(
        &mut self,
        integrator: &ElementIntegrator,
        elements: &[BoundaryElement],
        ground_surface_y: f64,
        is_half_space: bool,
    ) -> BEMResult<Arc<Mat>> {
        self.last_build_was_cached = false;
        if elements.is_empty() {
            return Err(BEMError::EmptyElementList);
        }

        let key = matrix_hash(integrator, elements, ground_surface_y, is_half_space);
        if self.caching_enabled {
            if let Some((hash, matrix)) = &self.cached {
                if *hash == key {
                    debug!("influence matrix cache hit ({} elements)", elements.len());
                    self.last_build_was_cached = true;
                    return Ok(Arc::clone(matrix));
                }
            }
        }

        let matrix = Arc::new(assemble(integrator, elements, ground_surface_y, is_half_space));
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(BEMError::NonFinite("influence matrix".to_string()));
        }

        if self.caching_enabled {
            self.cached = Some((key, Arc::clone(&matrix)));
        }
        Ok(matrix)
    }
}

fn assemble(integrator: &ElementIntegrator, elements: &[BoundaryElement], ground: f64, half_space: bool) -> Mat {
    let n = elements.len();
    let mut a = Mat::zeros(2 * n, 2 * n);

    for (i, collocation) in elements.iter().enumerate() {
        let (c, s) = (collocation.cos, collocation.sin);
        for (j, source) in elements.iter().enumerate() {
            let coeffs = integrator.compute_influence(&collocation.midpoint, source, ground, half_space);
            for (col, component) in COMPONENTS {
                let (shear_row, normal_row) = match collocation.bc_type {
                    BoundaryConditionType::Traction => {
                        let local = coeffs.stress(component).to_local(c, s);
                        (local.sxy, local.syy)
                    }
                    BoundaryConditionType::Displacement => {
                        let (ux, uy) = coeffs.displacement(component);
                        rotate_to_local(ux, uy, c, s)
                    }
                };
                a[(2 * i, 2 * j + col)] = shear_row;
                a[(2 * i + 1, 2 * j + col)] = normal_row;
            }
        }
    }
    a
}

/// Right-hand side: prescribed values, less the far-field traction on
/// traction-specified elements
pub fn build_rhs(elements: &[BoundaryElement], far_field: &FarFieldStress) -> BEMResult<Vector> {
    if elements.is_empty() {
        return Err(BEMError::EmptyElementList);
    }
    let mut b = Vector::zeros(2 * elements.len());
    for (i, el) in elements.iter().enumerate() {
        let (shear, normal) = match el.bc_type {
            BoundaryConditionType::Traction => {
                let (ff_shear, ff_normal) = far_field.traction_on(el);
                (el.shear_value - ff_shear, el.normal_value - ff_normal)
            }
            BoundaryConditionType::Displacement => (el.shear_value, el.normal_value),
        };
        b[2 * i] = shear;
        b[2 * i + 1] = normal;
    }
    if b.iter().any(|v| !v.is_finite()) {
        return Err(BEMError::NonFinite("right-hand side".to_string()));
    }
    Ok(b)
}

fn matrix_hash(integrator: &ElementIntegrator, elements: &[BoundaryElement], ground: f64, half_space: bool) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(elements.len() as u64).to_le_bytes());
    for el in elements {
        for v in [el.start.x, el.start.y, el.end.x, el.end.y] {
            hasher.update(&v.to_le_bytes());
        }
        hasher.update(&[match el.bc_type {
            BoundaryConditionType::Traction => 0u8,
            BoundaryConditionType::Displacement => 1u8,
        }]);
    }
    integrator.fingerprint(&mut hasher);
    hasher.update(&[half_space as u8]);
    if half_space {
        hasher.update(&ground.to_le_bytes());
    }
    hasher.finalize()
}
