//! Stress and displacement recovery by superposition

use rayon::prelude::*;

use crate::analysis::PlaneAnalysis;
use crate::elements::BoundaryElement;
use crate::integrator::ElementIntegrator;
use crate::math::{Point2, Stress2};
use crate::results::FieldPoint;

/// Sums element influences weighted by the solved fictitious tractions
/// and adds the far-field stress
#[derive(Debug, Clone, Copy)]
pub struct FieldEvaluator<'a> {
    integrator: &'a ElementIntegrator,
    elements: &'a [BoundaryElement],
    far_field: Stress2,
    plane: PlaneAnalysis,
    /// Real Poisson's ratio, for the out-of-plane stress
    nu: f64,
    half_space: Option<f64>,
}

impl<'a> FieldEvaluator<'a> {
    pub fn new(
        integrator: &'a ElementIntegrator,
        elements: &'a [BoundaryElement],
        far_field: Stress2,
        plane: PlaneAnalysis,
        nu: f64,
        half_space: Option<f64>,
    ) -> Self {
        Self {
            integrator,
            elements,
            far_field,
            plane,
            nu,
            half_space,
        }
    }

    pub fn evaluate(&self, point: Point2) -> FieldPoint {
        let (ground, is_half_space) = match self.half_space {
            Some(g) => (g, true),
            None => (0.0, false),
        };

        let mut stress = self.far_field;
        let (mut ux, mut uy) = (0.0, 0.0);
        for el in self.elements {
            let coeffs = self.integrator.compute_influence(&point, el, ground, is_half_space);
            stress += coeffs.weighted_stress(el.solved_shear, el.solved_normal);
            let (dx, dy) = coeffs.weighted_displacement(el.solved_shear, el.solved_normal);
            ux += dx;
            uy += dy;
        }

        let szz = match self.plane {
            PlaneAnalysis::PlaneStrain => self.nu * (stress.sxx + stress.syy),
            PlaneAnalysis::PlaneStress => 0.0,
        };

        FieldPoint {
            location: point,
            ux,
            uy,
            sxx: stress.sxx,
            syy: stress.syy,
            szz,
            sxy: stress.sxy,
            ..FieldPoint::default()
        }
    }

    /// Evaluate every point in parallel; output order matches input order
    pub fn evaluate_all(&self, points: &[Point2]) -> Vec<FieldPoint> {
        points.par_iter().map(|p| self.evaluate(*p)).collect()
    }
}
