//! Constant boundary element

use serde::{Deserialize, Serialize};

use crate::math::Point2;

/// Which boundary quantity is prescribed on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryConditionType {
    /// Shear and normal traction prescribed (free surface by default)
    Traction,
    /// Shear and normal displacement prescribed
    Displacement,
}

impl Default for BoundaryConditionType {
    fn default() -> Self {
        Self::Traction
    }
}

/// Straight boundary segment carrying uniform fictitious tractions.
///
/// The local x-axis runs from `start` to `end`; local y is the left
/// normal, pointing into the rock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryElement {
    pub start: Point2,
    pub end: Point2,
    pub midpoint: Point2,
    pub length: f64,
    /// Direction cosine of the local x-axis
    pub cos: f64,
    /// Direction sine of the local x-axis
    pub sin: f64,
    /// Interpolation order, 1 for constant elements
    pub order: u8,
    pub bc_type: BoundaryConditionType,
    /// Prescribed shear quantity (traction or displacement)
    pub shear_value: f64,
    /// Prescribed normal quantity (traction or displacement)
    pub normal_value: f64,
    /// Fictitious shear traction found by the solve
    pub solved_shear: f64,
    /// Fictitious normal traction found by the solve
    pub solved_normal: f64,
    pub boundary_id: usize,
}

impl BoundaryElement {
    /// Traction-free constant element between two points
    pub fn new(start: Point2, end: Point2, boundary_id: usize) -> Self {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length = (dx * dx + dy * dy).sqrt();
        let (cos, sin) = if length > 0.0 { (dx / length, dy / length) } else { (1.0, 0.0) };
        Self {
            start,
            end,
            midpoint: Point2::new(0.5 * (start.x + end.x), 0.5 * (start.y + end.y)),
            length,
            cos,
            sin,
            order: 1,
            bc_type: BoundaryConditionType::Traction,
            shear_value: 0.0,
            normal_value: 0.0,
            solved_shear: 0.0,
            solved_normal: 0.0,
            boundary_id,
        }
    }

    pub fn with_traction(mut self, shear: f64, normal: f64) -> Self {
        self.bc_type = BoundaryConditionType::Traction;
        self.shear_value = shear;
        self.normal_value = normal;
        self
    }

    pub fn with_displacement(mut self, shear: f64, normal: f64) -> Self {
        self.bc_type = BoundaryConditionType::Displacement;
        self.shear_value = shear;
        self.normal_value = normal;
        self
    }

    pub fn half_length(&self) -> f64 {
        0.5 * self.length
    }

    /// Unit normal pointing into the rock
    pub fn inward_normal(&self) -> (f64, f64) {
        (-self.sin, self.cos)
    }

    /// Store the solved fictitious tractions
    pub fn set_solution(&mut self, shear: f64, normal: f64) {
        self.solved_shear = shear;
        self.solved_normal = normal;
    }
}
