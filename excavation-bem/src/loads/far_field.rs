//! Far-field (in-situ) principal stresses

use serde::{Deserialize, Serialize};

use crate::elements::BoundaryElement;
use crate::error::{BEMError, BEMResult};
use crate::math::Stress2;

/// Uniform pre-excavation stress given by its in-plane principal values.
/// Tension is positive, so the major (most compressive) stress `sigma1`
/// is the algebraically smaller one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarFieldStress {
    /// Major principal stress in MPa
    pub sigma1: f64,
    /// Minor principal stress in MPa
    pub sigma3: f64,
    /// Direction of `sigma1`, degrees counter-clockwise from +x
    pub angle: f64,
}

impl FarFieldStress {
    pub fn new(sigma1: f64, sigma3: f64, angle: f64) -> Self {
        Self { sigma1, sigma3, angle }
    }

    /// Equal stress in every direction
    pub fn hydrostatic(p: f64) -> Self {
        Self::new(p, p, 0.0)
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Cartesian components in the global frame
    pub fn to_cartesian(&self) -> Stress2 {
        let two_theta = 2.0 * self.angle.to_radians();
        let mean = 0.5 * (self.sigma1 + self.sigma3);
        let dev = 0.5 * (self.sigma1 - self.sigma3);
        Stress2::new(
            mean + dev * two_theta.cos(),
            mean - dev * two_theta.cos(),
            dev * two_theta.sin(),
        )
    }

    /// (shear, normal) traction the far field exerts across an element,
    /// in the element's local frame
    pub fn traction_on(&self, element: &BoundaryElement) -> (f64, f64) {
        let local = self.to_cartesian().to_local(element.cos, element.sin);
        (local.sxy, local.syy)
    }

    pub fn validate(&self) -> BEMResult<()> {
        if !(self.sigma1.is_finite() && self.sigma3.is_finite() && self.angle.is_finite()) {
            return Err(BEMError::InvalidInput("far-field stress must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for FarFieldStress {
    fn default() -> Self {
        Self::zero()
    }
}
