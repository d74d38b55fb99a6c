//! Isotropic rock mass properties

use serde::{Deserialize, Serialize};

use crate::analysis::PlaneAnalysis;
use crate::error::{BEMError, BEMResult};

/// Linear elastic isotropic material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Young's modulus in MPa
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Shear modulus in MPa, derived as E / (2(1 + nu))
    pub g: f64,
}

impl Material {
    /// Create an isotropic material from E and nu
    pub fn new(e: f64, nu: f64) -> Self {
        Self {
            e,
            nu,
            g: e / (2.0 * (1.0 + nu)),
        }
    }

    /// Moderately stiff hard rock (granite-like)
    pub fn granite() -> Self {
        Self::new(50_000.0, 0.25)
    }

    /// Soft sedimentary rock
    pub fn sandstone() -> Self {
        Self::new(15_000.0, 0.3)
    }

    /// Poisson's ratio that enters the plane-strain kernels. Plane stress
    /// maps onto plane strain through nu' = nu / (1 + nu).
    pub fn effective_nu(&self, plane: PlaneAnalysis) -> f64 {
        match plane {
            PlaneAnalysis::PlaneStrain => self.nu,
            PlaneAnalysis::PlaneStress => self.nu / (1.0 + self.nu),
        }
    }

    pub fn validate(&self) -> BEMResult<()> {
        if !self.e.is_finite() || self.e <= 0.0 {
            return Err(BEMError::InvalidInput(format!(
                "Young's modulus must be positive, got {}",
                self.e
            )));
        }
        if !self.nu.is_finite() || self.nu <= -1.0 || self.nu >= 0.5 {
            return Err(BEMError::InvalidInput(format!(
                "Poisson's ratio must lie in (-1, 0.5), got {}",
                self.nu
            )));
        }
        let expected_g = self.e / (2.0 * (1.0 + self.nu));
        if (self.g - expected_g).abs() > 1e-9 * expected_g {
            return Err(BEMError::InvalidInput(format!(
                "shear modulus {} inconsistent with E and nu (expected {})",
                self.g, expected_g
            )));
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(10_000.0, 0.25)
    }
}
