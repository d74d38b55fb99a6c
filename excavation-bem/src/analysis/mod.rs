//! Analysis types and options

use serde::{Deserialize, Serialize};

use crate::error::{BEMError, BEMResult};

/// Upper bound for the adaptive refinement factor
pub const MAX_REFINEMENT_FACTOR: f64 = 4.0;

/// Two-dimensional idealisation of the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneAnalysis {
    /// Long excavation, zero out-of-plane strain
    PlaneStrain,
    /// Thin plate, zero out-of-plane stress
    PlaneStress,
}

impl Default for PlaneAnalysis {
    fn default() -> Self {
        Self::PlaneStrain
    }
}

/// Boundary element interpolation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Piecewise uniform tractions, one collocation point per element
    Constant,
    /// Not supported
    Linear,
    /// Not supported
    Quadratic,
}

impl Default for ElementType {
    fn default() -> Self {
        Self::Constant
    }
}

impl ElementType {
    pub fn order(&self) -> u8 {
        match self {
            ElementType::Constant => 1,
            ElementType::Linear => 2,
            ElementType::Quadratic => 3,
        }
    }
}

/// Options for the boundary element solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub plane: PlaneAnalysis,
    pub element_type: ElementType,
    /// Desired number of elements over all excavation perimeters
    pub target_element_count: usize,
    /// Relative residual for the iterative solver
    pub tolerance: f64,
    /// Iteration cap for the iterative solver
    pub max_iterations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            plane: PlaneAnalysis::PlaneStrain,
            element_type: ElementType::Constant,
            target_element_count: 100,
            tolerance: 1e-8,
            max_iterations: 1000,
        }
    }
}

impl SolverOptions {
    pub fn plane_stress() -> Self {
        Self {
            plane: PlaneAnalysis::PlaneStress,
            ..Self::default()
        }
    }

    pub fn with_element_count(mut self, count: usize) -> Self {
        self.target_element_count = count;
        self
    }

    pub fn with_element_type(mut self, element_type: ElementType) -> Self {
        self.element_type = element_type;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    pub fn validate(&self) -> BEMResult<()> {
        if self.element_type != ElementType::Constant {
            return Err(BEMError::InvalidInput(format!(
                "{:?} elements are not supported, use constant elements",
                self.element_type
            )));
        }
        if self.target_element_count < 3 {
            return Err(BEMError::InvalidInput(format!(
                "target element count must be at least 3, got {}",
                self.target_element_count
            )));
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(BEMError::InvalidInput(format!(
                "tolerance must lie in (0, 1), got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(BEMError::InvalidInput("max_iterations must be positive".to_string()));
        }
        Ok(())
    }
}

/// Solver-level behaviour that does not change the physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BemConfig {
    pub caching_enabled: bool,
    /// Degrees of freedom below which the dense LU path is taken
    pub direct_solver_threshold: usize,
    /// Refine element size near sharp corners
    pub adaptive_sizing: bool,
    /// Maximum size reduction at a corner, in [1, MAX_REFINEMENT_FACTOR]
    pub refinement_factor: f64,
    /// Element count above which the half-space correction is skipped.
    /// Empirical stability limit of the quadrature-based image terms.
    pub half_space_element_threshold: usize,
    /// Fraction of the boundary extent added around the field grid
    pub grid_padding: f64,
}

impl Default for BemConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            direct_solver_threshold: 1500,
            adaptive_sizing: false,
            refinement_factor: 2.0,
            half_space_element_threshold: 400,
            grid_padding: 0.2,
        }
    }
}

impl BemConfig {
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    pub fn with_direct_threshold(mut self, dofs: usize) -> Self {
        self.direct_solver_threshold = dofs;
        self
    }

    /// Enable corner refinement, clamping the factor into range
    pub fn with_adaptive_sizing(mut self, factor: f64) -> Self {
        self.adaptive_sizing = true;
        self.refinement_factor = factor.clamp(1.0, MAX_REFINEMENT_FACTOR);
        self
    }

    pub fn with_half_space_threshold(mut self, elements: usize) -> Self {
        self.half_space_element_threshold = elements;
        self
    }

    pub fn with_grid_padding(mut self, padding: f64) -> Self {
        self.grid_padding = padding;
        self
    }

    /// Refinement factor actually applied during discretisation
    pub fn effective_refinement_factor(&self) -> f64 {
        if self.adaptive_sizing {
            self.refinement_factor.clamp(1.0, MAX_REFINEMENT_FACTOR)
        } else {
            1.0
        }
    }

    pub fn validate(&self) -> BEMResult<()> {
        if !self.refinement_factor.is_finite() {
            return Err(BEMError::InvalidInput("refinement factor must be finite".to_string()));
        }
        if !self.grid_padding.is_finite() || self.grid_padding < 0.0 {
            return Err(BEMError::InvalidInput(format!(
                "grid padding must be non-negative, got {}",
                self.grid_padding
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        assert!(SolverOptions::default().validate().is_ok());
        assert!(BemConfig::default().validate().is_ok());
    }

    #[test]
    fn test_higher_order_elements_rejected() {
        let opts = SolverOptions::default().with_element_type(ElementType::Quadratic);
        assert!(opts.validate().is_err());
        let opts = SolverOptions::default().with_element_type(ElementType::Linear);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_refinement_factor_is_clamped() {
        let cfg = BemConfig::default().with_adaptive_sizing(10.0);
        assert_eq!(cfg.refinement_factor, MAX_REFINEMENT_FACTOR);
        let cfg = BemConfig::default().with_adaptive_sizing(0.2);
        assert_eq!(cfg.effective_refinement_factor(), 1.0);
        assert_eq!(BemConfig::default().effective_refinement_factor(), 1.0);
    }

    #[test]
    fn test_bad_tolerance() {
        assert!(SolverOptions::default().with_tolerance(0.0).validate().is_err());
        assert!(SolverOptions::default().with_max_iter(0).validate().is_err());
    }
}
