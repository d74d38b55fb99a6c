//! Excavation BEM - 2D boundary element analysis of excavations in rock
//!
//! Computes the stress and displacement field induced around openings in
//! an infinite or semi-infinite isotropic elastic medium loaded by a
//! uniform far-field stress, using the fictitious stress method:
//! - Constant-strength straight elements along each excavation boundary
//! - Traction or displacement boundary conditions per boundary
//! - Optional traction-free ground surface (half-space image correction)
//! - Plane strain or plane stress
//! - Principal stresses and invariants, optional strength factor
//! - Result, matrix and solution caching between solves
//!
//! ## Example
//! ```rust
//! use excavation_bem::prelude::*;
//!
//! let tunnel = Boundary::circle(0, BoundaryKind::Excavation, Point2::new(0.0, 0.0), 5.0, 32);
//! let problem = BemProblem::new(Material::new(10_000.0, 0.25), FarFieldStress::new(-10.0, -5.0, 0.0))
//!     .with_boundary(tunnel);
//!
//! let mut solver = BoundaryElementSolver::new(
//!     SolverOptions::default().with_element_count(32),
//!     BemConfig::default(),
//! )
//! .unwrap();
//! let analysis = solver.solve(&problem).unwrap();
//!
//! // Total stress at the crown
//! let crown = analysis.evaluate(Point2::new(0.0, 5.5));
//! assert!(crown.sigma1 < 0.0);
//! ```

pub mod analysis;
pub mod assembly;
pub mod cache;
pub mod discretize;
pub mod elements;
pub mod error;
pub mod evaluation;
pub mod grid;
pub mod integrator;
pub mod interpolation;
pub mod linear_solver;
pub mod loads;
pub mod math;
pub mod model;
pub mod postprocess;
pub mod results;

#[cfg(feature = "async")]
pub mod async_solver;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{BemConfig, ElementType, PlaneAnalysis, SolverOptions};
    pub use crate::elements::{Boundary, BoundaryConditionType, BoundaryElement, BoundaryKind, Material, Shape};
    pub use crate::error::{BEMError, BEMResult};
    pub use crate::grid::{AdaptiveGridGenerator, FieldPointGenerator};
    pub use crate::loads::FarFieldStress;
    pub use crate::math::{Bounds, Point2, Stress2};
    pub use crate::model::{BemProblem, BoundaryCondition, BoundaryElementSolver};
    pub use crate::postprocess::{Principal3D, StrengthCriterion};
    pub use crate::results::{
        BemAnalysis, FieldPoint, OutputGrid, SolverStatistics, StressField, StressSample,
    };

    #[cfg(feature = "async")]
    pub use crate::async_solver::{AsyncBoundaryElementSolver, CancellationFlag};
}
