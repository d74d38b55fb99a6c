//! Boundary geometry and material

mod boundary;
mod element;
mod material;

pub use boundary::{Boundary, BoundaryKind, Shape, MIN_SEGMENT_LENGTH};
pub use element::{BoundaryConditionType, BoundaryElement};
pub use material::Material;
