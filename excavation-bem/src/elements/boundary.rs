//! Closed boundary polygons

use serde::{Deserialize, Serialize};

use crate::error::{BEMError, BEMResult};
use crate::math::{Bounds, Point2};

/// Segments shorter than this are treated as degenerate
pub const MIN_SEGMENT_LENGTH: f64 = 1e-10;

/// Role a polygon plays in the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// Outer analysis region, bounds the field grid only
    External,
    /// Opening in the rock mass, discretised into elements
    Excavation,
}

/// Minimal geometry capability consumed by the solver
pub trait Shape {
    fn vertices(&self) -> &[Point2];

    fn is_closed(&self) -> bool;

    fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.vertices())
    }
}

/// Closed polygon with an id and a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub id: usize,
    pub kind: BoundaryKind,
    pub vertices: Vec<Point2>,
}

impl Boundary {
    pub fn new(id: usize, kind: BoundaryKind, vertices: Vec<Point2>) -> Self {
        Self { id, kind, vertices }
    }

    pub fn excavation(id: usize, vertices: Vec<Point2>) -> Self {
        Self::new(id, BoundaryKind::Excavation, vertices)
    }

    pub fn external(id: usize, vertices: Vec<Point2>) -> Self {
        Self::new(id, BoundaryKind::External, vertices)
    }

    /// Regular polygon approximating a circle, vertices counter-clockwise
    /// starting on the positive x-axis
    pub fn circle(id: usize, kind: BoundaryKind, center: Point2, radius: f64, segments: usize) -> Self {
        let n = segments.max(3);
        let vertices = (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                Point2::new(center.x + radius * t.cos(), center.y + radius * t.sin())
            })
            .collect();
        Self::new(id, kind, vertices)
    }

    /// Axis-aligned rectangle, vertices counter-clockwise
    pub fn rectangle(id: usize, kind: BoundaryKind, min: Point2, max: Point2) -> Self {
        Self::new(
            id,
            kind,
            vec![
                min,
                Point2::new(max.x, min.y),
                max,
                Point2::new(min.x, max.y),
            ],
        )
    }

    pub fn is_excavation(&self) -> bool {
        self.kind == BoundaryKind::Excavation
    }

    /// Shoelace area, positive for counter-clockwise polygons
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        0.5 * (0..n)
            .map(|i| {
                let a = &self.vertices[i];
                let b = &self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
    }

    pub fn perimeter(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }

    /// Edges including the closing one
    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Even-odd ray casting test; points on an edge may go either way
    pub fn contains(&self, p: &Point2) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = &self.vertices[i];
            let vj = &self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y) {
                let x_cross = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Vertices ordered so the rock lies to the left of every edge:
    /// clockwise around an excavation, counter-clockwise around the
    /// external region.
    pub fn oriented_vertices(&self) -> Vec<Point2> {
        let area = self.signed_area();
        let wants_ccw = self.kind == BoundaryKind::External;
        if (area > 0.0) == wants_ccw {
            self.vertices.clone()
        } else {
            self.vertices.iter().rev().copied().collect()
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| v.translated(dx, dy)).collect(),
            ..self.clone()
        }
    }

    /// Rotate counter-clockwise about `center` by `angle` radians
    pub fn rotated(&self, center: &Point2, angle: f64) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| v.rotated_about(center, angle)).collect(),
            ..self.clone()
        }
    }

    /// Reject polygons that cannot be discretised
    pub fn validate(&self) -> BEMResult<()> {
        if self.vertices.len() < 3 {
            return Err(BEMError::InvalidGeometry(format!(
                "boundary {} has {} vertices, at least 3 required",
                self.id,
                self.vertices.len()
            )));
        }
        if let Some(i) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(BEMError::InvalidGeometry(format!(
                "boundary {} vertex {} is not finite",
                self.id, i
            )));
        }
        for (i, (a, b)) in self.segments().enumerate() {
            if a.distance_to(&b) < MIN_SEGMENT_LENGTH {
                return Err(BEMError::InvalidGeometry(format!(
                    "boundary {} segment {} has zero length",
                    self.id, i
                )));
            }
        }
        if self.signed_area().abs() < MIN_SEGMENT_LENGTH * MIN_SEGMENT_LENGTH {
            return Err(BEMError::InvalidGeometry(format!(
                "boundary {} encloses no area",
                self.id
            )));
        }
        Ok(())
    }
}

impl Shape for Boundary {
    fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    fn is_closed(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Boundary {
        Boundary::rectangle(0, BoundaryKind::Excavation, Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
    }

    #[test]
    fn test_signed_area_and_perimeter() {
        let sq = unit_square();
        assert_relative_eq!(sq.signed_area(), 1.0);
        assert_relative_eq!(sq.perimeter(), 4.0);
    }

    #[test]
    fn test_excavation_is_oriented_clockwise() {
        let sq = unit_square();
        let oriented = Boundary::new(0, BoundaryKind::Excavation, sq.oriented_vertices());
        assert!(oriented.signed_area() < 0.0);

        let outer = Boundary::new(1, BoundaryKind::External, oriented.vertices.clone());
        let outer = Boundary::new(1, BoundaryKind::External, outer.oriented_vertices());
        assert!(outer.signed_area() > 0.0);
    }

    #[test]
    fn test_contains() {
        let c = Boundary::circle(0, BoundaryKind::Excavation, Point2::new(2.0, -1.0), 1.0, 32);
        assert!(c.contains(&Point2::new(2.0, -1.0)));
        assert!(c.contains(&Point2::new(2.5, -0.6)));
        assert!(!c.contains(&Point2::new(3.5, -1.0)));
    }

    #[test]
    fn test_validation() {
        assert!(unit_square().validate().is_ok());

        let two = Boundary::excavation(3, vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(matches!(two.validate(), Err(BEMError::InvalidGeometry(_))));

        let dup = Boundary::excavation(
            4,
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ],
        );
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_rotation_preserves_area() {
        let sq = unit_square();
        let rotated = sq.rotated(&Point2::new(3.0, 1.0), 0.8).translated(-2.0, 5.0);
        assert_relative_eq!(rotated.signed_area(), sq.signed_area(), epsilon = 1e-12);
    }
}
