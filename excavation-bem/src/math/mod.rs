//! Mathematical utilities for BEM calculations

pub mod dense;
pub mod iterative;
pub mod quadrature;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

pub use dense::{check_conditioning, condition_lower_bound, solve_lu, CONDITION_LIMIT};
pub use iterative::{bicgstab, BiCgStabConfig, BiCgStabSolution, JacobiPreconditioner};
pub use quadrature::GaussLegendre;

pub type Mat = DMatrix<f64>;
pub type Vector = DVector<f64>;

/// A point in the analysis plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &Point2) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Rotate counter-clockwise about `center` by `angle` radians
    pub fn rotated_about(&self, center: &Point2, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Self::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Smallest box containing all points, `None` for an empty slice
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn union(&self, other: &Bounds) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Grow each side by `fraction` of the larger box dimension
    pub fn padded(&self, fraction: f64) -> Self {
        let pad = fraction * self.width().max(self.height());
        Self::new(
            self.min_x - pad,
            self.min_y - pad,
            self.max_x + pad,
            self.max_y + pad,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// In-plane Cartesian stress tensor (tension positive)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stress2 {
    pub sxx: f64,
    pub syy: f64,
    pub sxy: f64,
}

impl Stress2 {
    pub fn new(sxx: f64, syy: f64, sxy: f64) -> Self {
        Self { sxx, syy, sxy }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate components expressed in a frame whose x-axis has direction
    /// (cos, sin) into the global frame
    pub fn to_global(&self, cos: f64, sin: f64) -> Self {
        let (c2, s2, cs) = (cos * cos, sin * sin, cos * sin);
        Self {
            sxx: self.sxx * c2 + self.syy * s2 - 2.0 * self.sxy * cs,
            syy: self.sxx * s2 + self.syy * c2 + 2.0 * self.sxy * cs,
            sxy: (self.sxx - self.syy) * cs + self.sxy * (c2 - s2),
        }
    }

    /// Components in a frame whose x-axis has direction (cos, sin)
    pub fn to_local(&self, cos: f64, sin: f64) -> Self {
        self.to_global(cos, -sin)
    }

    pub fn is_finite(&self) -> bool {
        self.sxx.is_finite() && self.syy.is_finite() && self.sxy.is_finite()
    }
}

impl Add for Stress2 {
    type Output = Stress2;

    fn add(self, rhs: Stress2) -> Stress2 {
        Stress2::new(self.sxx + rhs.sxx, self.syy + rhs.syy, self.sxy + rhs.sxy)
    }
}

impl AddAssign for Stress2 {
    fn add_assign(&mut self, rhs: Stress2) {
        self.sxx += rhs.sxx;
        self.syy += rhs.syy;
        self.sxy += rhs.sxy;
    }
}

impl Mul<f64> for Stress2 {
    type Output = Stress2;

    fn mul(self, rhs: f64) -> Stress2 {
        Stress2::new(self.sxx * rhs, self.syy * rhs, self.sxy * rhs)
    }
}

/// Rotate a vector from a frame with x-axis (cos, sin) into the global frame
#[inline]
pub fn rotate_to_global(vx: f64, vy: f64, cos: f64, sin: f64) -> (f64, f64) {
    (vx * cos - vy * sin, vx * sin + vy * cos)
}

/// Rotate a global vector into a frame with x-axis (cos, sin)
#[inline]
pub fn rotate_to_local(vx: f64, vy: f64, cos: f64, sin: f64) -> (f64, f64) {
    (vx * cos + vy * sin, -vx * sin + vy * cos)
}
