//! Field point generation

use crate::elements::{Boundary, BoundaryElement, Shape};
use crate::math::{Bounds, Point2};

/// Produces the points at which stresses are evaluated
pub trait FieldPointGenerator: Send + Sync {
    /// `ground_surface_y` is `Some` when a free surface bounds the rock
    fn generate(&self, boundaries: &[Boundary], elements: &[BoundaryElement], ground_surface_y: Option<f64>) -> Vec<Point2>;
}

/// Analysis region: the external boundary if present, otherwise every
/// boundary, grown by `padding` and clipped at the ground surface
pub fn analysis_bounds(boundaries: &[Boundary], padding: f64, ground_surface_y: Option<f64>) -> Option<Bounds> {
    let external: Vec<Bounds> = boundaries
        .iter()
        .filter(|b| !b.is_excavation())
        .filter_map(|b| b.bounds())
        .collect();

    let raw = if external.is_empty() {
        boundaries.iter().filter_map(|b| b.bounds()).reduce(|a, b| a.union(&b))?
    } else {
        external.into_iter().reduce(|a, b| a.union(&b))?
    };

    let mut bounds = raw.padded(padding);
    if let Some(ground) = ground_surface_y {
        bounds.max_y = bounds.max_y.min(ground);
    }
    Some(bounds)
}

/// Regular lattice over the padded analysis region plus layers of points
/// offset from each element into the rock
#[derive(Debug, Clone)]
pub struct AdaptiveGridGenerator {
    /// Lattice points along the longer side of the region
    pub resolution: usize,
    /// Fraction of the boundary extent added on every side
    pub padding: f64,
    /// Offsets from element midpoints, in element lengths
    pub boundary_layers: Vec<f64>,
    /// Lattice points closer than this many element lengths to an element are dropped
    pub min_boundary_distance: f64,
}

impl Default for AdaptiveGridGenerator {
    fn default() -> Self {
        Self {
            resolution: 40,
            padding: 0.2,
            boundary_layers: vec![0.5, 1.5, 3.0],
            min_boundary_distance: 0.25,
        }
    }
}

impl AdaptiveGridGenerator {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution.max(2);
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    fn keep(&self, p: &Point2, excavations: &[&Boundary], elements: &[BoundaryElement], bounds: &Bounds, ground: Option<f64>, check_distance: bool) -> bool {
        if !bounds.contains(p) {
            return false;
        }
        if let Some(g) = ground {
            if p.y > g {
                return false;
            }
        }
        if excavations.iter().any(|b| b.contains(p)) {
            return false;
        }
        if check_distance {
            let too_close = elements
                .iter()
                .any(|e| distance_to_segment(p, &e.start, &e.end) < self.min_boundary_distance * e.length);
            if too_close {
                return false;
            }
        }
        true
    }
}

impl FieldPointGenerator for AdaptiveGridGenerator {
    fn generate(&self, boundaries: &[Boundary], elements: &[BoundaryElement], ground_surface_y: Option<f64>) -> Vec<Point2> {
        let Some(bounds) = analysis_bounds(boundaries, self.padding, ground_surface_y) else {
            return Vec::new();
        };
        let excavations: Vec<&Boundary> = boundaries.iter().filter(|b| b.is_excavation()).collect();

        let longest = bounds.width().max(bounds.height());
        if !(longest > 0.0) {
            return Vec::new();
        }
        let step = longest / (self.resolution.max(2) - 1) as f64;
        let nx = (bounds.width() / step).round() as usize + 1;
        let ny = (bounds.height() / step).round() as usize + 1;

        let mut points = Vec::with_capacity(nx * ny + elements.len() * self.boundary_layers.len());
        for j in 0..ny {
            for i in 0..nx {
                let p = Point2::new(
                    (bounds.min_x + i as f64 * step).min(bounds.max_x),
                    (bounds.min_y + j as f64 * step).min(bounds.max_y),
                );
                if self.keep(&p, &excavations, elements, &bounds, ground_surface_y, true) {
                    points.push(p);
                }
            }
        }

        for el in elements {
            let (nx, ny) = el.inward_normal();
            for offset in &self.boundary_layers {
                let d = offset * el.length;
                let p = Point2::new(el.midpoint.x + nx * d, el.midpoint.y + ny * d);
                if self.keep(&p, &excavations, elements, &bounds, ground_surface_y, false) {
                    points.push(p);
                }
            }
        }
        points
    }
}

fn distance_to_segment(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance_to(&Point2::new(a.x + t * dx, a.y + t * dy))
}
