//! Boundary discretisation into constant elements

use std::f64::consts::PI;

use log::debug;

use crate::analysis::BemConfig;
use crate::elements::{Boundary, BoundaryElement};
use crate::error::{BEMError, BEMResult};
use crate::math::Point2;

/// Split every excavation into straight elements of roughly
/// `perimeter / target_count` length. Only excavations carry elements;
/// the external boundary bounds the analysis area.
pub fn discretize(boundaries: &[Boundary], target_count: usize, config: &BemConfig) -> BEMResult<Vec<BoundaryElement>> {
    if target_count == 0 {
        return Err(BEMError::InvalidInput("target element count must be positive".to_string()));
    }
    let excavations: Vec<&Boundary> = boundaries.iter().filter(|b| b.is_excavation()).collect();
    if excavations.is_empty() {
        return Err(BEMError::InvalidGeometry("no excavation boundary to discretise".to_string()));
    }

    let perimeter: f64 = excavations.iter().map(|b| b.perimeter()).sum();
    if !(perimeter > 0.0) {
        return Err(BEMError::InvalidGeometry("excavation perimeter is zero".to_string()));
    }
    let base_size = perimeter / target_count as f64;
    let refinement = config.effective_refinement_factor();

    let mut elements = Vec::with_capacity(target_count + excavations.len() * 4);
    for boundary in excavations {
        let vertices = boundary.oriented_vertices();
        let n = vertices.len();
        let turning: Vec<f64> = (0..n).map(|i| turning_angle(&vertices, i)).collect();

        for i in 0..n {
            let start = vertices[i];
            let end = vertices[(i + 1) % n];
            let length = start.distance_to(&end);

            let stations = if refinement > 1.0 {
                let grading = EdgeGrading::new(
                    length,
                    base_size,
                    1.0 + (refinement - 1.0) * turning[i] / PI,
                    1.0 + (refinement - 1.0) * turning[(i + 1) % n] / PI,
                );
                grading.stations()
            } else {
                let pieces = ((length / base_size) - 1e-9).ceil().max(1.0) as usize;
                (0..=pieces).map(|k| k as f64 / pieces as f64).collect()
            };

            for w in stations.windows(2) {
                elements.push(BoundaryElement::new(lerp(&start, &end, w[0]), lerp(&start, &end, w[1]), boundary.id));
            }
        }
    }

    debug!(
        "discretised {} boundaries into {} elements (base size {:.4})",
        boundaries.len(),
        elements.len(),
        base_size
    );
    Ok(elements)
}

/// Element density along one edge for adaptive sizing.
///
/// The target size is `base_size` away from the corners and shrinks by
/// the end vertex refinement factor at each end, recovering linearly over
/// `CORNER_SPAN` base sizes (at most half the edge).
#[derive(Debug, Clone, Copy)]
struct EdgeGrading {
    length: f64,
    base_size: f64,
    span: f64,
    start_excess: f64,
    end_excess: f64,
}

/// Distance over which corner refinement decays, in base element sizes
const CORNER_SPAN: f64 = 3.0;

impl EdgeGrading {
    fn new(length: f64, base_size: f64, start_factor: f64, end_factor: f64) -> Self {
        Self {
            length,
            base_size,
            span: (0.5 * length).min(CORNER_SPAN * base_size),
            start_excess: start_factor - 1.0,
            end_excess: end_factor - 1.0,
        }
    }

    /// Integral of the linear decay max(0, 1 - t / span) over [0, s]
    fn ramp(&self, s: f64) -> f64 {
        if self.span <= 0.0 {
            return 0.0;
        }
        let s = s.clamp(0.0, self.span);
        s - s * s / (2.0 * self.span)
    }

    /// Element count between the edge start and arc length `s`
    fn count_to(&self, s: f64) -> f64 {
        let from_end = self.ramp(self.length) - self.ramp(self.length - s);
        (s + self.start_excess * self.ramp(s) + self.end_excess * from_end) / self.base_size
    }

    /// Edge parameters in [0, 1] of the element ends. Elements are
    /// spaced at equal increments of `count_to`, so their lengths follow
    /// the local target size. The count is rounded so that slightly
    /// turning vertices do not split an edge.
    fn stations(&self) -> Vec<f64> {
        let total = self.count_to(self.length);
        let pieces = total.round().max(1.0) as usize;

        let mut stations = Vec::with_capacity(pieces + 1);
        stations.push(0.0);
        for k in 1..pieces {
            let goal = total * k as f64 / pieces as f64;
            let (mut lo, mut hi) = (0.0, self.length);
            for _ in 0..60 {
                let mid = 0.5 * (lo + hi);
                if self.count_to(mid) < goal {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            stations.push(0.5 * (lo + hi) / self.length);
        }
        stations.push(1.0);
        stations
    }
}

/// Absolute change of direction at vertex `i`, in [0, pi]
fn turning_angle(vertices: &[Point2], i: usize) -> f64 {
    let n = vertices.len();
    let prev = vertices[(i + n - 1) % n];
    let here = vertices[i];
    let next = vertices[(i + 1) % n];
    let (ax, ay) = (here.x - prev.x, here.y - prev.y);
    let (bx, by) = (next.x - here.x, next.y - here.y);
    (ax * by - ay * bx).atan2(ax * bx + ay * by).abs()
}

fn lerp(a: &Point2, b: &Point2, t: f64) -> Point2 {
    if t >= 1.0 {
        return *b;
    }
    Point2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}
