//! Scattered field points onto a regular output grid
//!
//! Inverse-distance weighting (1/d^2) over the points found in the 3x3
//! block of buckets around the query, widening the ring until at least
//! one point is found.

use crate::math::{Bounds, Point2, Stress2};
use crate::postprocess::principal_2d;
use crate::results::{FieldPoint, StressSample};

/// Squared distance treated as an exact hit
const EXACT_MATCH: f64 = 1e-20;

const MAX_BUCKETS_PER_AXIS: usize = 1024;

/// Uniform bucket grid over the field points
#[derive(Debug, Clone)]
pub struct BucketInterpolator<'a> {
    points: &'a [FieldPoint],
    bounds: Bounds,
    cell: f64,
    nx: usize,
    ny: usize,
    buckets: Vec<Vec<usize>>,
}

impl<'a> BucketInterpolator<'a> {
    /// Returns `None` when there are no field points
    pub fn new(points: &'a [FieldPoint]) -> Option<Self> {
        let locations: Vec<Point2> = points.iter().map(|p| p.location).collect();
        let bounds = Bounds::from_points(&locations)?;

        // About two points per bucket on average, at most MAX_BUCKETS_PER_AXIS
        let extent = bounds.width().max(bounds.height());
        let area = bounds.width() * bounds.height();
        let mut cell = (2.0 * area / points.len() as f64).sqrt().max(extent / MAX_BUCKETS_PER_AXIS as f64);
        if !(cell.is_finite() && cell > 0.0) {
            cell = 1.0;
        }
        let nx = ((bounds.width() / cell).floor() as usize + 1).max(1);
        let ny = ((bounds.height() / cell).floor() as usize + 1).max(1);

        let mut buckets = vec![Vec::new(); nx * ny];
        for (idx, p) in points.iter().enumerate() {
            let (i, j) = Self::cell_of(&bounds, cell, nx, ny, &p.location);
            buckets[j * nx + i].push(idx);
        }

        Some(Self {
            points,
            bounds,
            cell,
            nx,
            ny,
            buckets,
        })
    }

    fn cell_of(bounds: &Bounds, cell: f64, nx: usize, ny: usize, p: &Point2) -> (usize, usize) {
        let fi = ((p.x - bounds.min_x) / cell).floor();
        let fj = ((p.y - bounds.min_y) / cell).floor();
        let i = if fi.is_finite() && fi > 0.0 { (fi as usize).min(nx - 1) } else { 0 };
        let j = if fj.is_finite() && fj > 0.0 { (fj as usize).min(ny - 1) } else { 0 };
        (i, j)
    }

    /// Interpolated sample at `p`; principal values are recomputed from
    /// the interpolated tensor
    pub fn interpolate(&self, p: Point2) -> Option<StressSample> {
        let (ci, cj) = Self::cell_of(&self.bounds, self.cell, self.nx, self.ny, &p);
        let max_ring = self.nx.max(self.ny);

        for ring in 1..=max_ring {
            let neighbours = self.collect_ring(ci, cj, ring);
            if neighbours.is_empty() {
                continue;
            }

            let mut weight_sum = 0.0;
            let mut acc = [0.0; 5];
            for idx in neighbours {
                let fp = &self.points[idx];
                let d2 = fp.location.distance_squared(&p);
                if d2 < EXACT_MATCH {
                    return Some(sample_from(p, fp.sxx, fp.syy, fp.sxy, fp.ux, fp.uy));
                }
                let w = 1.0 / d2;
                weight_sum += w;
                for (a, v) in acc.iter_mut().zip([fp.sxx, fp.syy, fp.sxy, fp.ux, fp.uy]) {
                    *a += w * v;
                }
            }
            let [sxx, syy, sxy, ux, uy] = acc.map(|v| v / weight_sum);
            return Some(sample_from(p, sxx, syy, sxy, ux, uy));
        }
        None
    }

    /// Indices of points in the (2 ring + 1)^2 block of buckets around
    /// (ci, cj). Inner buckets are known empty once ring > 1.
    fn collect_ring(&self, ci: usize, cj: usize, ring: usize) -> Vec<usize> {
        let r = ring as isize;
        let mut found = Vec::new();
        for dj in -r..=r {
            for di in -r..=r {
                let i = ci as isize + di;
                let j = cj as isize + dj;
                if i < 0 || j < 0 || i >= self.nx as isize || j >= self.ny as isize {
                    continue;
                }
                found.extend_from_slice(&self.buckets[j as usize * self.nx + i as usize]);
            }
        }
        found
    }
}

fn sample_from(p: Point2, sxx: f64, syy: f64, sxy: f64, ux: f64, uy: f64) -> StressSample {
    let principal = principal_2d(&Stress2::new(sxx, syy, sxy));
    StressSample {
        x: p.x,
        y: p.y,
        sigma1: principal.sigma1,
        sigma3: principal.sigma3,
        angle: principal.angle,
        ux,
        uy,
        valid: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field(values: &[(f64, f64, f64)]) -> Vec<FieldPoint> {
        values
            .iter()
            .map(|&(x, y, sxx)| FieldPoint {
                sxx,
                syy: -1.0,
                ..FieldPoint::at(Point2::new(x, y))
            })
            .collect()
    }

    #[test]
    fn test_exact_match_fast_path() {
        let pts = field(&[(0.0, 0.0, -10.0), (1.0, 0.0, -2.0), (0.0, 1.0, -4.0), (1.0, 1.0, -6.0)]);
        let interp = BucketInterpolator::new(&pts).unwrap();
        let s = interp.interpolate(Point2::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(s.sigma1, -2.0);
        assert_relative_eq!(s.sigma3, -1.0);
        assert!(s.valid);
    }

    #[test]
    fn test_midpoint_is_weighted_average() {
        let pts = field(&[(0.0, 0.0, -10.0), (2.0, 0.0, -6.0)]);
        let interp = BucketInterpolator::new(&pts).unwrap();
        let s = interp.interpolate(Point2::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(s.sigma1, -8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_far_query_expands_search() {
        let pts: Vec<FieldPoint> = (0..100)
            .map(|k| FieldPoint {
                sxx: -3.0,
                syy: -3.0,
                ..FieldPoint::at(Point2::new((k % 10) as f64, (k / 10) as f64))
            })
            .collect();
        let interp = BucketInterpolator::new(&pts).unwrap();
        let s = interp.interpolate(Point2::new(40.0, -30.0)).unwrap();
        assert_relative_eq!(s.sigma1, -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_field() {
        assert!(BucketInterpolator::new(&[]).is_none());
    }
}
