//! Principal stresses, invariants and strength factor
//!
//! Tension is positive throughout; `sigma1` is the most compressive
//! (algebraically smallest) principal stress.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::Stress2;
use crate::results::FieldPoint;

/// In-plane principal stresses
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Principal2D {
    pub sigma1: f64,
    pub sigma3: f64,
    /// Direction of `sigma1` in degrees from +x, in [-90, 90)
    pub angle: f64,
}

/// Principal stresses including the out-of-plane component, ascending
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Principal3D {
    pub sigma1: f64,
    pub sigma2: f64,
    pub sigma3: f64,
}

impl Principal3D {
    pub fn as_array(&self) -> [f64; 3] {
        [self.sigma1, self.sigma2, self.sigma3]
    }
}

/// Stress invariants
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StressInvariants {
    /// First invariant of the stress tensor
    pub i1: f64,
    /// Second invariant of the deviator
    pub j2: f64,
    /// Lode angle in radians, in [-pi/6, pi/6]
    pub lode_angle: f64,
}

/// Strength criterion evaluated on principal stresses. Implementations
/// return capacity over demand, so values below 1 indicate failure.
pub trait StrengthCriterion: Send + Sync {
    fn name(&self) -> &str;

    fn strength_factor(&self, principal: &Principal3D) -> f64;
}

pub fn principal_2d(s: &Stress2) -> Principal2D {
    let center = 0.5 * (s.sxx + s.syy);
    let half_diff = 0.5 * (s.sxx - s.syy);
    let radius = (half_diff * half_diff + s.sxy * s.sxy).sqrt();

    // atan2 gives the direction of the algebraically largest stress
    let major_tensile = 0.5 * (2.0 * s.sxy).atan2(s.sxx - s.syy).to_degrees();
    Principal2D {
        sigma1: center - radius,
        sigma3: center + radius,
        angle: normalize_angle(major_tensile + 90.0),
    }
}

/// Wrap an axis direction into [-90, 90) degrees
pub fn normalize_angle(deg: f64) -> f64 {
    let wrapped = (deg + 90.0).rem_euclid(180.0) - 90.0;
    if wrapped >= 90.0 {
        wrapped - 180.0
    } else {
        wrapped
    }
}

pub fn principal_3d(s: &Stress2, szz: f64) -> Principal3D {
    let p = principal_2d(s);
    let mut values = [p.sigma1, p.sigma3, szz];
    values.sort_by(|a, b| a.total_cmp(b));
    Principal3D {
        sigma1: values[0],
        sigma2: values[1],
        sigma3: values[2],
    }
}

pub fn invariants(p: &Principal3D) -> StressInvariants {
    let i1 = p.sigma1 + p.sigma2 + p.sigma3;
    let mean = i1 / 3.0;
    let s = [p.sigma1 - mean, p.sigma2 - mean, p.sigma3 - mean];
    let j2 = 0.5 * (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]);
    let j3 = s[0] * s[1] * s[2];

    let lode_angle = if j2 > 1e-14 * (1.0 + i1 * i1) {
        let arg = -1.5 * 3f64.sqrt() * j3 / j2.powf(1.5);
        arg.clamp(-1.0, 1.0).asin() / 3.0
    } else {
        0.0
    };
    StressInvariants { i1, j2, lode_angle }
}

/// Fill the derived quantities of every field point in parallel
pub fn post_process(points: &mut [FieldPoint], criterion: Option<&dyn StrengthCriterion>) {
    points.par_iter_mut().for_each(|fp| {
        let in_plane = Stress2::new(fp.sxx, fp.syy, fp.sxy);
        let p2 = principal_2d(&in_plane);
        let p3 = principal_3d(&in_plane, fp.szz);
        fp.sigma1 = p2.sigma1;
        fp.sigma3 = p2.sigma3;
        fp.angle = p2.angle;
        fp.principal = p3;
        fp.invariants = invariants(&p3);
        fp.strength_factor = criterion.map(|c| c.strength_factor(&p3));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_principal_of_axis_aligned_state() {
        let p = principal_2d(&Stress2::new(-10.0, -5.0, 0.0));
        assert_relative_eq!(p.sigma1, -10.0);
        assert_relative_eq!(p.sigma3, -5.0);
        assert_relative_eq!(p.angle, 0.0, epsilon = 1e-12);

        let p = principal_2d(&Stress2::new(-5.0, -10.0, 0.0));
        assert_relative_eq!(p.angle, -90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_principal_angle_of_rotated_state() {
        let s = crate::loads::FarFieldStress::new(-12.0, -4.0, 30.0).to_cartesian();
        let p = principal_2d(&s);
        assert_relative_eq!(p.sigma1, -12.0, epsilon = 1e-12);
        assert_relative_eq!(p.sigma3, -4.0, epsilon = 1e-12);
        assert_relative_eq!(p.angle, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(90.0), -90.0);
        assert_relative_eq!(normalize_angle(135.0), -45.0);
        assert_relative_eq!(normalize_angle(-100.0), 80.0);
        assert_relative_eq!(normalize_angle(45.0), 45.0);
    }

    #[test]
    fn test_invariants() {
        let p = Principal3D { sigma1: -12.0, sigma2: -6.0, sigma3: 0.0 };
        let inv = invariants(&p);
        assert_relative_eq!(inv.i1, -18.0);
        assert_relative_eq!(inv.j2, 36.0, epsilon = 1e-12);
        assert_relative_eq!(inv.lode_angle, 0.0, epsilon = 1e-12);

        let hydro = invariants(&Principal3D { sigma1: -5.0, sigma2: -5.0, sigma3: -5.0 });
        assert_eq!(hydro.lode_angle, 0.0);
        assert_relative_eq!(hydro.j2, 0.0);
    }

    #[test]
    fn test_principal_3d_sorting() {
        let p = principal_3d(&Stress2::new(-10.0, -4.0, 0.0), -7.0);
        assert_eq!(p.as_array(), [-10.0, -7.0, -4.0]);
    }
}
