//! Image correction for a traction-free horizontal ground surface.
//!
//! The correction is the complementary part of Melan's solution for a
//! point force below the surface of a half-space, written in terms of
//! Kolosov-Muskhelishvili potentials (phi, psi). Coordinates are shifted
//! so the surface is Im(z) = 0 and the rock occupies Im(z) < 0.

use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul};

use nalgebra::Complex;

use crate::math::Stress2;

pub(crate) type C64 = Complex<f64>;

/// phi, phi', phi'', psi, psi' at one field point
#[derive(Debug, Clone, Copy)]
pub(crate) struct Potentials {
    pub phi: C64,
    pub dphi: C64,
    pub ddphi: C64,
    pub psi: C64,
    pub dpsi: C64,
}

impl Potentials {
    pub fn zero() -> Self {
        let z = C64::new(0.0, 0.0);
        Self { phi: z, dphi: z, ddphi: z, psi: z, dpsi: z }
    }
}

impl Add for Potentials {
    type Output = Potentials;

    fn add(self, rhs: Potentials) -> Potentials {
        Potentials {
            phi: self.phi + rhs.phi,
            dphi: self.dphi + rhs.dphi,
            ddphi: self.ddphi + rhs.ddphi,
            psi: self.psi + rhs.psi,
            dpsi: self.dpsi + rhs.dpsi,
        }
    }
}

impl AddAssign for Potentials {
    fn add_assign(&mut self, rhs: Potentials) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for Potentials {
    type Output = Potentials;

    fn mul(self, w: f64) -> Potentials {
        Potentials {
            phi: self.phi * w,
            dphi: self.dphi * w,
            ddphi: self.ddphi * w,
            psi: self.psi * w,
            dpsi: self.dpsi * w,
        }
    }
}

/// Field point in surface coordinates. Points on or above the surface get
/// Im = -0.0 so logarithms are taken on the branch seen from the rock.
pub(crate) fn surface_coords(x: f64, y: f64, ground: f64) -> C64 {
    let im = y - ground;
    C64::new(x, if im < 0.0 { im } else { -0.0 })
}

/// Force-dependent amplitude A = -F / (2 pi (1 + kappa))
#[inline]
fn amplitude(force: C64, kappa: f64) -> C64 {
    -force / (2.0 * PI * (1.0 + kappa))
}

/// Image potentials at `zz` for a unit-length force `force` applied at
/// `zz0` (both in surface coordinates, Im(zz0) < 0)
pub(crate) fn point_image(zz: C64, zz0: C64, force: C64, kappa: f64) -> Potentials {
    let a = amplitude(force, kappa);
    let ab = a.conj();
    let w = zz0.conj();
    let dd = zz0 - w;
    let d = zz - w;
    let d2 = d * d;
    let d3 = d2 * d;
    let ln_d = d.ln();

    Potentials {
        phi: kappa * a * ln_d - ab + ab * dd / d,
        dphi: kappa * a / d - ab * dd / d2,
        ddphi: -kappa * a / d2 + 2.0 * ab * dd / d3,
        psi: -ab * ln_d - kappa * zz * a / d + zz * ab * dd / d2,
        dpsi: -ab / d - kappa * a / d + kappa * zz * a / d2 + ab * dd / d2 - 2.0 * zz * ab * dd / d3,
    }
}

/// Image potentials of a uniform force per unit length spread over the
/// surface segment t in [t1, t2], integrated in closed form
pub(crate) fn surface_segment_image(zz: C64, t1: f64, t2: f64, force: C64, kappa: f64) -> Potentials {
    let a = amplitude(force, kappa);
    let ab = a.conj();

    // Antiderivatives in t of ln(zz - t), 1/(zz - t) and 1/(zz - t)^2
    let i_log = |t: f64| {
        let d = zz - t;
        -(d * d.ln() - d)
    };
    let i_inv = |t: f64| -(zz - t).ln();
    let i_inv2 = |t: f64| C64::new(1.0, 0.0) / (zz - t);

    let l_log = i_log(t2) - i_log(t1);
    let l_inv = i_inv(t2) - i_inv(t1);
    let l_inv2 = i_inv2(t2) - i_inv2(t1);

    Potentials {
        phi: kappa * a * l_log - ab * (t2 - t1),
        dphi: kappa * a * l_inv,
        ddphi: -kappa * a * l_inv2,
        psi: -ab * l_log - kappa * zz * a * l_inv,
        dpsi: -ab * l_inv - kappa * a * l_inv + kappa * zz * a * l_inv2,
    }
}

/// Stress (global) and displacement from potentials at `zz`
pub(crate) fn field_from_potentials(zz: C64, p: &Potentials, kappa: f64, g: f64) -> (Stress2, [f64; 2]) {
    let s = 4.0 * p.dphi.re;
    let dd = 2.0 * (zz.conj() * p.ddphi + p.dpsi);
    let stress = Stress2::new(0.5 * (s - dd.re), 0.5 * (s + dd.re), 0.5 * dd.im);
    let u = (kappa * p.phi - zz * p.dphi.conj() - p.psi.conj()) / (2.0 * g);
    (stress, [u.re, u.im])
}
