//! Closed-form integration of the Kelvin point-force solution over a
//! straight element carrying uniform tractions (fictitious stress method).

use std::f64::consts::PI;

/// Potential function f(x, y) and its derivatives, integrated over the
/// element, evaluated in the element frame
#[derive(Debug, Clone, Copy)]
pub(crate) struct KernelDerivatives {
    /// Local y, snapped to zero on the element itself
    pub y: f64,
    pub f: f64,
    pub fx: f64,
    pub fy: f64,
    pub fxy: f64,
    /// f,yy; harmonic, so f,xx = -f,yy
    pub fyy: f64,
}

/// Influence in the element frame: `[ux, uy]` and `[sxx, syy, sxy]` for a
/// unit shear (local x) and a unit normal (local y) traction
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LocalInfluence {
    pub u_shear: [f64; 2],
    pub u_normal: [f64; 2],
    pub s_shear: [f64; 3],
    pub s_normal: [f64; 3],
}

/// Derivatives of f at local point (x, y) for an element spanning
/// [-a, a] on the local x-axis.
///
/// Points on the element (|y| < on_element_tol * a, |x| < a) take the
/// limit from the positive-y (rock) side.
pub(crate) fn kernel_derivatives(x: f64, y: f64, a: f64, nu: f64, on_element_tol: f64) -> KernelDerivatives {
    let c = -1.0 / (4.0 * PI * (1.0 - nu));
    let x1 = x - a;
    let x2 = x + a;

    let (y, th1, th2) = if y.abs() < on_element_tol * a && x.abs() < a {
        (0.0, PI, 0.0)
    } else {
        (y, y.atan2(x1), y.atan2(x2))
    };

    let r1s = x1 * x1 + y * y;
    let r2s = x2 * x2 + y * y;
    let ln_r1 = 0.5 * r1s.ln();
    let ln_r2 = 0.5 * r2s.ln();

    KernelDerivatives {
        y,
        f: c * (y * (th1 - th2) - x1 * ln_r1 + x2 * ln_r2),
        fx: c * (ln_r2 - ln_r1),
        fy: c * (th1 - th2),
        fxy: c * (y / r2s - y / r1s),
        fyy: c * (x1 / r1s - x2 / r2s),
    }
}

/// Plane-strain influence of an element in its own frame
pub(crate) fn local_influence(x: f64, y: f64, a: f64, nu: f64, g: f64, on_element_tol: f64) -> LocalInfluence {
    let d = kernel_derivatives(x, y, a, nu, on_element_tol);
    let kappa = 3.0 - 4.0 * nu;
    let two_g = 2.0 * g;
    let y = d.y;

    LocalInfluence {
        u_shear: [(kappa * d.f + y * d.fy) / two_g, -y * d.fx / two_g],
        u_normal: [-y * d.fx / two_g, (kappa * d.f - y * d.fy) / two_g],
        s_shear: [
            (3.0 - 2.0 * nu) * d.fx + y * d.fxy,
            -(1.0 - 2.0 * nu) * d.fx - y * d.fxy,
            2.0 * (1.0 - nu) * d.fy + y * d.fyy,
        ],
        s_normal: [
            2.0 * nu * d.fy + y * d.fyy,
            2.0 * (1.0 - nu) * d.fy - y * d.fyy,
            (1.0 - 2.0 * nu) * d.fx - y * d.fxy,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NU: f64 = 0.25;

    #[test]
    fn test_first_derivatives_match_finite_differences() {
        let (x, y, a, h) = (0.7, 0.9, 0.5, 1e-6);
        let d = kernel_derivatives(x, y, a, NU, 1e-10);
        let fx = (kernel_derivatives(x + h, y, a, NU, 1e-10).f - kernel_derivatives(x - h, y, a, NU, 1e-10).f) / (2.0 * h);
        let fy = (kernel_derivatives(x, y + h, a, NU, 1e-10).f - kernel_derivatives(x, y - h, a, NU, 1e-10).f) / (2.0 * h);
        assert_relative_eq!(d.fx, fx, epsilon = 1e-7);
        assert_relative_eq!(d.fy, fy, epsilon = 1e-7);
    }

    #[test]
    fn test_second_derivatives_match_finite_differences() {
        let (x, y, a, h) = (-0.3, 1.4, 1.0, 1e-6);
        let d = kernel_derivatives(x, y, a, NU, 1e-10);
        let plus = kernel_derivatives(x + h, y, a, NU, 1e-10);
        let minus = kernel_derivatives(x - h, y, a, NU, 1e-10);
        assert_relative_eq!(-d.fyy, (plus.fx - minus.fx) / (2.0 * h), epsilon = 1e-6);
        assert_relative_eq!(d.fxy, (plus.fy - minus.fy) / (2.0 * h), epsilon = 1e-6);
    }

    #[test]
    fn test_self_term_is_half_traction() {
        // Unit traction on the element produces half of it on the rock side
        let inf = local_influence(0.0, 0.0, 0.5, NU, 4000.0, 1e-10);
        assert_relative_eq!(inf.s_normal[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(inf.s_shear[2], -0.5, epsilon = 1e-12);
        assert_relative_eq!(inf.s_normal[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(inf.s_shear[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_far_point_decays() {
        let near = local_influence(0.0, 2.0, 0.5, NU, 4000.0, 1e-10);
        let far = local_influence(0.0, 200.0, 0.5, NU, 4000.0, 1e-10);
        // Net line force, so stresses fall off like 1/r
        assert!(far.s_normal[1].abs() < 0.05 * near.s_normal[1].abs());
        assert!(far.s_normal[1].abs() > 0.0);
    }
}
