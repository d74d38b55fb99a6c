//! Influence of one boundary element at one field point.
//!
//! The full-space part integrates the Kelvin solution over the element in
//! closed form. When a ground surface is present an image correction keeps
//! the surface traction-free: closed form for elements lying on the
//! surface, Gauss-Legendre quadrature otherwise, with the order picked from
//! the ratio of element length to the distance from the mirrored element.

mod half_space;
mod kelvin;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::analysis::PlaneAnalysis;
use crate::elements::{BoundaryElement, Material};
use crate::math::{rotate_to_global, rotate_to_local, GaussLegendre, Point2, Stress2};

use half_space::{field_from_potentials, point_image, surface_coords, surface_segment_image, Potentials, C64};

/// Tolerances and quadrature orders used by the integrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Field points closer to an endpoint than sqrt(tol) * length are singular
    pub endpoint_tolerance: f64,
    /// |local y| below tol * half-length counts as lying on the element
    pub on_element_tolerance: f64,
    /// Endpoint distance to the ground below tol * length puts an element on the surface
    pub surface_tolerance: f64,
    /// (length / distance ratio bound, order) pairs, ascending by bound
    pub quadrature_orders: Vec<(f64, usize)>,
    /// Order for ratios beyond the last bound
    pub max_quadrature_order: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            endpoint_tolerance: 1e-12,
            on_element_tolerance: 1e-10,
            surface_tolerance: 1e-9,
            quadrature_orders: vec![(0.5, 4), (1.0, 8), (2.0, 12)],
            max_quadrature_order: 20,
        }
    }
}

impl IntegratorConfig {
    pub fn quadrature_order(&self, ratio: f64) -> usize {
        self.quadrature_orders
            .iter()
            .find(|(bound, _)| ratio < *bound)
            .map(|(_, order)| *order)
            .unwrap_or(self.max_quadrature_order)
    }
}

/// Unit traction kind on the source element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TractionComponent {
    /// Along the element
    Shear,
    /// Along the inward normal
    Normal,
}

/// Global displacement and stress at a field point due to unit uniform
/// shear and normal tractions on one element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InfluenceCoefficients {
    pub ux_shear: f64,
    pub uy_shear: f64,
    pub ux_normal: f64,
    pub uy_normal: f64,
    pub sxx_shear: f64,
    pub syy_shear: f64,
    pub sxy_shear: f64,
    pub sxx_normal: f64,
    pub syy_normal: f64,
    pub sxy_normal: f64,
}

impl InfluenceCoefficients {
    pub fn stress(&self, component: TractionComponent) -> Stress2 {
        match component {
            TractionComponent::Shear => Stress2::new(self.sxx_shear, self.syy_shear, self.sxy_shear),
            TractionComponent::Normal => Stress2::new(self.sxx_normal, self.syy_normal, self.sxy_normal),
        }
    }

    pub fn displacement(&self, component: TractionComponent) -> (f64, f64) {
        match component {
            TractionComponent::Shear => (self.ux_shear, self.uy_shear),
            TractionComponent::Normal => (self.ux_normal, self.uy_normal),
        }
    }

    /// Stress due to tractions of the given magnitudes
    pub fn weighted_stress(&self, shear: f64, normal: f64) -> Stress2 {
        self.stress(TractionComponent::Shear) * shear + self.stress(TractionComponent::Normal) * normal
    }

    /// Displacement due to tractions of the given magnitudes
    pub fn weighted_displacement(&self, shear: f64, normal: f64) -> (f64, f64) {
        (
            self.ux_shear * shear + self.ux_normal * normal,
            self.uy_shear * shear + self.uy_normal * normal,
        )
    }

    pub fn is_finite(&self) -> bool {
        [
            self.ux_shear,
            self.uy_shear,
            self.ux_normal,
            self.uy_normal,
            self.sxx_shear,
            self.syy_shear,
            self.sxy_shear,
            self.sxx_normal,
            self.syy_normal,
            self.sxy_normal,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    fn add_stress(&mut self, component: TractionComponent, s: Stress2) {
        match component {
            TractionComponent::Shear => {
                self.sxx_shear += s.sxx;
                self.syy_shear += s.syy;
                self.sxy_shear += s.sxy;
            }
            TractionComponent::Normal => {
                self.sxx_normal += s.sxx;
                self.syy_normal += s.syy;
                self.sxy_normal += s.sxy;
            }
        }
    }

    fn add_displacement(&mut self, component: TractionComponent, u: [f64; 2]) {
        match component {
            TractionComponent::Shear => {
                self.ux_shear += u[0];
                self.uy_shear += u[1];
            }
            TractionComponent::Normal => {
                self.ux_normal += u[0];
                self.uy_normal += u[1];
            }
        }
    }
}

/// Computes influence coefficients for a fixed material and plane type
#[derive(Debug, Clone)]
pub struct ElementIntegrator {
    /// Poisson's ratio entering the kernels
    nu: f64,
    g: f64,
    kappa: f64,
    config: IntegratorConfig,
    /// Gauss rules indexed like `config.quadrature_orders`, max order last
    rules: Vec<GaussLegendre>,
}

impl ElementIntegrator {
    pub fn new(material: &Material, plane: PlaneAnalysis, config: IntegratorConfig) -> Self {
        let nu = material.effective_nu(plane);
        let mut rules: Vec<GaussLegendre> = config
            .quadrature_orders
            .iter()
            .map(|(_, order)| GaussLegendre::new(*order))
            .collect();
        rules.push(GaussLegendre::new(config.max_quadrature_order));
        Self {
            nu,
            g: material.g,
            kappa: 3.0 - 4.0 * nu,
            config,
            rules,
        }
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Feed every parameter that changes the coefficients into `hasher`
    pub fn fingerprint(&self, hasher: &mut blake3::Hasher) {
        for v in [
            self.nu,
            self.g,
            self.config.endpoint_tolerance,
            self.config.on_element_tolerance,
            self.config.surface_tolerance,
        ] {
            hasher.update(&v.to_le_bytes());
        }
        for (bound, order) in &self.config.quadrature_orders {
            hasher.update(&bound.to_le_bytes());
            hasher.update(&(*order as u64).to_le_bytes());
        }
        hasher.update(&(self.config.max_quadrature_order as u64).to_le_bytes());
    }

    /// Influence in global coordinates, zero where the point is singular
    /// for the element
    pub fn compute_influence(
        &self,
        point: &Point2,
        element: &BoundaryElement,
        ground_surface_y: f64,
        is_half_space: bool,
    ) -> InfluenceCoefficients {
        self.try_influence(point, element, ground_surface_y, is_half_space)
            .unwrap_or_default()
    }

    /// Influence in global coordinates, `None` when the point coincides
    /// with an element endpoint or the result is not finite
    pub fn try_influence(
        &self,
        point: &Point2,
        element: &BoundaryElement,
        ground_surface_y: f64,
        is_half_space: bool,
    ) -> Option<InfluenceCoefficients> {
        let singular = self.config.endpoint_tolerance * element.length * element.length;
        if element.length <= 0.0
            || point.distance_squared(&element.start) < singular
            || point.distance_squared(&element.end) < singular
        {
            trace!("field point ({}, {}) singular for element", point.x, point.y);
            return None;
        }

        let mut coeffs = self.full_space(point, element);
        if is_half_space {
            self.add_image(&mut coeffs, point, element, ground_surface_y);
        }

        coeffs.is_finite().then_some(coeffs)
    }

    fn full_space(&self, point: &Point2, element: &BoundaryElement) -> InfluenceCoefficients {
        let (c, s) = (element.cos, element.sin);
        let (x, y) = rotate_to_local(point.x - element.midpoint.x, point.y - element.midpoint.y, c, s);
        let local = kelvin::local_influence(
            x,
            y,
            element.half_length(),
            self.nu,
            self.g,
            self.config.on_element_tolerance,
        );

        let (ux_s, uy_s) = rotate_to_global(local.u_shear[0], local.u_shear[1], c, s);
        let (ux_n, uy_n) = rotate_to_global(local.u_normal[0], local.u_normal[1], c, s);
        let ss = Stress2::new(local.s_shear[0], local.s_shear[1], local.s_shear[2]).to_global(c, s);
        let sn = Stress2::new(local.s_normal[0], local.s_normal[1], local.s_normal[2]).to_global(c, s);

        InfluenceCoefficients {
            ux_shear: ux_s,
            uy_shear: uy_s,
            ux_normal: ux_n,
            uy_normal: uy_n,
            sxx_shear: ss.sxx,
            syy_shear: ss.syy,
            sxy_shear: ss.sxy,
            sxx_normal: sn.sxx,
            syy_normal: sn.syy,
            sxy_normal: sn.sxy,
        }
    }

    fn add_image(&self, coeffs: &mut InfluenceCoefficients, point: &Point2, element: &BoundaryElement, ground: f64) {
        let zz = surface_coords(point.x, point.y, ground);
        let along = C64::new(element.cos, element.sin);
        let forces = [
            (TractionComponent::Shear, along),
            (TractionComponent::Normal, C64::new(0.0, 1.0) * along),
        ];

        let surface_tol = self.config.surface_tolerance * element.length.max(1.0);
        let on_surface = (element.start.y - ground).abs() < surface_tol
            && (element.end.y - ground).abs() < surface_tol;

        if on_surface {
            let t1 = element.start.x.min(element.end.x);
            let t2 = element.start.x.max(element.end.x);
            for (component, force) in forces {
                let p = surface_segment_image(zz, t1, t2, force, self.kappa);
                let (stress, u) = field_from_potentials(zz, &p, self.kappa, self.g);
                coeffs.add_stress(component, stress);
                coeffs.add_displacement(component, u);
            }
            return;
        }

        let mirrored = Point2::new(element.midpoint.x, 2.0 * ground - element.midpoint.y);
        let distance = point.distance_to(&mirrored);
        let ratio = if distance > 0.0 { element.length / distance } else { f64::INFINITY };
        let rule = self.rule_for(ratio);

        let a = element.half_length();
        let mid = C64::new(element.midpoint.x, element.midpoint.y - ground);
        for (component, force) in forces {
            let mut acc = Potentials::zero();
            for (xi, w) in rule.iter() {
                let zz0 = mid + along * (xi * a);
                acc += point_image(zz, zz0, force, self.kappa) * (w * a);
            }
            let (stress, u) = field_from_potentials(zz, &acc, self.kappa, self.g);
            coeffs.add_stress(component, stress);
            coeffs.add_displacement(component, u);
        }
    }

    fn rule_for(&self, ratio: f64) -> &GaussLegendre {
        let idx = self
            .config
            .quadrature_orders
            .iter()
            .position(|(bound, _)| ratio < *bound)
            .unwrap_or(self.rules.len() - 1);
        &self.rules[idx]
    }
}
