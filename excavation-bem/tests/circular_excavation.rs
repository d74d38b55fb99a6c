//! End-to-end checks on circular openings

use std::sync::Arc;

use approx::assert_relative_eq;
use excavation_bem::analysis::PlaneAnalysis;
use excavation_bem::assembly::InfluenceMatrixBuilder;
use excavation_bem::discretize::discretize;
use excavation_bem::integrator::{ElementIntegrator, IntegratorConfig};
use excavation_bem::linear_solver::SolveMethod;
use excavation_bem::prelude::*;

fn rock() -> Material {
    Material::new(10_000.0, 0.25)
}

fn tunnel(radius: f64, segments: usize) -> Boundary {
    Boundary::circle(0, BoundaryKind::Excavation, Point2::new(0.0, 0.0), radius, segments)
}

fn solver(elements: usize) -> BoundaryElementSolver {
    BoundaryElementSolver::new(SolverOptions::default().with_element_count(elements), BemConfig::default()).unwrap()
}

/// Kirsch solution (srr, stt) for sxx = px, syy = py at unit radius
fn kirsch(px: f64, py: f64, r: f64, theta: f64) -> (f64, f64) {
    let uniaxial = |s: f64, th: f64| {
        let a2 = 1.0 / (r * r);
        let srr = 0.5 * s * (1.0 - a2) + 0.5 * s * (1.0 - 4.0 * a2 + 3.0 * a2 * a2) * (2.0 * th).cos();
        let stt = 0.5 * s * (1.0 + a2) - 0.5 * s * (1.0 + 3.0 * a2 * a2) * (2.0 * th).cos();
        (srr, stt)
    };
    let (a_rr, a_tt) = uniaxial(px, theta);
    let (b_rr, b_tt) = uniaxial(py, theta - std::f64::consts::FRAC_PI_2);
    (a_rr + b_rr, a_tt + b_tt)
}

fn polar(fp: &FieldPoint, theta: f64) -> (f64, f64) {
    let (c, s) = (theta.cos(), theta.sin());
    let srr = fp.sxx * c * c + fp.syy * s * s + 2.0 * fp.sxy * c * s;
    let stt = fp.sxx * s * s + fp.syy * c * c - 2.0 * fp.sxy * c * s;
    (srr, stt)
}

#[test]
fn test_worked_scenario_matrix() {
    let integrator = ElementIntegrator::new(&rock(), PlaneAnalysis::PlaneStrain, IntegratorConfig::default());

    let mut conditions = Vec::new();
    for n in [16, 32, 64] {
        let elements = discretize(&[tunnel(5.0, n)], n, &BemConfig::default()).unwrap();
        assert_eq!(elements.len(), n);

        let mut builder = InfluenceMatrixBuilder::new(false);
        let a = builder.build_matrix(&integrator, &elements, 10.0, true).unwrap();
        assert_eq!(a.shape(), (2 * n, 2 * n));
        assert!(a.iter().all(|v| v.is_finite()));

        let sv = (*a).clone().svd(false, false).singular_values;
        let cond = sv.max() / sv.min();
        assert!(cond < 1e12, "condition number {} for {} elements", cond, n);
        conditions.push(cond);
    }
    // Growth from 16 to 64 elements bounded by (64 / 16)^2.5
    assert!(conditions[2] / conditions[0] <= 4.0_f64.powf(2.5));

    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0))
        .with_boundary(tunnel(5.0, 32))
        .with_ground_surface(10.0);
    let mut s = solver(32);
    let analysis = s.solve(&problem).unwrap();
    assert!(s.last_statistics().half_space_used);
    assert_eq!(s.last_statistics().solve_method, Some(SolveMethod::DirectLu));

    let peak = analysis.solution.amax();
    assert!(peak > 1e-10 && peak < 1e6, "solution magnitude {}", peak);
    assert!(analysis.field_points.iter().all(|fp| fp.is_finite()));
    assert!(analysis.stress_field.valid_samples().count() > 0);
}

#[test]
fn test_kirsch_benchmark() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(1.0, 64));
    let analysis = solver(64).solve(&problem).unwrap();

    for r in [1.5, 2.0] {
        for theta_deg in [0.0_f64, 30.0, 45.0, 90.0] {
            let theta = theta_deg.to_radians();
            let fp = analysis.evaluate(Point2::new(r * theta.cos(), r * theta.sin()));
            let (srr, stt) = polar(&fp, theta);
            let (exp_rr, exp_tt) = kirsch(-10.0, -5.0, r, theta);
            assert_relative_eq!(srr, exp_rr, epsilon = 0.3);
            assert_relative_eq!(stt, exp_tt, epsilon = 0.3);
        }
    }

    // Far away the opening is invisible
    let far = analysis.evaluate(Point2::new(60.0, 40.0));
    assert_relative_eq!(far.sxx, -10.0, epsilon = 0.05);
    assert_relative_eq!(far.syy, -5.0, epsilon = 0.05);
}

#[test]
fn test_parallel_evaluation_is_thread_count_invariant() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 30.0))
        .with_boundary(tunnel(5.0, 32))
        .with_ground_surface(10.0);

    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        pool.install(|| solver(32).solve(&problem).unwrap())
    };
    let serial = run(1);
    let parallel = run(4);

    assert_eq!(serial.field_points, parallel.field_points);
    assert_eq!(serial.stress_field, parallel.stress_field);
}

#[test]
fn test_rigid_motion_invariance() {
    let base = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(2.0, 32));
    let reference = solver(32).solve(&base).unwrap();

    let probes = [Point2::new(2.5, 0.0), Point2::new(0.0, 3.0), Point2::new(-2.2, 1.7)];

    // Translation
    let moved = BemProblem {
        boundaries: base.boundaries.iter().map(|b| b.translated(7.0, -3.0)).collect(),
        ..base.clone()
    };
    let translated = solver(32).solve(&moved).unwrap();
    for p in probes {
        let a = reference.evaluate(p);
        let b = translated.evaluate(p.translated(7.0, -3.0));
        assert_relative_eq!(a.sxx, b.sxx, epsilon = 1e-8);
        assert_relative_eq!(a.syy, b.syy, epsilon = 1e-8);
        assert_relative_eq!(a.sxy, b.sxy, epsilon = 1e-8);
    }

    // Rotation of geometry and load together
    let angle = 30.0_f64;
    let origin = Point2::new(0.0, 0.0);
    let turned = BemProblem {
        boundaries: base.boundaries.iter().map(|b| b.rotated(&origin, angle.to_radians())).collect(),
        far_field: FarFieldStress::new(-10.0, -5.0, angle),
        ..base.clone()
    };
    let rotated = solver(32).solve(&turned).unwrap();
    for p in probes {
        let a = reference.evaluate(p);
        let b = rotated.evaluate(p.rotated_about(&origin, angle.to_radians()));
        assert_relative_eq!(a.sigma1, b.sigma1, epsilon = 1e-8);
        assert_relative_eq!(a.sigma3, b.sigma3, epsilon = 1e-8);
        let turn = (b.angle - a.angle - angle).rem_euclid(180.0);
        assert!(turn < 1e-6 || 180.0 - turn < 1e-6, "angle {} -> {}", a.angle, b.angle);
    }
}

#[test]
fn test_result_cache_behaviour() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(5.0, 32));
    let mut s = solver(32);

    let first = s.solve(&problem).unwrap();
    assert!(!s.last_statistics().result_cache_hit);

    let second = s.solve(&problem).unwrap();
    assert!(s.last_statistics().result_cache_hit);
    assert!(Arc::ptr_eq(&first, &second));

    let mut nudged = problem.clone();
    nudged.boundaries[0].vertices[5].x += 1e-6;
    let third = s.solve(&nudged).unwrap();
    assert!(!s.last_statistics().result_cache_hit);
    assert!(!s.last_statistics().matrix_cache_hit);
    assert!(!Arc::ptr_eq(&first, &third));

    s.clear_caches();
    let recomputed = s.solve(&problem).unwrap();
    let stats = s.last_statistics();
    assert!(!stats.result_cache_hit);
    assert!(!stats.matrix_cache_hit);
    assert!(!stats.solution_cache_hit);
    assert!(!Arc::ptr_eq(&first, &recomputed));
    for (a, b) in first.field_points.iter().zip(&recomputed.field_points) {
        assert_relative_eq!(a.sigma1, b.sigma1, epsilon = 1e-9);
        assert_relative_eq!(a.ux, b.ux, epsilon = 1e-12);
    }
}

#[test]
fn test_caching_disabled_always_recomputes() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(5.0, 16));
    let mut s = BoundaryElementSolver::new(
        SolverOptions::default().with_element_count(16),
        BemConfig::default().with_caching(false),
    )
    .unwrap();
    let first = s.solve(&problem).unwrap();
    let second = s.solve(&problem).unwrap();
    assert!(!s.last_statistics().result_cache_hit);
    assert!(!s.last_statistics().matrix_cache_hit);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.field_points, second.field_points);
}

#[test]
fn test_zero_load_gives_zero_field() {
    let problem = BemProblem::new(rock(), FarFieldStress::zero())
        .with_boundary(tunnel(5.0, 32))
        .with_ground_surface(10.0);
    let analysis = solver(32).solve(&problem).unwrap();

    assert!(analysis.solution.iter().all(|v| *v == 0.0));
    for fp in &analysis.field_points {
        assert_eq!(fp.sxx, 0.0);
        assert_eq!(fp.syy, 0.0);
        assert_eq!(fp.ux, 0.0);
    }
}

#[test]
fn test_iterative_path_matches_direct() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 20.0))
        .with_boundary(tunnel(5.0, 48))
        .with_ground_surface(12.0);
    let options = SolverOptions::default().with_element_count(48).with_tolerance(1e-12);

    let mut direct = BoundaryElementSolver::new(options.clone(), BemConfig::default()).unwrap();
    let mut iterative =
        BoundaryElementSolver::new(options, BemConfig::default().with_direct_threshold(0)).unwrap();

    let a = direct.solve(&problem).unwrap();
    let b = iterative.solve(&problem).unwrap();
    assert_eq!(direct.last_statistics().solve_method, Some(SolveMethod::DirectLu));
    assert_eq!(iterative.last_statistics().solve_method, Some(SolveMethod::BiCgStab));
    assert!(iterative.last_statistics().iterations > 0);

    let scale = a.solution.amax();
    for (x, y) in a.solution.iter().zip(b.solution.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-8 * scale);
    }
}

#[test]
fn test_plane_stress_has_no_out_of_plane_stress() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(5.0, 24));
    let options = SolverOptions::plane_stress().with_element_count(24);
    let analysis = BoundaryElementSolver::new(options, BemConfig::default())
        .unwrap()
        .solve(&problem)
        .unwrap();
    assert!(analysis.field_points.iter().all(|fp| fp.szz == 0.0));
}

#[test]
fn test_invalid_requests_are_rejected() {
    assert!(BoundaryElementSolver::new(
        SolverOptions::default().with_element_type(ElementType::Linear),
        BemConfig::default()
    )
    .is_err());

    let mut s = solver(16);
    let empty = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0));
    assert!(matches!(s.solve(&empty), Err(BEMError::InvalidGeometry(_))));

    let bad_material = BemProblem::new(Material::new(10_000.0, 0.5), FarFieldStress::zero()).with_boundary(tunnel(1.0, 16));
    assert!(s.solve(&bad_material).is_err());
    assert!(!s.last_statistics().success);

    let above_ground = BemProblem::new(rock(), FarFieldStress::zero())
        .with_boundary(tunnel(5.0, 16))
        .with_ground_surface(2.0);
    assert!(!s.can_solve(&above_ground));
}

#[test]
fn test_strength_criterion_is_applied() {
    struct MohrCoulomb {
        cohesion: f64,
        friction_deg: f64,
    }

    impl StrengthCriterion for MohrCoulomb {
        fn name(&self) -> &str {
            "mohr-coulomb"
        }

        fn strength_factor(&self, p: &Principal3D) -> f64 {
            // Compression negative: major is the most negative
            let phi = self.friction_deg.to_radians();
            let (major, minor) = (-p.sigma1, -p.sigma3);
            let k = (1.0 + phi.sin()) / (1.0 - phi.sin());
            let strength = 2.0 * self.cohesion * k.sqrt() + k * minor;
            if major.abs() < 1e-12 {
                f64::INFINITY
            } else {
                strength / major
            }
        }
    }

    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(5.0, 24));
    let criterion = Arc::new(MohrCoulomb { cohesion: 2.0, friction_deg: 30.0 });
    let analysis = solver(24).with_strength_criterion(criterion).solve(&problem).unwrap();
    assert!(analysis.field_points.iter().all(|fp| fp.strength_factor.is_some()));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_solve_and_cancellation() {
    let problem = BemProblem::new(rock(), FarFieldStress::new(-10.0, -5.0, 0.0)).with_boundary(tunnel(5.0, 16));
    let handle = AsyncBoundaryElementSolver::new(solver(16));

    let cancel = CancellationFlag::new();
    cancel.cancel();
    let cancelled = handle.solve(problem.clone(), Some(cancel)).await;
    assert!(matches!(cancelled, Err(BEMError::Cancelled)));

    let analysis = handle.solve(problem, Some(CancellationFlag::new())).await.unwrap();
    assert_eq!(analysis.elements.len(), 16);
    assert!(handle.last_statistics().unwrap().success);
}
