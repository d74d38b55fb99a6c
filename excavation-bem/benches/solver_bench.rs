//! Benchmarks for the BEM solver

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use excavation_bem::analysis::PlaneAnalysis;
use excavation_bem::assembly::InfluenceMatrixBuilder;
use excavation_bem::discretize::discretize;
use excavation_bem::integrator::{ElementIntegrator, IntegratorConfig};
use excavation_bem::prelude::*;

fn tunnel_problem(segments: usize) -> BemProblem {
    BemProblem::new(Material::new(10_000.0, 0.25), FarFieldStress::new(-10.0, -5.0, 0.0))
        .with_boundary(Boundary::circle(0, BoundaryKind::Excavation, Point2::new(0.0, 0.0), 5.0, segments))
        .with_ground_surface(10.0)
}

fn benchmark_matrix_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_assembly");
    let integrator = ElementIntegrator::new(&Material::new(10_000.0, 0.25), PlaneAnalysis::PlaneStrain, IntegratorConfig::default());

    for &n in &[32usize, 64, 128] {
        let problem = tunnel_problem(n);
        let elements = discretize(&problem.boundaries, n, &BemConfig::default()).unwrap();

        group.bench_with_input(BenchmarkId::new("full_space", n), &elements, |b, elements| {
            let mut builder = InfluenceMatrixBuilder::new(false);
            b.iter(|| builder.build_matrix(&integrator, black_box(elements), 0.0, false).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("half_space", n), &elements, |b, elements| {
            let mut builder = InfluenceMatrixBuilder::new(false);
            b.iter(|| builder.build_matrix(&integrator, black_box(elements), 10.0, true).unwrap())
        });
    }
    group.finish();
}

fn benchmark_full_solve(c: &mut Criterion) {
    let problem = tunnel_problem(32);
    let options = SolverOptions::default().with_element_count(32);

    c.bench_function("solve_uncached_32", |b| {
        let mut solver = BoundaryElementSolver::new(options.clone(), BemConfig::default().with_caching(false)).unwrap();
        b.iter(|| solver.solve(black_box(&problem)).unwrap())
    });

    c.bench_function("solve_cached_32", |b| {
        let mut solver = BoundaryElementSolver::new(options.clone(), BemConfig::default()).unwrap();
        solver.solve(&problem).unwrap();
        b.iter(|| solver.solve(black_box(&problem)).unwrap())
    });
}

criterion_group!(benches, benchmark_matrix_assembly, benchmark_full_solve);
criterion_main!(benches);
