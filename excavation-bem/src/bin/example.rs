//! Excavation BEM Example - Circular tunnel below a free surface

use anyhow::{Context, Result};
use log::info;

use excavation_bem::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Excavation BEM Example: Circular Tunnel ===\n");

    // 5 m radius tunnel, axis 10 m below the ground surface
    //
    //   ----------------------- y = 10 (ground)
    //
    //            .---.
    //           /     \
    //          |   +   |        r = 5
    //           \     /
    //            '---'
    //
    let radius = 5.0;
    let ground = 10.0;
    let tunnel = Boundary::circle(0, BoundaryKind::Excavation, Point2::new(0.0, 0.0), radius, 32);

    let problem = BemProblem::new(Material::new(10_000.0, 0.25), FarFieldStress::new(-10.0, -5.0, 0.0))
        .with_boundary(tunnel)
        .with_ground_surface(ground)
        .with_output_grid(OutputGrid::new(Bounds::new(-20.0, -20.0, 20.0, ground), 41, 31));

    let mut solver = BoundaryElementSolver::new(SolverOptions::default().with_element_count(32), BemConfig::default())
        .context("invalid solver settings")?;
    if !solver.can_solve(&problem) {
        solver.check(&problem).context("problem rejected")?;
    }

    let analysis = solver.solve(&problem).context("analysis failed")?;
    let stats = solver.last_statistics();

    println!("Elements: {}", stats.element_count);
    println!("Degrees of freedom: {}", stats.dofs);
    println!("Field points: {}", stats.field_point_count);
    println!("Half-space correction: {}", stats.half_space_used);
    println!("Total time: {:.1} ms\n", stats.timings.total_ms);

    println!("--- Boundary stresses (0.05 r into the rock) ---");
    for (label, angle) in [("Sidewall", 0.0_f64), ("Crown", 90.0), ("Invert", 270.0)] {
        let theta = angle.to_radians();
        let p = Point2::new(1.05 * radius * theta.cos(), 1.05 * radius * theta.sin());
        let fp = analysis.evaluate(p);
        println!(
            "{:>9}: sigma1 = {:8.3} MPa, sigma3 = {:8.3} MPa, angle = {:6.1} deg, |u| = {:.3e} m",
            label,
            fp.sigma1,
            fp.sigma3,
            fp.angle,
            fp.displacement_magnitude()
        );
    }

    if let Some(peak) = analysis.stress_field.min_sigma1() {
        println!("\nMost compressive sigma1 on the output grid: {:.3} MPa", peak);
    }

    let json = analysis.stress_field.to_json()?;
    let path = std::env::temp_dir().join("excavation_bem_stress_field.json");
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("stress field written to {}", path.display());

    println!("\n=== Example complete ===");
    Ok(())
}
