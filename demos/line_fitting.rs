//! Example: Robust line fitting with MSAC
//!
//! Fits `y = 2x + 1` to noisy points mixed with uniform outliers.
//! Run with `RUST_LOG=debug` to see the engine's run summary.

use consensus::{estimate_line, MsacSettings};
use nalgebra::DMatrix;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Robust Line Fitting Example ===\n");

    let n_inliers = 700;
    let n_outliers = 300;
    let n_total = n_inliers + n_outliers;
    let true_slope = 2.0;
    let true_intercept = 1.0;

    println!("True line: y = {:.2}x + {:.2}", true_slope, true_intercept);
    println!(
        "Generating {} inliers and {} outliers\n",
        n_inliers, n_outliers
    );

    let mut rng = rand::thread_rng();
    let noise = Normal::new(0.0, 0.01)?;

    // (x, y, is_inlier)
    let mut points = Vec::with_capacity(n_total);
    for _ in 0..n_inliers {
        let x: f64 = rng.gen_range(0.0..10.0);
        points.push((x, true_slope * x + true_intercept + noise.sample(&mut rng), true));
    }
    for _ in 0..n_outliers {
        points.push((rng.gen_range(0.0..10.0), rng.gen_range(-10.0..30.0), false));
    }
    points.shuffle(&mut rng);

    let mut points_matrix = DMatrix::<f64>::zeros(n_total, 2);
    for (i, &(x, y, _)) in points.iter().enumerate() {
        points_matrix[(i, 0)] = x;
        points_matrix[(i, 1)] = y;
    }

    let settings = MsacSettings::new(0.1, 0.99, 1000).with_recompute_from_inliers(true);
    let fit = estimate_line(&points_matrix, &settings)?;

    println!("MSAC Results:");
    println!("  Found: {}", fit.found);
    println!(
        "  Inliers: {} of {} ({:.2}%)",
        fit.inlier_count(),
        n_total,
        100.0 * fit.inlier_count() as f64 / n_total as f64
    );
    println!("  Trials: {} (skipped {})", fit.trials, fit.skipped_trials);
    println!("  Accumulated distance: {:.4}", fit.best_distance);

    let Some(line) = fit.model.as_ref() else {
        println!("\nNo line found");
        return Ok(());
    };
    println!(
        "\nEstimated line: {:.4}x + {:.4}y + {:.4} = 0",
        line.params[0], line.params[1], line.params[2]
    );
    if let Some((slope, intercept)) = line.slope_intercept() {
        println!("  In slope-intercept form: y = {:.4}x + {:.4}", slope, intercept);
        println!("  Error in slope: {:.4}", (slope - true_slope).abs());
        println!("  Error in intercept: {:.4}", (intercept - true_intercept).abs());
    }

    let agreement = points
        .iter()
        .zip(&fit.inliers)
        .filter(|&(point, &flag)| point.2 == flag)
        .count();
    println!(
        "\nInlier mask agrees with ground truth on {} of {} points",
        agreement, n_total
    );

    Ok(())
}
