//! Example: Homography estimation from point correspondences
//!
//! Maps a synthetic image plane through a known homography, corrupts a
//! quarter of the matches and recovers the transformation with MSAC.

use consensus::models::Homography;
use consensus::{estimate_homography, MsacSettings};
use nalgebra::{DMatrix, Matrix3, Vector2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Homography Estimation Example ===\n");

    let n_points = 90;
    let n_outliers = 30;
    let n_total = n_points + n_outliers;

    // Rotation, scale, translation and a mild perspective tilt
    let angle: f64 = 0.1;
    let truth = Homography::new(Matrix3::new(
        1.05 * angle.cos(),
        -1.05 * angle.sin(),
        12.0,
        1.05 * angle.sin(),
        1.05 * angle.cos(),
        -6.0,
        5e-5,
        1e-4,
        1.0,
    ));

    let mut rng = rand::thread_rng();
    let noise = Normal::new(0.0, 0.3)?;
    let mut points1 = DMatrix::<f64>::zeros(n_total, 2);
    let mut points2 = DMatrix::<f64>::zeros(n_total, 2);

    for i in 0..n_total {
        let p = Vector2::new(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
        points1[(i, 0)] = p.x;
        points1[(i, 1)] = p.y;

        let q = match truth.transfer(&p) {
            Some(q) if i < n_points => {
                Vector2::new(q.x + noise.sample(&mut rng), q.y + noise.sample(&mut rng))
            }
            _ => Vector2::new(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0)),
        };
        points2[(i, 0)] = q.x;
        points2[(i, 1)] = q.y;
    }

    let settings = MsacSettings::new(2.0, 0.99, 2000).with_recompute_from_inliers(true);
    let fit = estimate_homography(&points1, &points2, &settings)?;

    println!("MSAC Results:");
    println!("  Found: {}", fit.found);
    println!("  Inliers: {} of {}", fit.inlier_count(), n_total);
    println!("  Trials: {}", fit.trials);
    if fit.reached_max_trials {
        println!("  Warning: trial budget exhausted");
    }

    if let Some(model) = &fit.model {
        let h = model.h / model.h[(2, 2)];
        println!("\nEstimated homography:");
        for r in 0..3 {
            println!("  [{:10.5} {:10.5} {:10.5}]", h[(r, 0)], h[(r, 1)], h[(r, 2)]);
        }

        let probe = Vector2::new(400.0, 300.0);
        if let (Some(a), Some(b)) = (truth.transfer(&probe), model.transfer(&probe)) {
            println!("\nTransfer error at image center: {:.4} px", (a - b).norm());
        }
    }

    let false_inliers = fit.inlier_indices().iter().filter(|&&i| i >= n_points).count();
    println!("Outliers accepted as inliers: {}", false_inliers);

    Ok(())
}
