//! Example: Building a visual vocabulary with approximate K-Means
//!
//! Clusters synthetic 64-dimensional descriptors into visual words through
//! an HNSW index, then compares against the exact brute-force index.
//! Run with `RUST_LOG=info` to follow per-iteration progress.

use std::time::Instant;

use consensus::kmeans::{BruteForceIndex, UsearchIndex};
use consensus::{cluster_with, KMeansSettings};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Visual Vocabulary Example ===\n");

    let dims = 64;
    let words = 32;
    let per_word = 150;
    let n = words * per_word;

    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0f32, 0.05)?;
    let prototypes: Vec<Vec<f32>> = (0..words)
        .map(|_| (0..dims).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect();

    let mut features = DMatrix::<f32>::zeros(n, dims);
    for (w, prototype) in prototypes.iter().enumerate() {
        for j in 0..per_word {
            let row = w * per_word + j;
            for (d, &value) in prototype.iter().enumerate() {
                features[(row, d)] = value + noise.sample(&mut rng);
            }
        }
    }
    println!("{} descriptors of dimension {}, {} words\n", n, dims, words);

    let mut settings = KMeansSettings::default().with_seed(7);
    settings.num_trials = 2;
    settings.verbose = true;

    let start = Instant::now();
    let mut hnsw = UsearchIndex::new().with_connectivity(16).with_expansion_search(64);
    let approx = cluster_with(&features, words, &settings, &mut hnsw, &mut StdRng::seed_from_u64(7))?;
    let approx_time = start.elapsed();

    let start = Instant::now();
    let exact = cluster_with(
        &features,
        words,
        &settings,
        &mut BruteForceIndex::new(),
        &mut StdRng::seed_from_u64(7),
    )?;
    let exact_time = start.elapsed();

    for (name, result, elapsed) in [("usearch", &approx, approx_time), ("brute force", &exact, exact_time)] {
        let sizes = result.cluster_sizes();
        println!("{name}:");
        println!("  Compactness: {:.4}", result.compactness);
        println!("  Iterations: {} (converged: {})", result.iterations, result.converged);
        println!(
            "  Word sizes: min {} / max {}",
            sizes.iter().min().copied().unwrap_or(0),
            sizes.iter().max().copied().unwrap_or(0)
        );
        println!("  Time: {:.2?}\n", elapsed);
    }

    Ok(())
}
