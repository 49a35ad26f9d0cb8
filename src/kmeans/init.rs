//! Center seeding.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::{squared_distance, Rows};

/// `k` distinct rows chosen uniformly.
pub(crate) fn random_centers<R: Rng + ?Sized>(rows: &Rows, k: usize, rng: &mut R) -> Vec<f32> {
    let mut centers = Vec::with_capacity(k * rows.dims);
    for idx in rand::seq::index::sample(rng, rows.len(), k) {
        centers.extend_from_slice(rows.row(idx));
    }
    centers
}

/// k-means++ seeding: each new center is drawn with probability proportional
/// to the squared distance from its nearest already chosen center.
pub(crate) fn plus_plus_centers<R: Rng + ?Sized>(rows: &Rows, k: usize, rng: &mut R) -> Vec<f32> {
    let n = rows.len();
    let mut centers = Vec::with_capacity(k * rows.dims);

    let first = rng.gen_range(0..n);
    centers.extend_from_slice(rows.row(first));
    let mut nearest: Vec<f64> = (0..n)
        .map(|i| squared_distance(rows.row(i), rows.row(first)))
        .collect();

    for _ in 1..k {
        let next = pick_weighted(&nearest, rng).unwrap_or_else(|| rng.gen_range(0..n));
        let chosen = rows.row(next);
        centers.extend_from_slice(chosen);
        for (i, d) in nearest.iter_mut().enumerate() {
            let candidate = squared_distance(rows.row(i), chosen);
            if candidate < *d {
                *d = candidate;
            }
        }
    }

    centers
}

/// Weighted draw, or `None` when the weights do not form a distribution.
fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let dist = WeightedIndex::new(weights).ok()?;
    Some(dist.sample(rng))
}
