//! Miscellaneous utilities shared by the engines.
//!
//! Randomness always flows through an explicitly constructed generator;
//! nothing in the crate touches a process-wide RNG.

use rand::distributions::uniform::SampleUniform;
use rand::distributions::Uniform;
use rand::prelude::*;
use std::marker::PhantomData;

/// Build a `StdRng` from an optional seed, falling back to OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Uniform integer generator over an inclusive range.
///
/// Production code builds it from entropy; tests fix the seed.
pub struct UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    rng: StdRng,
    _value: PhantomData<T>,
}

impl<T> Default for UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            _value: PhantomData,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            _value: PhantomData,
        }
    }

    /// Fill `out` with distinct values from `[min, max]`.
    ///
    /// Rejection sampling; `out.len()` must not exceed the range size.
    pub fn gen_unique(&mut self, out: &mut [T], min: T, max: T)
    where
        T: Eq,
    {
        let dist = Uniform::new_inclusive(min, max);
        for i in 0..out.len() {
            loop {
                let candidate = self.rng.sample(&dist);
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
    }
}

/// Gaussian elimination with partial pivoting on an augmented `[A | b]` system.
///
/// Returns `false` for a (near) singular `A` or mismatched shapes.
pub fn gauss_elimination(
    augmented: &mut nalgebra::DMatrix<f64>,
    result: &mut nalgebra::DVector<f64>,
) -> bool {
    let n = augmented.nrows();
    if augmented.ncols() != n + 1 || n != result.len() {
        return false;
    }

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = augmented[(i, i)].abs();
        for k in (i + 1)..n {
            let val = augmented[(k, i)].abs();
            if val > max_val {
                max_val = val;
                max_row = k;
            }
        }
        if max_row != i {
            augmented.swap_rows(i, max_row);
        }

        if augmented[(i, i)].abs() < 1e-10 {
            return false;
        }

        for k in (i + 1)..n {
            let factor = augmented[(k, i)] / augmented[(i, i)];
            for j in i..=n {
                augmented[(k, j)] -= factor * augmented[(i, j)];
            }
        }
    }

    for i in (0..n).rev() {
        let mut value = augmented[(i, n)];
        for j in (i + 1)..n {
            value -= augmented[(i, j)] * result[j];
        }
        result[i] = value / augmented[(i, i)];
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn unique_samples_within_bounds() {
        let mut rng = UniformRandomGenerator::<usize>::from_seed(1234);
        let mut buf = [0usize; 5];
        rng.gen_unique(&mut buf, 0, 10);

        assert!(buf.iter().all(|&v| v <= 10));
        for i in 0..buf.len() {
            for j in (i + 1)..buf.len() {
                assert_ne!(buf[i], buf[j]);
            }
        }
    }

    #[test]
    fn full_range_sample_is_a_permutation() {
        let mut rng = UniformRandomGenerator::<usize>::from_seed(7);
        let mut buf = [0usize; 4];
        rng.gen_unique(&mut buf, 0, 3);
        let mut sorted = buf;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3]);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let mut rng1 = UniformRandomGenerator::<u32>::from_seed(42);
        let mut rng2 = UniformRandomGenerator::<u32>::from_seed(42);
        let mut a = [0u32; 6];
        let mut b = [0u32; 6];
        for _ in 0..10 {
            rng1.gen_unique(&mut a, 0, 100);
            rng2.gen_unique(&mut b, 0, 100);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn gauss_elimination_solves_small_system() {
        // 2x + y = 5, x - y = 1  =>  x = 2, y = 1
        let mut augmented = DMatrix::from_row_slice(2, 3, &[2.0, 1.0, 5.0, 1.0, -1.0, 1.0]);
        let mut x = DVector::zeros(2);
        assert!(gauss_elimination(&mut augmented, &mut x));
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gauss_elimination_rejects_singular_system() {
        let mut augmented = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);
        let mut x = DVector::zeros(2);
        assert!(!gauss_elimination(&mut augmented, &mut x));
    }
}
