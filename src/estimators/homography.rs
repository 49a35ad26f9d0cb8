//! Homography estimator using a 4-point DLT with `h33 = 1`.

use nalgebra::{DMatrix, DVector, Matrix3, Vector2};

use crate::core::Estimator;
use crate::models::Homography;
use crate::types::DataMatrix;
use crate::utils::gauss_elimination;

/// Fits homographies to correspondences stored as rows `[x1, y1, x2, y2]`.
///
/// Minimal samples are solved by Gaussian elimination, larger ones by
/// SVD least squares. The residual is the symmetric transfer
/// distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyEstimator;

impl HomographyEstimator {
    pub fn new() -> Self {
        Self
    }

    fn fill_rows(
        coefficients: &mut DMatrix<f64>,
        rhs: &mut DVector<f64>,
        row: usize,
        (x1, y1, x2, y2): (f64, f64, f64, f64),
    ) {
        coefficients[(row, 0)] = -x1;
        coefficients[(row, 1)] = -y1;
        coefficients[(row, 2)] = -1.0;
        coefficients[(row, 6)] = x2 * x1;
        coefficients[(row, 7)] = x2 * y1;
        rhs[row] = -x2;

        coefficients[(row + 1, 3)] = -x1;
        coefficients[(row + 1, 4)] = -y1;
        coefficients[(row + 1, 5)] = -1.0;
        coefficients[(row + 1, 6)] = y2 * x1;
        coefficients[(row + 1, 7)] = y2 * y1;
        rhs[row + 1] = -y2;
    }

    fn correspondence(data: &DataMatrix, idx: usize) -> (f64, f64, f64, f64) {
        (
            data[(idx, 0)],
            data[(idx, 1)],
            data[(idx, 2)],
            data[(idx, 3)],
        )
    }

    fn to_model(h: &DVector<f64>) -> Option<Homography> {
        if h.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Homography::new(Matrix3::new(
            h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
        )))
    }

    fn fit_minimal(&self, data: &DataMatrix, sample: &[usize]) -> Option<Homography> {
        let mut coefficients = DMatrix::<f64>::zeros(8, 8);
        let mut rhs = DVector::<f64>::zeros(8);
        for (i, &idx) in sample.iter().enumerate() {
            Self::fill_rows(
                &mut coefficients,
                &mut rhs,
                2 * i,
                Self::correspondence(data, idx),
            );
        }

        let mut augmented = coefficients.insert_column(8, 0.0);
        augmented.set_column(8, &rhs);
        let mut h = DVector::<f64>::zeros(8);
        if !gauss_elimination(&mut augmented, &mut h) {
            return None;
        }
        Self::to_model(&h)
    }

    fn fit_least_squares(&self, data: &DataMatrix, sample: &[usize]) -> Option<Homography> {
        let rows = 2 * sample.len();
        let mut coefficients = DMatrix::<f64>::zeros(rows, 8);
        let mut rhs = DVector::<f64>::zeros(rows);
        for (i, &idx) in sample.iter().enumerate() {
            Self::fill_rows(
                &mut coefficients,
                &mut rhs,
                2 * i,
                Self::correspondence(data, idx),
            );
        }

        let h = coefficients.svd(true, true).solve(&rhs, 1e-12).ok()?;
        Self::to_model(&h)
    }
}

impl Estimator for HomographyEstimator {
    type Model = Homography;

    fn sample_size(&self) -> usize {
        4
    }

    fn fit(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Homography> {
        if data.ncols() < 4 || sample.len() < self.sample_size() {
            return Vec::new();
        }
        if sample.iter().any(|&idx| idx >= data.nrows()) {
            return Vec::new();
        }

        let model = if sample.len() == self.sample_size() {
            self.fit_minimal(data, sample)
        } else {
            self.fit_least_squares(data, sample)
        };
        model.into_iter().collect()
    }

    fn evaluate(&self, model: &Homography, data: &DataMatrix) -> Vec<f64> {
        let n = data.nrows();
        if data.ncols() < 4 {
            return vec![f64::INFINITY; n];
        }
        let Some(inverse) = model.h.try_inverse().map(Homography::new) else {
            return vec![f64::INFINITY; n];
        };

        (0..n)
            .map(|i| {
                let p1 = Vector2::new(data[(i, 0)], data[(i, 1)]);
                let p2 = Vector2::new(data[(i, 2)], data[(i, 3)]);
                match (model.transfer(&p1), inverse.transfer(&p2)) {
                    (Some(fwd), Some(bwd)) => ((p2 - fwd).norm() + (p1 - bwd).norm()) / 2.0,
                    _ => f64::INFINITY,
                }
            })
            .collect()
    }

    fn is_valid(&self, model: &Homography) -> bool {
        if model.h.iter().any(|v| !v.is_finite()) {
            return false;
        }
        let det = model.h.determinant().abs();
        det > 1e-4 && det < 1e4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correspondences(h: &Matrix3<f64>, points: &[(f64, f64)]) -> DataMatrix {
        let model = Homography::new(*h);
        let mut data = DataMatrix::zeros(points.len(), 4);
        for (i, &(x, y)) in points.iter().enumerate() {
            let q = model.transfer(&Vector2::new(x, y)).unwrap();
            data[(i, 0)] = x;
            data[(i, 1)] = y;
            data[(i, 2)] = q.x;
            data[(i, 3)] = q.y;
        }
        data
    }

    #[test]
    fn minimal_fit_recovers_translation() {
        let h = Matrix3::new(1.0, 0.0, 1.0, 0.0, 1.0, 2.0, 0.0, 0.0, 1.0);
        let data = correspondences(&h, &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);

        let estimator = HomographyEstimator::new();
        let models = estimator.fit(&data, &[0, 1, 2, 3]);
        assert_eq!(models.len(), 1);
        assert!(estimator.is_valid(&models[0]));
        assert!((models[0].h - h).norm() < 1e-9);
        assert!(estimator
            .evaluate(&models[0], &data)
            .iter()
            .all(|&r| r < 1e-9));
    }

    #[test]
    fn least_squares_fit_recovers_projective_map() {
        let h = Matrix3::new(1.1, 0.05, 3.0, -0.1, 0.95, -2.0, 0.001, 0.002, 1.0);
        let points: Vec<(f64, f64)> = (0..12)
            .map(|i| ((i % 4) as f64 * 10.0, (i / 4) as f64 * 7.0 + 1.0))
            .collect();
        let data = correspondences(&h, &points);
        let sample: Vec<usize> = (0..points.len()).collect();

        let estimator = HomographyEstimator::new();
        let models = estimator.fit(&data, &sample);
        assert_eq!(models.len(), 1);
        assert!((models[0].h - h).norm() < 1e-6);
    }

    #[test]
    fn collinear_sample_yields_no_model() {
        let h = Matrix3::identity();
        let data = correspondences(&h, &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let estimator = HomographyEstimator::new();
        let models = estimator.fit(&data, &[0, 1, 2, 3]);
        assert!(models.iter().all(|m| !estimator.is_valid(m)));
    }
}
