//! Line estimator for 2D line fitting.

use nalgebra::Matrix2;

use crate::core::Estimator;
use crate::models::Line;
use crate::types::DataMatrix;

/// Fits lines `a x + b y + c = 0` to rows `[x, y, ...]`.
///
/// Two-point samples are joined exactly; larger samples use a total least
/// squares fit. Coincident sample points produce a zero-normal line that
/// [`Estimator::is_valid`] rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEstimator;

impl LineEstimator {
    pub fn new() -> Self {
        Self
    }

    fn fit_total_least_squares(&self, data: &DataMatrix, sample: &[usize]) -> Line {
        let n = sample.len() as f64;
        let (mut cx, mut cy) = (0.0, 0.0);
        for &idx in sample {
            cx += data[(idx, 0)];
            cy += data[(idx, 1)];
        }
        cx /= n;
        cy /= n;

        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for &idx in sample {
            let dx = data[(idx, 0)] - cx;
            let dy = data[(idx, 1)] - cy;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        // Normal = eigenvector of the smallest eigenvalue of the scatter matrix.
        let eigen = Matrix2::new(sxx, sxy, sxy, syy).symmetric_eigen();
        let smallest = if eigen.eigenvalues[0] <= eigen.eigenvalues[1] {
            0
        } else {
            1
        };
        let normal = eigen.eigenvectors.column(smallest);
        let (a, b) = (normal[0], normal[1]);
        Line::new(a, b, -(a * cx + b * cy))
    }
}

impl Estimator for LineEstimator {
    type Model = Line;

    fn sample_size(&self) -> usize {
        2
    }

    fn fit(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Line> {
        if data.ncols() < 2 || sample.len() < self.sample_size() {
            return Vec::new();
        }
        if sample.iter().any(|&idx| idx >= data.nrows()) {
            return Vec::new();
        }

        if sample.len() == 2 {
            let p = (data[(sample[0], 0)], data[(sample[0], 1)]);
            let q = (data[(sample[1], 0)], data[(sample[1], 1)]);
            return vec![Line::through(p, q)];
        }

        vec![self.fit_total_least_squares(data, sample)]
    }

    fn evaluate(&self, model: &Line, data: &DataMatrix) -> Vec<f64> {
        if data.ncols() < 2 {
            return vec![f64::INFINITY; data.nrows()];
        }
        (0..data.nrows())
            .map(|i| model.distance(data[(i, 0)], data[(i, 1)]))
            .collect()
    }

    fn is_valid(&self, model: &Line) -> bool {
        let norm_sq = model.params[0] * model.params[0] + model.params[1] * model.params[1];
        model.params.iter().all(|v| v.is_finite()) && (norm_sq - 1.0).abs() < 1e-6
    }
}
