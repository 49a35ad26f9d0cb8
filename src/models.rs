//! Geometric models fitted by the built-in estimators.

use nalgebra::{Matrix3, Vector2, Vector3};

/// 2D line `a x + b y + c = 0`, normalised so that `a² + b² = 1` when valid.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub params: Vector3<f64>,
}

impl Line {
    /// Build a line and normalise its normal vector. A zero normal is kept
    /// as-is so that validity checks can reject it.
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        let norm = (a * a + b * b).sqrt();
        if norm > 0.0 && norm.is_finite() {
            Self {
                params: Vector3::new(a / norm, b / norm, c / norm),
            }
        } else {
            Self {
                params: Vector3::new(a, b, c),
            }
        }
    }

    /// Line through two points.
    pub fn through(p: (f64, f64), q: (f64, f64)) -> Self {
        let a = p.1 - q.1;
        let b = q.0 - p.0;
        let c = p.0 * q.1 - q.0 * p.1;
        Self::new(a, b, c)
    }

    /// Perpendicular distance of `(x, y)` to the line.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        (self.params[0] * x + self.params[1] * y + self.params[2]).abs()
    }

    /// Slope and intercept of `y = m x + q`, or `None` for vertical lines.
    pub fn slope_intercept(&self) -> Option<(f64, f64)> {
        let b = self.params[1];
        if b.abs() < 1e-12 {
            return None;
        }
        Some((-self.params[0] / b, -self.params[2] / b))
    }
}

/// Planar projective transformation mapping `[x1, y1]` to `[x2, y2]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Map a point through `h`; `None` when it lands at infinity.
    pub fn transfer(&self, p: &Vector2<f64>) -> Option<Vector2<f64>> {
        project(&self.h, p)
    }

    /// Map a point through `h⁻¹`.
    pub fn inverse_transfer(&self, p: &Vector2<f64>) -> Option<Vector2<f64>> {
        let inv = self.h.try_inverse()?;
        project(&inv, p)
    }
}

fn project(m: &Matrix3<f64>, p: &Vector2<f64>) -> Option<Vector2<f64>> {
    let q = m * Vector3::new(p.x, p.y, 1.0);
    if q.z.abs() < 1e-12 {
        return None;
    }
    Some(Vector2::new(q.x / q.z, q.y / q.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_through_points_is_normalised() {
        let line = Line::through((0.0, 1.0), (1.0, 3.0));
        let n = line.params[0].hypot(line.params[1]);
        assert!((n - 1.0).abs() < 1e-12);

        let (m, q) = line.slope_intercept().unwrap();
        assert!((m - 2.0).abs() < 1e-12);
        assert!((q - 1.0).abs() < 1e-12);
        assert!(line.distance(2.0, 5.0) < 1e-12);
    }

    #[test]
    fn coincident_points_give_zero_normal() {
        let line = Line::through((1.0, 1.0), (1.0, 1.0));
        assert_eq!(line.params[0], 0.0);
        assert_eq!(line.params[1], 0.0);
        assert!(line.slope_intercept().is_none());
    }

    #[test]
    fn homography_transfer_round_trip() {
        let h = Homography::new(Matrix3::new(1.0, 0.1, 3.0, -0.2, 1.1, 2.0, 0.001, 0.0, 1.0));
        let p = Vector2::new(4.0, -2.0);
        let q = h.transfer(&p).unwrap();
        let back = h.inverse_transfer(&q).unwrap();
        assert!((back - p).norm() < 1e-9);
    }
}
