//! Least-squares polynomial fitting of `x = f(y)`.
//!
//! The Vandermonde columns are scaled to unit norm before an SVD solve and
//! the coefficients rescaled afterwards, which keeps cubic fits over pixel
//! rows (y³ ~ 1e8) well conditioned. Rank-deficient inputs (fewer distinct
//! rows than coefficients) get the minimum-norm solution.
use nalgebra::{DMatrix, DVector};

const SVD_EPS: f64 = 1e-12;

/// Fit `degree + 1` coefficients, highest degree first. Returns `None` when
/// the inputs are empty, mismatched or the solve is not finite.
pub fn polyfit(ys: &[f64], xs: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = ys.len();
    if n == 0 || n != xs.len() {
        return None;
    }
    let cols = degree + 1;
    let mut a = DMatrix::from_fn(n, cols, |i, j| ys[i].powi((degree - j) as i32));
    let mut scale = vec![1.0; cols];
    for (j, s) in scale.iter_mut().enumerate() {
        let norm = a.column(j).norm();
        if norm > 0.0 && norm.is_finite() {
            *s = norm;
            a.column_mut(j).unscale_mut(norm);
        }
    }
    let b = DVector::from_column_slice(xs);
    let solution = a.svd(true, true).solve(&b, SVD_EPS).ok()?;
    let coeffs: Vec<f64> = solution
        .iter()
        .zip(&scale)
        .map(|(c, s)| c / s)
        .collect();
    coeffs.iter().all(|c| c.is_finite()).then_some(coeffs)
}

/// Evaluate coefficients (highest degree first) at `y`.
#[inline]
pub fn polyval(coeffs: &[f64], y: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * y + c)
}
