//! Four-point projective transforms.
//!
//! `homography_from_quad` solves the 8×8 direct linear system for `H` with
//! `h33 = 1`, refusing quadrilaterals in which any three corners are
//! collinear. Geometry is kept in `f64`: pixel coordinates enter the system
//! squared, which is beyond what `f32` resolves at HD resolutions.
use crate::error::{LaneError, Result};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

const EPS: f64 = 1e-12;
/// Collinearity tolerance, relative to the squared extent of the quad.
const COLLINEAR_TOL: f64 = 1e-9;

/// Index triples covering every choice of three corners out of four.
const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

pub type Quad = [[f64; 2]; 4];

/// Returns the first triple of collinear corners, if any.
pub fn find_collinear_corners(quad: &Quad) -> Option<[usize; 3]> {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in quad {
        if !p[0].is_finite() || !p[1].is_finite() {
            return Some([0, 1, 2]);
        }
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }
    let extent = (max_x - min_x).max(max_y - min_y);
    let tol = COLLINEAR_TOL * extent * extent;
    TRIPLES.into_iter().find(|&[a, b, c]| {
        let (pa, pb, pc) = (quad[a], quad[b], quad[c]);
        let cross = (pb[0] - pa[0]) * (pc[1] - pa[1]) - (pb[1] - pa[1]) * (pc[0] - pa[0]);
        cross.abs() <= tol
    })
}

/// Solve for the homography mapping each `src[i]` onto `dst[i]`.
pub fn homography_from_quad(src: &Quad, dst: &Quad) -> Result<Matrix3<f64>> {
    if let Some(corners) = find_collinear_corners(src) {
        return Err(LaneError::DegenerateQuad {
            which: "source",
            corners,
        });
    }
    if let Some(corners) = find_collinear_corners(dst) {
        return Err(LaneError::DegenerateQuad {
            which: "destination",
            corners,
        });
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];
        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -u * x;
        a[(r, 7)] = -u * y;
        b[r] = u;
        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -v * x;
        a[(r + 1, 7)] = -v * y;
        b[r + 1] = v;
    }

    let h = a.lu().solve(&b).ok_or(LaneError::SingularHomography)?;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(LaneError::SingularHomography);
    }
    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    ))
}

/// Map a single point; `None` if it lands on the line at infinity.
#[inline]
pub fn apply_homography(h: &Matrix3<f64>, p: [f64; 2]) -> Option<[f64; 2]> {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
        return None;
    }
    Some([v[0] / w, v[1] / w])
}

/// Map a batch of points; `None` if any of them is not representable.
pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    pts.iter().map(|&p| apply_homography(h, p)).collect()
}

/// Forward and inverse homographies of a fixed camera geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveTransform {
    forward: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl PerspectiveTransform {
    /// Build both directions from corresponding corners. Fails fast on
    /// degenerate corners instead of producing an ill-conditioned matrix.
    pub fn new(src: &Quad, dst: &Quad) -> Result<Self> {
        let forward = homography_from_quad(src, dst)?;
        let inverse = homography_from_quad(dst, src)?;
        Ok(Self { forward, inverse })
    }

    pub fn inverse_matrix(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    pub fn forward_point(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        apply_homography(&self.forward, p)
    }

    pub fn inverse_point(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        apply_homography(&self.inverse, p)
    }
}
