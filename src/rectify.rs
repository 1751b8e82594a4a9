//! Bird's-eye rectification of lane masks.
//!
//! The road trapezoid ahead of the vehicle and its rectangular target are
//! given as fractions of the frame size, so one configuration serves any
//! resolution. The transform is built once per camera geometry; degenerate
//! corners are rejected at construction.
use crate::error::{LaneError, Result};
use crate::homography::{PerspectiveTransform, Quad};
use crate::image::Mask;
use log::debug;
use serde::Deserialize;

/// Corner ratios in frame units, ordered top-left, top-right, bottom-right,
/// bottom-left.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RectifyOptions {
    pub src_ratios: Quad,
    pub dst_ratios: Quad,
    /// Bird's-eye output size; `None` keeps the frame size.
    pub output_size: Option<(usize, usize)>,
}

impl Default for RectifyOptions {
    fn default() -> Self {
        Self {
            src_ratios: [[0.45, 0.6], [0.55, 0.6], [0.95, 1.0], [0.05, 1.0]],
            dst_ratios: [[0.2, 0.0], [0.8, 0.0], [0.8, 1.0], [0.2, 1.0]],
            output_size: None,
        }
    }
}

/// Projective warp between the camera frame and the bird's-eye plane.
#[derive(Clone, Debug)]
pub struct Rectifier {
    transform: PerspectiveTransform,
    frame_size: (usize, usize),
    output_size: (usize, usize),
}

impl Rectifier {
    /// Build the rectifier for frames of `frame_width × frame_height`.
    pub fn new(options: &RectifyOptions, frame_width: usize, frame_height: usize) -> Result<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(LaneError::invalid(
                "frame_size",
                format!("frame must be non-empty, got {frame_width}x{frame_height}"),
            ));
        }
        let output_size = options.output_size.unwrap_or((frame_width, frame_height));
        if output_size.0 == 0 || output_size.1 == 0 {
            return Err(LaneError::invalid(
                "rectify.output_size",
                format!("output must be non-empty, got {output_size:?}"),
            ));
        }
        let src = scale_quad(&options.src_ratios, frame_width, frame_height);
        let dst = scale_quad(&options.dst_ratios, output_size.0, output_size.1);
        let transform = PerspectiveTransform::new(&src, &dst)?;
        debug!(
            "Rectifier::new frame={}x{} output={}x{} src={:?} dst={:?}",
            frame_width, frame_height, output_size.0, output_size.1, src, dst
        );
        Ok(Self {
            transform,
            frame_size: (frame_width, frame_height),
            output_size,
        })
    }

    pub fn transform(&self) -> &PerspectiveTransform {
        &self.transform
    }

    pub fn frame_size(&self) -> (usize, usize) {
        self.frame_size
    }

    pub fn output_size(&self) -> (usize, usize) {
        self.output_size
    }

    /// Warp a frame-space mask into bird's-eye space.
    ///
    /// Each output pixel samples the source bilinearly through the inverse
    /// homography; it is on when the interpolated coverage rounds to a
    /// non-zero 8-bit value. Samples outside the source count as off.
    pub fn forward(&self, mask: &Mask) -> Mask {
        let (out_w, out_h) = self.output_size;
        let (src_w, src_h) = (mask.width() as i64, mask.height() as i64);
        let inverse = self.transform.inverse_matrix();
        let mut out = Mask::new(out_w, out_h);
        if src_w == 0 || src_h == 0 {
            return out;
        }

        let on = |x: i64, y: i64| -> f64 {
            if x < 0 || y < 0 || x >= src_w || y >= src_h {
                0.0
            } else if mask.is_on(x as usize, y as usize) {
                1.0
            } else {
                0.0
            }
        };

        for v in 0..out_h {
            for u in 0..out_w {
                let (uf, vf) = (u as f64, v as f64);
                let w = inverse[(2, 0)] * uf + inverse[(2, 1)] * vf + inverse[(2, 2)];
                if w.abs() <= f64::EPSILON {
                    continue;
                }
                let sx = (inverse[(0, 0)] * uf + inverse[(0, 1)] * vf + inverse[(0, 2)]) / w;
                let sy = (inverse[(1, 0)] * uf + inverse[(1, 1)] * vf + inverse[(1, 2)]) / w;
                if !sx.is_finite() || !sy.is_finite() {
                    continue;
                }
                let (x0, y0) = (sx.floor(), sy.floor());
                if x0 < -1.0 || y0 < -1.0 || x0 >= src_w as f64 || y0 >= src_h as f64 {
                    continue;
                }
                let (fx, fy) = (sx - x0, sy - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let coverage = (1.0 - fx) * (1.0 - fy) * on(x0, y0)
                    + fx * (1.0 - fy) * on(x0 + 1, y0)
                    + (1.0 - fx) * fy * on(x0, y0 + 1)
                    + fx * fy * on(x0 + 1, y0 + 1);
                if (coverage * 255.0).round() >= 1.0 {
                    out.set(u, v, true);
                }
            }
        }
        out
    }

    /// Map bird's-eye points back to frame space; points that cannot be
    /// represented (behind the horizon) are dropped.
    pub fn inverse(&self, pts: &[[f64; 2]]) -> Vec<[f64; 2]> {
        pts.iter()
            .filter_map(|&p| self.transform.inverse_point(p))
            .collect()
    }

    /// Map frame-space points into bird's-eye space.
    pub fn forward_points(&self, pts: &[[f64; 2]]) -> Vec<[f64; 2]> {
        pts.iter()
            .filter_map(|&p| self.transform.forward_point(p))
            .collect()
    }
}

fn scale_quad(ratios: &Quad, w: usize, h: usize) -> Quad {
    ratios.map(|[rx, ry]| [rx * w as f64, ry * h as f64])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_options() -> RectifyOptions {
        let unit = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        RectifyOptions {
            src_ratios: unit,
            dst_ratios: unit,
            output_size: None,
        }
    }

    #[test]
    fn identity_geometry_preserves_mask() {
        let rect = Rectifier::new(&identity_options(), 32, 24).unwrap();
        let mask = Mask::from_fn(32, 24, |x, y| x == 7 || y == 12);
        assert_eq!(rect.forward(&mask), mask);
    }

    #[test]
    fn default_geometry_straightens_lane_edges() {
        let (w, h) = (640usize, 360usize);
        let rect = Rectifier::new(&RectifyOptions::default(), w, h).unwrap();
        // Paint the two trapezoid sides, from the horizon row to the bottom.
        let left_edge = |y: f64| 0.45 * w as f64 + (0.05 - 0.45) * w as f64 * (y / h as f64 - 0.6) / 0.4;
        let mask = Mask::from_fn(w, h, |x, y| {
            let yf = y as f64;
            if yf < 0.6 * h as f64 {
                return false;
            }
            let xl = left_edge(yf);
            let xr = w as f64 - xl;
            (x as f64 - xl).abs() <= 1.5 || (x as f64 - xr).abs() <= 1.5
        });
        let warped = rect.forward(&mask);
        // Interior rows of the rectangle are hit near columns 0.2w and 0.8w.
        for v in [60usize, 180, 300] {
            let cols: Vec<usize> = (0..w).filter(|&u| warped.is_on(u, v)).collect();
            assert!(!cols.is_empty(), "row {v} empty");
            for c in cols {
                let near_left = (c as f64 - 0.2 * w as f64).abs() < 20.0;
                let near_right = (c as f64 - 0.8 * w as f64).abs() < 20.0;
                assert!(near_left || near_right, "row {v} col {c}");
            }
        }
    }

    #[test]
    fn inverse_drops_nothing_inside_target() {
        let rect = Rectifier::new(&RectifyOptions::default(), 1280, 720).unwrap();
        let pts = [[256.0, 0.0], [1024.0, 719.0], [640.0, 360.0]];
        let back = rect.inverse(&pts);
        assert_eq!(back.len(), 3);
        let there = rect.forward_points(&back);
        for (a, b) in there.iter().zip(pts.iter()) {
            assert!((a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_ratios_fail_at_construction() {
        let opts = RectifyOptions {
            src_ratios: [[0.1, 0.5], [0.5, 0.5], [0.9, 0.5], [0.1, 1.0]],
            ..Default::default()
        };
        let err = Rectifier::new(&opts, 640, 480).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert!(Rectifier::new(&RectifyOptions::default(), 0, 480).is_err());
    }
}
