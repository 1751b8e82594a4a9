//! Lane composer: smoothed bird's-eye curves back to frame space.
//!
//! Each boundary is sampled row by row in bird's-eye space and warped back
//! through the inverse perspective transform. A missing side falls back to
//! the bird's-eye image edge so the region between the boundaries can still
//! be drawn; the fallback is a display aid, not a detection.
use crate::error::{LaneError, Result};
use crate::image::Mask;
use crate::rectify::Rectifier;
use crate::types::PolynomialFit;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    pub enabled: bool,
    /// Row step when sampling the boundaries in bird's-eye space.
    pub sample_step: usize,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_step: 1,
        }
    }
}

impl ComposeOptions {
    pub fn validate(&self) -> Result<()> {
        if self.sample_step == 0 {
            return Err(LaneError::invalid("compose.sample_step", "must be at least 1"));
        }
        Ok(())
    }
}

/// Frame-space lane region ready for compositing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LaneOverlay {
    /// Left boundary, top to bottom.
    pub left: Vec<[f64; 2]>,
    /// Right boundary, top to bottom.
    pub right: Vec<[f64; 2]>,
    /// Closed outline: left top to bottom, then right bottom to top.
    pub polygon: Vec<[f64; 2]>,
}

impl LaneOverlay {
    /// Rasterize the closed polygon, boundary pixels included. The outline is
    /// clipped to a one-pixel margin around the image first, so far-off or
    /// non-finite vertices cannot blow up the fill.
    pub fn region_mask(&self, width: usize, height: usize) -> Mask {
        let mut canvas = GrayImage::new(width as u32, height as u32);
        if width > 0 && height > 0 {
            let lo = [-1.0, -1.0];
            let hi = [width as f64, height as f64];
            let clipped = clip_polygon(&self.polygon, lo, hi);
            if let Some(poly) = raster_polygon(&clipped) {
                draw_polygon_mut(&mut canvas, &poly, Luma([255u8]));
            }
        }
        Mask::from_fn(width, height, |x, y| canvas.get_pixel(x as u32, y as u32)[0] != 0)
    }
}

/// Integer outline accepted by `draw_polygon_mut`: consecutive duplicates
/// removed, not closed explicitly, at least three vertices.
fn raster_polygon(points: &[[f64; 2]]) -> Option<Vec<Point<i32>>> {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let q = Point::new(p[0].round() as i32, p[1].round() as i32);
        if poly.last() != Some(&q) {
            poly.push(q);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    (poly.len() >= 3).then_some(poly)
}

/// Sutherland-Hodgman clip of a closed polygon to the box `lo..=hi`.
/// Non-finite vertices are dropped.
fn clip_polygon(points: &[[f64; 2]], lo: [f64; 2], hi: [f64; 2]) -> Vec<[f64; 2]> {
    let mut out: Vec<[f64; 2]> = points
        .iter()
        .copied()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .collect();
    let planes = [(0, lo[0], true), (0, hi[0], false), (1, lo[1], true), (1, hi[1], false)];
    for (axis, bound, keep_above) in planes {
        if out.is_empty() {
            break;
        }
        let input = std::mem::take(&mut out);
        let inside = |p: &[f64; 2]| {
            if keep_above {
                p[axis] >= bound
            } else {
                p[axis] <= bound
            }
        };
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            if inside(&cur) != inside(&prev) {
                let t = (bound - prev[axis]) / (cur[axis] - prev[axis]);
                let mut cut = [
                    prev[0] + t * (cur[0] - prev[0]),
                    prev[1] + t * (cur[1] - prev[1]),
                ];
                cut[axis] = bound;
                out.push(cut);
            }
            if inside(&cur) {
                out.push(cur);
            }
            prev = cur;
        }
    }
    out
}

/// Liang-Barsky clip of the segment `p0 -> p1` to the box `lo..=hi`.
/// Returns `None` when nothing of it is inside or an endpoint is not finite.
pub(crate) fn clip_segment(
    p0: [f64; 2],
    p1: [f64; 2],
    lo: [f64; 2],
    hi: [f64; 2],
) -> Option<([f64; 2], [f64; 2])> {
    if !(p0.iter().chain(p1.iter()).all(|v| v.is_finite())) {
        return None;
    }
    let d = [p1[0] - p0[0], p1[1] - p0[1]];
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for axis in 0..2 {
        for (p, q) in [(-d[axis], p0[axis] - lo[axis]), (d[axis], hi[axis] - p0[axis])] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    let at = |t: f64| [p0[0] + t * d[0], p0[1] + t * d[1]];
    Some((at(t0), at(t1)))
}

/// Sample both boundaries in bird's-eye space and map them to frame space.
pub fn compose_overlay(
    left: Option<&PolynomialFit>,
    right: Option<&PolynomialFit>,
    rectifier: &Rectifier,
    options: &ComposeOptions,
) -> LaneOverlay {
    let (bw, bh) = rectifier.output_size();
    let ys = sample_rows(bh, options.sample_step.max(1));
    let edge = |fit: Option<&PolynomialFit>, fallback: f64| -> Vec<[f64; 2]> {
        let xs = fit.map_or_else(|| vec![fallback; ys.len()], |f| f.sample(&ys));
        let pts: Vec<[f64; 2]> = xs.into_iter().zip(ys.iter()).map(|(x, &y)| [x, y]).collect();
        rectifier.inverse(&pts)
    };
    let left = edge(left, 0.0);
    let right = edge(right, bw.saturating_sub(1) as f64);
    let polygon = left.iter().chain(right.iter().rev()).copied().collect();
    LaneOverlay {
        left,
        right,
        polygon,
    }
}

fn sample_rows(height: usize, step: usize) -> Vec<f64> {
    if height == 0 {
        return Vec::new();
    }
    let mut ys: Vec<f64> = (0..height).step_by(step).map(|y| y as f64).collect();
    let last = (height - 1) as f64;
    if ys.last() != Some(&last) {
        ys.push(last);
    }
    ys
}
