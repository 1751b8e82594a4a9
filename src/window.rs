//! Sliding-window search for lane pixels in a bird's-eye mask.
//!
//! Overview
//! - A column histogram over the bottom half of the mask seeds one base
//!   column per half (arg-max, first index on ties).
//! - The mask height is cut into `windows` equal bands, searched from the
//!   bottom up. Each side collects the "on" pixels within `margin` columns of
//!   its current centre and recentres on their mean once more than
//!   `min_pixels` were found; otherwise the centre carries over.
//! - The per-band pixels of each side form its `LanePointSet`.
use crate::error::{LaneError, Result};
use crate::image::{ImageView, Mask};
use crate::types::{LanePointSet, LaneSide};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    /// Number of horizontal bands (>= 1).
    pub windows: usize,
    /// Half-width of a window in columns.
    pub margin: usize,
    /// A window must collect more than this many pixels to recentre.
    pub min_pixels: usize,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            windows: 9,
            margin: 100,
            min_pixels: 50,
        }
    }
}

impl WindowOptions {
    pub fn validate(&self) -> Result<()> {
        if self.windows == 0 {
            return Err(LaneError::invalid("window.windows", "must be positive"));
        }
        if self.margin == 0 {
            return Err(LaneError::invalid("window.margin", "must be positive"));
        }
        Ok(())
    }
}

/// One searched window, for diagnostics and drawing.
#[derive(Clone, Debug, Serialize)]
pub struct WindowTrace {
    pub side: LaneSide,
    pub band: usize,
    /// Column range `[x_low, x_high)`, possibly extending past the mask.
    pub x_low: i64,
    pub x_high: i64,
    /// Row range `[y_low, y_high)`.
    pub y_low: usize,
    pub y_high: usize,
    pub pixels: usize,
    pub recentered: bool,
}

/// Result of one search.
#[derive(Clone, Debug, Default)]
pub struct WindowSearch {
    pub left: LanePointSet,
    pub right: LanePointSet,
    pub base_columns: (usize, usize),
    pub windows: Vec<WindowTrace>,
}

/// Count of "on" pixels per column over rows `h/2 .. h`.
pub fn column_histogram(mask: &Mask) -> Vec<u32> {
    let (w, h) = mask.dimensions();
    let mut hist = vec![0u32; w];
    for y in h / 2..h {
        for (x, &v) in mask.row(y).iter().enumerate() {
            if v != 0 {
                hist[x] += 1;
            }
        }
    }
    hist
}

/// Left and right base columns from a column histogram.
///
/// A half without any positive bin falls back to its own centre column.
pub fn base_columns(hist: &[u32]) -> (usize, usize) {
    let mid = hist.len() / 2;
    let left = argmax_positive(&hist[..mid]).unwrap_or(mid / 2);
    let right = argmax_positive(&hist[mid..])
        .map(|i| i + mid)
        .unwrap_or(mid + (hist.len() - mid) / 2);
    (left, right)
}

fn argmax_positive(bins: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &v) in bins.iter().enumerate() {
        if v > 0 && best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Sliding-window lane pixel detector.
#[derive(Clone, Debug)]
pub struct SlidingWindowDetector {
    options: WindowOptions,
}

impl SlidingWindowDetector {
    pub fn new(options: WindowOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn detect(&self, mask: &Mask) -> WindowSearch {
        let (w, h) = mask.dimensions();
        let hist = column_histogram(mask);
        let bases = base_columns(&hist);
        let mut search = WindowSearch {
            base_columns: bases,
            ..Default::default()
        };
        if w == 0 || h == 0 {
            return search;
        }

        let band_height = h / self.options.windows;
        if band_height == 0 {
            debug!(
                "SlidingWindowDetector::detect band_height=0 height={} windows={}",
                h, self.options.windows
            );
        }
        let margin = self.options.margin as i64;
        let mut centers = [bases.0 as i64, bases.1 as i64];

        for band in 0..self.options.windows {
            // Zero-height bands collect nothing.
            let y_high = h.saturating_sub(band * band_height);
            let y_low = h.saturating_sub((band + 1) * band_height);
            for (slot, side) in LaneSide::BOTH.into_iter().enumerate() {
                let x_low = centers[slot] - margin;
                let x_high = centers[slot] + margin;
                let points = match side {
                    LaneSide::Left => &mut search.left,
                    LaneSide::Right => &mut search.right,
                };
                let (count, sum_x) = collect_window(mask, x_low, x_high, y_low, y_high, points);
                let recentered = count > self.options.min_pixels;
                if recentered {
                    centers[slot] = sum_x / count as i64;
                }
                search.windows.push(WindowTrace {
                    side,
                    band,
                    x_low,
                    x_high,
                    y_low,
                    y_high,
                    pixels: count,
                    recentered,
                });
            }
        }

        debug!(
            "SlidingWindowDetector::detect bases={:?} left={} right={}",
            bases,
            search.left.len(),
            search.right.len()
        );
        search
    }
}

fn collect_window(
    mask: &Mask,
    x_low: i64,
    x_high: i64,
    y_low: usize,
    y_high: usize,
    out: &mut LanePointSet,
) -> (usize, i64) {
    let w = mask.width() as i64;
    let lo = x_low.clamp(0, w) as usize;
    let hi = x_high.clamp(0, w) as usize;
    let mut count = 0usize;
    let mut sum_x = 0i64;
    for y in y_low..y_high {
        let row = mask.row(y);
        for x in lo..hi {
            if row[x] != 0 {
                out.push(x as i32, y as i32);
                count += 1;
                sum_x += x as i64;
            }
        }
    }
    (count, sum_x)
}
