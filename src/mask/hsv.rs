//! 8-bit HSV conversion in the common "half-degree hue" convention.
//!
//! H ∈ [0, 180), S ∈ [0, 255], V ∈ [0, 255], matching the ranges that the
//! usual lane-paint thresholds are quoted in.
use serde::{Deserialize, Serialize};

/// Convert an `[r, g, b]` pixel to `[h, s, v]`.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let mut h = if diff <= 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = (h * 0.5).round();
    // 359.x degrees rounds up to 180, which wraps to red.
    let h = if h >= 180.0 { 0.0 } else { h };
    [h as u8, s.round().min(255.0) as u8, v as u8]
}

/// Inclusive box in HSV space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Near-white paint: any hue, low saturation, bright.
    pub const WHITE: HsvRange = HsvRange::new([0, 0, 200], [180, 30, 255]);
    /// Yellow paint band.
    pub const YELLOW: HsvRange = HsvRange::new([15, 100, 100], [35, 255, 255]);

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    pub(crate) fn is_ordered(&self) -> bool {
        (0..3).all(|c| self.lower[c] <= self.upper[c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_colours() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
    }

    #[test]
    fn lane_paint_bands() {
        // Road-marking yellow and white, plus dark asphalt.
        let yellow = rgb_to_hsv([230, 200, 40]);
        let white = rgb_to_hsv([235, 235, 230]);
        let asphalt = rgb_to_hsv([70, 70, 75]);
        assert!(HsvRange::YELLOW.contains(yellow), "yellow hsv={yellow:?}");
        assert!(HsvRange::WHITE.contains(white), "white hsv={white:?}");
        assert!(!HsvRange::WHITE.contains(asphalt));
        assert!(!HsvRange::YELLOW.contains(asphalt));
    }
}
