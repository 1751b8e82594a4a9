//! Lane-candidate masking.
//!
//! A pixel is a candidate when its colour falls in one of the configured HSV
//! bands (white and yellow paint by default) OR when its Sobel gradient
//! magnitude, rescaled to 0..255 by the frame maximum, reaches
//! `gradient_threshold`. The extractor is a pure function of the frame.

pub mod hsv;

pub use hsv::{rgb_to_hsv, HsvRange};

use crate::edges::{luma_from_color, sobel_gradients};
use crate::error::{LaneError, Result};
use crate::image::{ChannelOrder, ColorView, ImageView, Mask};
use log::debug;
use serde::Deserialize;

/// Thresholds for the colour and gradient tests.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// Channel order of incoming frames.
    pub channel_order: ChannelOrder,
    /// Colour bands; a pixel inside any band is a candidate.
    pub color_ranges: Vec<HsvRange>,
    /// Scaled gradient magnitude (0..255) at or above which a pixel is a
    /// candidate.
    pub gradient_threshold: u8,
    pub color_enabled: bool,
    pub gradient_enabled: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::Rgb,
            color_ranges: vec![HsvRange::WHITE, HsvRange::YELLOW],
            gradient_threshold: 30,
            color_enabled: true,
            gradient_enabled: true,
        }
    }
}

impl MaskOptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(range) = self.color_ranges.iter().find(|r| !r.is_ordered()) {
            return Err(LaneError::invalid(
                "mask.color_ranges",
                format!("lower bound exceeds upper bound in {range:?}"),
            ));
        }
        if self.color_ranges.iter().any(|r| r.lower[0] > 180) {
            return Err(LaneError::invalid(
                "mask.color_ranges",
                "hue lower bound must be within 0..=180",
            ));
        }
        if !self.color_enabled && !self.gradient_enabled {
            return Err(LaneError::invalid(
                "mask",
                "at least one of the colour and gradient tests must be enabled",
            ));
        }
        Ok(())
    }
}

/// Turns colour frames into binary lane-candidate masks.
#[derive(Clone, Debug)]
pub struct MaskExtractor {
    options: MaskOptions,
}

impl MaskExtractor {
    pub fn new(options: MaskOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &MaskOptions {
        &self.options
    }

    /// Candidate mask with the dimensions of `frame`.
    pub fn extract(&self, frame: &ColorView<'_>) -> Mask {
        let mut mask = if self.options.color_enabled {
            self.color_mask(frame)
        } else {
            Mask::new(frame.w, frame.h)
        };
        if self.options.gradient_enabled {
            mask.union_with(&self.gradient_mask(frame));
        }
        debug!(
            "MaskExtractor::extract {}x{} on={}",
            frame.w,
            frame.h,
            mask.count_on()
        );
        mask
    }

    /// Colour-band test alone.
    pub fn color_mask(&self, frame: &ColorView<'_>) -> Mask {
        let order = self.options.channel_order;
        let ranges = &self.options.color_ranges;
        let mut mask = Mask::new(frame.w, frame.h);
        for y in 0..frame.h {
            for (x, px) in frame.row(y).chunks_exact(3).enumerate() {
                let hsv = rgb_to_hsv(order.to_rgb([px[0], px[1], px[2]]));
                if ranges.iter().any(|r| r.contains(hsv)) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Gradient-magnitude test alone.
    pub fn gradient_mask(&self, frame: &ColorView<'_>) -> Mask {
        let luma = luma_from_color(frame, self.options.channel_order);
        let scaled = sobel_gradients(&luma).scaled_magnitude_u8();
        let threshold = self.options.gradient_threshold;
        Mask::from_fn(frame.w, frame.h, |x, y| scaled[y * frame.w + x] >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ColorImage;

    const ASPHALT: [u8; 3] = [60, 60, 64];
    const WHITE: [u8; 3] = [240, 240, 240];

    fn frame_with_stripe(w: usize, h: usize, x0: usize, x1: usize, px: [u8; 3]) -> ColorImage {
        let mut img = ColorImage::filled(w, h, ASPHALT);
        for y in 0..h {
            for x in x0..x1 {
                img.put_pixel(x, y, px);
            }
        }
        img
    }

    #[test]
    fn white_stripe_is_candidate_by_colour() {
        let img = frame_with_stripe(40, 10, 18, 22, WHITE);
        let extractor = MaskExtractor::new(MaskOptions {
            gradient_enabled: false,
            ..Default::default()
        })
        .unwrap();
        let mask = extractor.extract(&img.as_view());
        assert_eq!(mask.count_on(), 4 * 10);
        assert!(mask.is_on(18, 5) && mask.is_on(21, 5));
        assert!(!mask.is_on(17, 5) && !mask.is_on(22, 5));
    }

    #[test]
    fn gradient_marks_edges_of_dim_stripe() {
        // Grey stripe is outside both colour bands but has strong edges.
        let img = frame_with_stripe(40, 10, 18, 22, [150, 150, 150]);
        let extractor = MaskExtractor::new(MaskOptions::default()).unwrap();
        let mask = extractor.extract(&img.as_view());
        assert!(mask.is_on(17, 5) && mask.is_on(22, 5));
        assert!(!mask.is_on(5, 5) && !mask.is_on(35, 5));
        assert!(extractor.color_mask(&img.as_view()).count_on() == 0);
    }

    #[test]
    fn output_is_union_of_tests() {
        let img = frame_with_stripe(40, 10, 18, 22, WHITE);
        let extractor = MaskExtractor::new(MaskOptions::default()).unwrap();
        let view = img.as_view();
        let mut expected = extractor.color_mask(&view);
        expected.union_with(&extractor.gradient_mask(&view));
        assert_eq!(extractor.extract(&view), expected);
    }

    #[test]
    fn flat_frame_has_no_candidates() {
        let img = ColorImage::filled(16, 16, ASPHALT);
        let extractor = MaskExtractor::new(MaskOptions::default()).unwrap();
        assert_eq!(extractor.extract(&img.as_view()).count_on(), 0);
    }

    #[test]
    fn rejects_inverted_range() {
        let opts = MaskOptions {
            color_ranges: vec![HsvRange::new([40, 0, 0], [20, 255, 255])],
            ..Default::default()
        };
        assert!(MaskExtractor::new(opts).is_err());
    }
}
