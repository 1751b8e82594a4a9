//! Sobel gradients with magnitude on a single-channel float image.
//!
//! - Convolves the 3×3 Sobel pair with border clamping (replicate).
//! - Outputs per-pixel `gx`, `gy` and `mag = sqrt(gx^2 + gy^2)`.
//!
//! Complexity: O(W·H) per pass; memory: three float buffers.
use crate::image::{ChannelOrder, ColorView, ImageF32, ImageView, ImageViewMut};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// BT.601 luma weights applied to `[r, g, b]`.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Per-pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative
    pub gx: ImageF32,
    /// Vertical derivative
    pub gy: ImageF32,
    /// Euclidean magnitude per pixel
    pub mag: ImageF32,
}

impl Grad {
    /// Magnitude rescaled so the strongest edge of the frame maps to 255.
    ///
    /// Values are truncated like an 8-bit conversion. A flat frame yields an
    /// all-zero buffer.
    pub fn scaled_magnitude_u8(&self) -> Vec<u8> {
        let max = self.mag.max_value();
        if max <= 0.0 || !max.is_finite() {
            return vec![0; self.mag.data.len()];
        }
        let scale = 255.0 / max;
        self.mag
            .data
            .iter()
            .map(|&m| (m * scale).clamp(0.0, 255.0) as u8)
            .collect()
    }
}

/// Grayscale conversion in `[0, 255]` float units.
pub fn luma_from_color(frame: &ColorView<'_>, order: ChannelOrder) -> ImageF32 {
    let mut out = ImageF32::new(frame.w, frame.h);
    for y in 0..frame.h {
        let src = frame.row(y);
        let dst = out.row_mut(y);
        for (x, px) in src.chunks_exact(3).enumerate() {
            let [r, g, b] = order.to_rgb([px[0], px[1], px[2]]);
            dst[x] = LUMA_WEIGHTS[0] * r as f32
                + LUMA_WEIGHTS[1] * g as f32
                + LUMA_WEIGHTS[2] * b as f32;
        }
    }
    out
}

/// Compute Sobel gradients on a single-channel float image.
pub fn sobel_gradients(l: &ImageF32) -> Grad {
    let w = l.w;
    let h = l.h;
    let mut gx = ImageF32::new(w, h);
    let mut gy = ImageF32::new(w, h);
    let mut mag = ImageF32::new(w, h);

    if w == 0 || h == 0 {
        return Grad { gx, gy, mag };
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [l.row(y_idx[0]), l.row(y_idx[1]), l.row(y_idx[2])];
        let out_gx = gx.row_mut(y);
        let out_gy = gy.row_mut(y);
        let out_mag = mag.row_mut(y);
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, yy_row) in rows.iter().enumerate() {
                let kx_row = &SOBEL_KERNEL_X[ky];
                let ky_row = &SOBEL_KERNEL_Y[ky];
                sum_x += yy_row[x_idx[0]] * kx_row[0]
                    + yy_row[x_idx[1]] * kx_row[1]
                    + yy_row[x_idx[2]] * kx_row[2];
                sum_y += yy_row[x_idx[0]] * ky_row[0]
                    + yy_row[x_idx[1]] * ky_row[1]
                    + yy_row[x_idx[2]] * ky_row[2];
            }

            out_gx[x] = sum_x;
            out_gy[x] = sum_y;
            out_mag[x] = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }

    Grad { gx, gy, mag }
}
