//! Image gradients used by the lane mask.
//!
//! - Sobel derivatives with replicated borders.
//! - Magnitude rescaled to the 8-bit range by the per-frame maximum, which is
//!   what the gradient threshold of the mask stage is expressed in.

pub mod grad;

pub use grad::{luma_from_color, sobel_gradients, Grad};
