//! Interleaved 8-bit, 3-channel frames.
//!
//! `ColorImage` owns its samples; `ColorView` borrows a possibly strided
//! buffer (e.g. a row-padded capture) without copying.
use super::traits::ImageView;
use serde::{Deserialize, Serialize};

/// Order of the three samples of a pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Reorder a raw pixel to `[r, g, b]`.
    #[inline]
    pub fn to_rgb(self, px: [u8; 3]) -> [u8; 3] {
        match self {
            ChannelOrder::Rgb => px,
            ChannelOrder::Bgr => [px[2], px[1], px[0]],
        }
    }
}

/// Borrowed 3-channel frame; `stride` is in bytes between rows.
#[derive(Clone, Copy, Debug)]
pub struct ColorView<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> ColorView<'a> {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = y * self.stride + 3 * x;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

impl<'a> ImageView for ColorView<'a> {
    type Sample = u8;
    const CHANNELS: usize = 3;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + 3 * self.w]
    }
}

/// Owned, tightly packed 3-channel frame.
#[derive(Clone, Debug)]
pub struct ColorImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ColorImage {
    /// Wrap raw interleaved samples; returns `None` when the length does not
    /// match `3 * width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == 3 * width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with a single pixel value.
    pub fn filled(width: usize, height: usize, px: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(3 * width * height);
        for _ in 0..width * height {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Take ownership of a decoded `image` buffer, reordering to `order`.
    pub fn from_rgb8(img: image::RgbImage, order: ChannelOrder) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let mut data = img.into_raw();
        if order == ChannelOrder::Bgr {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = 3 * (y * self.width + x);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, px: [u8; 3]) {
        let i = 3 * (y * self.width + x);
        self.data[i..i + 3].copy_from_slice(&px);
    }

    /// Borrow as a read-only `ColorView`.
    pub fn as_view(&self) -> ColorView<'_> {
        ColorView {
            w: self.width,
            h: self.height,
            stride: 3 * self.width,
            data: &self.data,
        }
    }
}
