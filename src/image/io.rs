//! I/O helpers for frames, masks and JSON.
//!
//! - `load_frame`: read a PNG/JPEG/BMP into an owned 3-channel frame.
//! - `save_mask_png`: write a binary mask as a grayscale PNG.
//! - `save_overlay_png`: composite a lane overlay onto a frame and write it.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ChannelOrder, ColorImage, Mask};
use crate::compose::{clip_segment, LaneOverlay};
use crate::error::Result;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::map::map_colors2;
use serde::Serialize;
use std::fs;
use std::path::Path;

const FILL_RGB: Rgb<u8> = Rgb([0, 255, 0]);
const LEFT_RGB: Rgb<u8> = Rgb([255, 0, 0]);
const RIGHT_RGB: Rgb<u8> = Rgb([0, 0, 255]);
const FILL_WEIGHT: f32 = 0.3;
const LINE_HALF_WIDTH: i32 = 2;

/// Load an image from disk as a 3-channel frame in the requested order.
pub fn load_frame(path: &Path, order: ChannelOrder) -> Result<ColorImage> {
    let img = image::open(path)?.into_rgb8();
    Ok(ColorImage::from_rgb8(img, order))
}

/// Save a binary mask to a grayscale PNG (on = 255).
pub fn save_mask_png(mask: &Mask, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(mask.width() as u32, mask.height() as u32);
    for (x, y) in mask.on_pixels() {
        out.put_pixel(x as u32, y as u32, image::Luma([255]));
    }
    out.save(path)?;
    Ok(())
}

/// Composite the lane overlay onto `frame` and save it as an RGB PNG.
///
/// The region is filled on a blank layer and added at `FILL_WEIGHT`
/// (`frame + 0.3 * layer`, saturating); both boundaries are then drawn
/// opaque on top.
pub fn save_overlay_png(
    frame: &ColorImage,
    order: ChannelOrder,
    overlay: &LaneOverlay,
    path: &Path,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let out = render_overlay(frame, order, overlay);
    out.save(path)?;
    Ok(())
}

fn render_overlay(frame: &ColorImage, order: ChannelOrder, overlay: &LaneOverlay) -> RgbImage {
    let (w, h) = (frame.width(), frame.height());
    let base = RgbImage::from_fn(w as u32, h as u32, |x, y| {
        Rgb(order.to_rgb(frame.pixel(x as usize, y as usize)))
    });
    let mut layer = RgbImage::new(w as u32, h as u32);
    for (x, y) in overlay.region_mask(w, h).on_pixels() {
        layer.put_pixel(x as u32, y as u32, FILL_RGB);
    }
    let mut out = map_colors2(&base, &layer, |a, b| {
        Rgb([0, 1, 2].map(|c| {
            (a[c] as f32 + FILL_WEIGHT * b[c] as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        }))
    });
    draw_polyline(&mut out, &overlay.left, LEFT_RGB);
    draw_polyline(&mut out, &overlay.right, RIGHT_RGB);
    out
}

/// Draw `pts` as a `2 * LINE_HALF_WIDTH + 1` pixel wide polyline. Segments
/// are clipped to the image before rasterizing.
fn draw_polyline(img: &mut RgbImage, pts: &[[f64; 2]], color: Rgb<u8>) {
    let lo = [0.0, 0.0];
    let hi = [
        img.width().saturating_sub(1) as f64,
        img.height().saturating_sub(1) as f64,
    ];
    for pair in pts.windows(2) {
        let Some((a, b)) = clip_segment(pair[0], pair[1], lo, hi) else {
            continue;
        };
        for offset in -LINE_HALF_WIDTH..=LINE_HALF_WIDTH {
            let dx = offset as f32;
            draw_line_segment_mut(
                img,
                (a[0] as f32 + dx, a[1] as f32),
                (b[0] as f32 + dx, b[1] as f32),
                color,
            );
        }
    }
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
