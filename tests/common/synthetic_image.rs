use lane_tracker::image::{ColorImage, Mask};
use lane_tracker::rectify::{Rectifier, RectifyOptions};

pub const ASPHALT: [u8; 3] = [70, 70, 75];
pub const YELLOW: [u8; 3] = [230, 200, 40];
pub const WHITE: [u8; 3] = [235, 235, 230];

/// Bird's-eye mask with a painted stripe around `x = f(y)` for every lane.
pub fn birdseye_mask(
    width: usize,
    height: usize,
    lanes: &[&dyn Fn(f64) -> f64],
    half_width: f64,
) -> Mask {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    Mask::from_fn(width, height, |x, y| {
        lanes
            .iter()
            .any(|lane| (x as f64 - lane(y as f64)).abs() <= half_width)
    })
}

/// Straight vertical stripes `2 * half_width + 1` pixels wide.
pub fn vertical_lanes(width: usize, height: usize, columns: &[usize], half_width: usize) -> Mask {
    Mask::from_fn(width, height, |x, _| {
        columns.iter().any(|&c| x.abs_diff(c) <= half_width)
    })
}

/// Camera frame of flat asphalt whose painted lanes land on the given
/// bird's-eye columns after rectification with `options`.
///
/// Only rows below the top edge of the road trapezoid are painted, which
/// keeps every painted pixel in front of the horizon.
pub fn road_frame(
    width: usize,
    height: usize,
    options: &RectifyOptions,
    lanes: &[(f64, [u8; 3])],
    half_width: f64,
) -> ColorImage {
    let rectifier = Rectifier::new(options, width, height).expect("valid rectifier");
    let (bw, bh) = rectifier.output_size();
    let top = options
        .src_ratios
        .iter()
        .map(|p| p[1])
        .fold(f64::INFINITY, f64::min);
    let first_row = (top * height as f64).ceil() as usize;

    let mut img = ColorImage::filled(width, height, ASPHALT);
    for y in first_row..height {
        for x in 0..width {
            let Some([u, v]) = rectifier.transform().forward_point([x as f64, y as f64]) else {
                continue;
            };
            if u < 0.0 || v < 0.0 || u >= bw as f64 || v >= bh as f64 {
                continue;
            }
            if let Some((_, color)) = lanes.iter().find(|(c, _)| (u - c).abs() <= half_width) {
                img.put_pixel(x, y, *color);
            }
        }
    }
    img
}
