use lane_tracker::config::mask::load_config;
use lane_tracker::image::io::{load_frame, save_mask_png, write_json_file};
use lane_tracker::mask::MaskExtractor;
use lane_tracker::rectify::Rectifier;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let frame = load_frame(&config.input, config.mask.channel_order).map_err(|e| e.to_string())?;
    let view = frame.as_view();
    let extractor = MaskExtractor::new(config.mask.clone()).map_err(|e| e.to_string())?;
    let rectifier = Rectifier::new(&config.rectify, frame.width(), frame.height())
        .map_err(|e| e.to_string())?;

    let start = Instant::now();
    let color = extractor.color_mask(&view);
    let gradient = extractor.gradient_mask(&view);
    let mask = extractor.extract(&view);
    let mask_ms = start.elapsed().as_secs_f64() * 1000.0;
    let start = Instant::now();
    let birdseye = rectifier.forward(&mask);
    let rectify_ms = start.elapsed().as_secs_f64() * 1000.0;

    save_mask_png(&mask, &config.output.mask_image).map_err(|e| e.to_string())?;
    println!("Saved mask to {}", config.output.mask_image.display());
    if let Some(path) = &config.output.birdseye_image {
        save_mask_png(&birdseye, path).map_err(|e| e.to_string())?;
        println!("Saved bird's-eye mask to {}", path.display());
    }

    let (birdseye_width, birdseye_height) = rectifier.output_size();
    let summary = MaskSummary {
        width: frame.width(),
        height: frame.height(),
        birdseye_width,
        birdseye_height,
        color_pixels: color.count_on(),
        gradient_pixels: gradient.count_on(),
        mask_pixels: mask.count_on(),
        birdseye_pixels: birdseye.count_on(),
        mask_ms,
        rectify_ms,
    };
    if let Some(path) = &config.output.summary_json {
        write_json_file(path, &summary).map_err(|e| e.to_string())?;
        println!("Saved summary to {}", path.display());
    } else {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
        println!("{json}");
    }
    Ok(())
}

fn usage() -> String {
    "Usage: mask_demo <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaskSummary {
    width: usize,
    height: usize,
    birdseye_width: usize,
    birdseye_height: usize,
    color_pixels: usize,
    gradient_pixels: usize,
    mask_pixels: usize,
    birdseye_pixels: usize,
    mask_ms: f64,
    rectify_ms: f64,
}
