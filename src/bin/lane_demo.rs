use lane_tracker::config::lane::{load_config, RuntimeConfig};
use lane_tracker::diagnostics::{FrameRecord, TrackingReport};
use lane_tracker::image::io::{save_mask_png, save_overlay_png, write_json_file};
use lane_tracker::image::ColorImage;
use lane_tracker::mask::MaskExtractor;
use lane_tracker::rectify::Rectifier;
use lane_tracker::source::{ImageSequence, PeekableSource};
use lane_tracker::LaneTracker;
use log::info;
use std::env;
use std::path::Path;

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
    let order = config.params.mask.channel_order;

    let sequence = ImageSequence::open(&config.input, order).map_err(|e| e.to_string())?;
    let mut source = PeekableSource::new(sequence);
    let (width, height) = source
        .peek()
        .map_err(|e| e.to_string())?
        .map(|frame| (frame.width(), frame.height()))
        .ok_or_else(|| format!("No frames found in {}", config.input.display()))?;
    let mut tracker =
        LaneTracker::new(config.params.clone(), width, height).map_err(|e| e.to_string())?;

    // Debug masks are recomputed with copies of the tracker's stages.
    let masker = tracker.mask_extractor().clone();
    let rectifier = tracker.rectifier().clone();
    let mut stats = RunStats::default();
    let mut records = Vec::new();
    let sink = |frame: &ColorImage, report: TrackingReport| -> lane_tracker::Result<()> {
        save_frame_outputs(&config, frame, &report, &masker, &rectifier)?;
        stats.observe(&report);
        records.push(FrameRecord::from_report(&report, config.output.include_points));
        Ok(())
    };
    tracker
        .track_stream(&mut source, config.max_frames, sink)
        .map_err(|e| e.to_string())?;

    if let Some(path) = &config.output.records_json {
        write_json_file(path, &records).map_err(|e| e.to_string())?;
        println!("Saved {} frame records to {}", records.len(), path.display());
    }
    stats.print();
    Ok(())
}

fn save_frame_outputs(
    config: &RuntimeConfig,
    frame: &ColorImage,
    report: &TrackingReport,
    masker: &MaskExtractor,
    rectifier: &Rectifier,
) -> lane_tracker::Result<()> {
    let index = report.result.frame_index;
    if let (Some(dir), Some(overlay)) = (&config.output.overlay_dir, &report.result.overlay) {
        let path = dir.join(format!("frame_{index:06}.png"));
        save_overlay_png(frame, config.params.mask.channel_order, overlay, &path)?;
    }
    if let Some(dir) = &config.output.debug_dir {
        let mask = masker.extract(&frame.as_view());
        save_mask_png(&mask, &dir.join(format!("mask_{index:06}.png")))?;
        let birdseye = rectifier.forward(&mask);
        save_mask_png(&birdseye, &dir.join(format!("birdseye_{index:06}.png")))?;
    }
    info!("{}", report.summary());
    Ok(())
}

#[derive(Default)]
struct RunStats {
    frames: usize,
    left_fits: usize,
    right_fits: usize,
    coasted: usize,
    total_ms: f64,
}

impl RunStats {
    fn observe(&mut self, report: &TrackingReport) {
        let r = &report.result;
        self.frames += 1;
        self.left_fits += usize::from(r.raw_left.is_some());
        self.right_fits += usize::from(r.raw_right.is_some());
        let left_coast = r.raw_left.is_none() && r.left.is_some();
        let right_coast = r.raw_right.is_none() && r.right.is_some();
        self.coasted += usize::from(left_coast || right_coast);
        self.total_ms += r.latency_ms;
    }

    fn print(&self) {
        let mean_ms = if self.frames > 0 {
            self.total_ms / self.frames as f64
        } else {
            0.0
        };
        println!("Tracking summary");
        println!("  frames: {}", self.frames);
        println!("  left fits: {}", self.left_fits);
        println!("  right fits: {}", self.right_fits);
        println!("  frames coasting a side: {}", self.coasted);
        println!("  mean latency_ms: {:.3}", mean_ms);
    }
}

fn usage() -> String {
    "Usage: lane_demo <config.json>".to_string()
}
