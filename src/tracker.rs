//! Per-frame lane tracking pipeline.
//!
//! Overview
//! - Mask: colour bands OR gradient magnitude on the camera frame.
//! - Rectify: warp the mask to a bird's-eye view with a fixed homography.
//! - Window search: histogram-seeded sliding windows collect the pixels of
//!   each lane boundary.
//! - Fit: RANSAC consensus plus polynomial refit per side; fewer than the
//!   minimum points yields no fit.
//! - Smooth: one coefficient Kalman filter per side, coasting through frames
//!   without a fit.
//! - Compose: warp the smoothed boundaries back to the frame for display.
//!
//! Frames are processed strictly in order; each call runs to completion and
//! mutates only the two smoothers owned by the tracker.
//!
//! ```no_run
//! use lane_tracker::image::ColorImage;
//! use lane_tracker::{LaneParams, LaneTracker};
//!
//! # fn example(frame: ColorImage) -> lane_tracker::error::Result<()> {
//! let mut tracker = LaneTracker::new(LaneParams::default(), frame.width(), frame.height())?;
//! let result = tracker.process(&frame.as_view())?;
//! if let Some(left) = &result.left {
//!     println!("left boundary at the bottom row: {:.1}", left.eval(479.0));
//! }
//! # Ok(())
//! # }
//! ```
use crate::compose::compose_overlay;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{FitStage, FrameTrace, InputDescriptor, TimingBreakdown, TrackingReport};
use crate::error::{LaneError, Result};
use crate::fit::{FitOutcome, RobustFitter};
use crate::image::{ColorImage, ColorView, Mask};
use crate::kalman::PolynomialKalman;
use crate::mask::MaskExtractor;
use crate::params::LaneParams;
use crate::rectify::Rectifier;
use crate::source::FrameSource;
use crate::types::{LaneResult, LaneSide};
use crate::window::SlidingWindowDetector;
use log::debug;
use std::time::Instant;

/// Lane tracker for one camera geometry.
#[derive(Clone, Debug)]
pub struct LaneTracker {
    params: LaneParams,
    masker: MaskExtractor,
    rectifier: Rectifier,
    detector: SlidingWindowDetector,
    fitter: RobustFitter,
    left: PolynomialKalman,
    right: PolynomialKalman,
    frame_index: u64,
}

impl LaneTracker {
    /// Validate `params` and build every stage for frames of the given size.
    /// Degenerate rectification corners are reported here.
    pub fn new(params: LaneParams, frame_width: usize, frame_height: usize) -> Result<Self> {
        params.validate()?;
        let masker = MaskExtractor::new(params.mask.clone())?;
        let rectifier = Rectifier::new(&params.rectify, frame_width, frame_height)?;
        let birdseye_height = rectifier.output_size().1;
        if birdseye_height < params.window.windows {
            return Err(LaneError::invalid(
                "window.windows",
                format!(
                    "{} windows do not fit a bird's-eye height of {birdseye_height} rows",
                    params.window.windows
                ),
            ));
        }
        let detector = SlidingWindowDetector::new(params.window.clone())?;
        let fitter = RobustFitter::new(params.fit.clone())?;
        let left = PolynomialKalman::new(params.fit.degree, params.kalman.clone())?;
        let right = PolynomialKalman::new(params.fit.degree, params.kalman.clone())?;
        Ok(Self {
            params,
            masker,
            rectifier,
            detector,
            fitter,
            left,
            right,
            frame_index: 0,
        })
    }

    pub fn params(&self) -> &LaneParams {
        &self.params
    }

    pub fn mask_extractor(&self) -> &MaskExtractor {
        &self.masker
    }

    pub fn rectifier(&self) -> &Rectifier {
        &self.rectifier
    }

    pub fn smoother(&self, side: LaneSide) -> &PolynomialKalman {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    /// Index the next processed frame will carry.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Forget both tracks and restart frame numbering.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.frame_index = 0;
    }

    /// Track one camera frame.
    pub fn process(&mut self, frame: &ColorView<'_>) -> Result<LaneResult> {
        self.process_with_diagnostics(frame).map(|report| report.result)
    }

    /// Track one camera frame and report what every stage saw.
    pub fn process_with_diagnostics(&mut self, frame: &ColorView<'_>) -> Result<TrackingReport> {
        check_size(self.rectifier.frame_size(), (frame.w, frame.h))?;
        let total = Instant::now();
        let mut timings = TimingBreakdown::default();

        let t = Instant::now();
        let mask = self.masker.extract(frame);
        let t = timings.lap("mask", t);
        let birdseye = self.rectifier.forward(&mask);
        timings.lap("rectify", t);

        Ok(self.track(mask.count_on(), &birdseye, timings, total))
    }

    /// Track a mask that is already in bird's-eye space, skipping masking and
    /// rectification.
    pub fn process_birdseye(&mut self, birdseye: &Mask) -> Result<TrackingReport> {
        check_size(
            self.rectifier.output_size(),
            (birdseye.width(), birdseye.height()),
        )?;
        let total = Instant::now();
        let on = birdseye.count_on();
        Ok(self.track(on, birdseye, TimingBreakdown::default(), total))
    }

    /// Drain `source`, handing every frame and its report to `sink`. Stops
    /// after `max_frames` when given. Returns the number of frames tracked.
    pub fn track_stream<S, F>(
        &mut self,
        source: &mut S,
        max_frames: Option<usize>,
        mut sink: F,
    ) -> Result<usize>
    where
        S: FrameSource + ?Sized,
        F: FnMut(&ColorImage, TrackingReport) -> Result<()>,
    {
        let mut count = 0usize;
        while max_frames.map_or(true, |max| count < max) {
            let Some(frame) = source.next_frame()? else {
                break;
            };
            let report = self.process_with_diagnostics(&frame.as_view())?;
            sink(&frame, report)?;
            count += 1;
        }
        debug!("LaneTracker::track_stream frames={}", count);
        Ok(count)
    }

    fn track(
        &mut self,
        mask_pixels: usize,
        birdseye: &Mask,
        mut timings: TimingBreakdown,
        total: Instant,
    ) -> TrackingReport {
        let t = Instant::now();
        let search = self.detector.detect(birdseye);
        let t = timings.lap("window", t);

        let left_fit = self.fitter.fit_detailed(&search.left);
        let right_fit = self.fitter.fit_detailed(&search.right);
        let t = timings.lap("fit", t);

        let raw_left = left_fit.as_ref().map(|o| o.fit.clone());
        let raw_right = right_fit.as_ref().map(|o| o.fit.clone());
        let left = self.left.update(raw_left.as_ref());
        let right = self.right.update(raw_right.as_ref());
        let t = timings.lap("smooth", t);

        let overlay = self.params.compose.enabled.then(|| {
            compose_overlay(
                left.as_ref(),
                right.as_ref(),
                &self.rectifier,
                &self.params.compose,
            )
        });
        timings.lap("compose", t);
        timings.total_ms = elapsed_ms(total);

        let frame_index = self.frame_index;
        self.frame_index += 1;
        debug!(
            "LaneTracker::process frame={} left_pts={} right_pts={} raw=({}, {}) tracking=({}, {})",
            frame_index,
            search.left.len(),
            search.right.len(),
            raw_left.is_some(),
            raw_right.is_some(),
            self.left.is_tracking(),
            self.right.is_tracking()
        );

        let (frame_width, frame_height) = self.rectifier.frame_size();
        let trace = FrameTrace {
            frame_index,
            input: InputDescriptor {
                width: frame_width,
                height: frame_height,
                birdseye_width: birdseye.width(),
                birdseye_height: birdseye.height(),
            },
            mask_pixels,
            birdseye_pixels: birdseye.count_on(),
            base_columns: search.base_columns,
            windows: search.windows,
            left_fit: left_fit.as_ref().map(|o| fit_stage(o, search.left.len())),
            right_fit: right_fit.as_ref().map(|o| fit_stage(o, search.right.len())),
            tracking: (self.left.is_tracking(), self.right.is_tracking()),
            timings,
        };
        let result = LaneResult {
            frame_index,
            left,
            right,
            raw_left,
            raw_right,
            left_points: search.left.len(),
            right_points: search.right.len(),
            overlay,
            latency_ms: trace.timings.total_ms,
        };
        TrackingReport {
            result,
            trace,
            left_points: search.left,
            right_points: search.right,
        }
    }
}

fn fit_stage(outcome: &FitOutcome, points: usize) -> FitStage {
    FitStage {
        points,
        inliers: outcome.inliers,
        threshold: outcome.threshold,
        trials: outcome.trials,
    }
}

fn check_size(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(LaneError::FrameSize { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitOptions;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn seeded_params() -> LaneParams {
        LaneParams {
            fit: FitOptions {
                seed: Some(7),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn vertical_lines(w: usize, h: usize, cols: &[usize]) -> Mask {
        Mask::from_fn(w, h, |x, _| cols.iter().any(|&c| x.abs_diff(c) <= 1))
    }

    #[test]
    fn birdseye_shorter_than_window_count_is_rejected() {
        let mut params = LaneParams::default();
        params.rectify.output_size = Some((64, 4));
        assert!(params.window.windows > 4);
        let err = LaneTracker::new(params.clone(), 64, 48).unwrap_err();
        assert!(
            matches!(err, LaneError::InvalidParameter { name: "window.windows", .. }),
            "{err}"
        );
        params.window.windows = 4;
        assert!(LaneTracker::new(params, 64, 48).is_ok());
    }

    #[test]
    fn wrong_frame_size_is_rejected() {
        let mut tracker = LaneTracker::new(LaneParams::default(), 64, 48).unwrap();
        let frame = ColorImage::filled(32, 48, [0, 0, 0]);
        let err = tracker.process(&frame.as_view()).unwrap_err();
        assert!(matches!(
            err,
            LaneError::FrameSize {
                expected: (64, 48),
                actual: (32, 48)
            }
        ));
        assert_eq!(tracker.frame_index(), 0);
    }

    #[test]
    fn blank_frame_yields_no_lanes_and_no_track() {
        init();
        let mut tracker = LaneTracker::new(LaneParams::default(), 64, 48).unwrap();
        let frame = ColorImage::filled(64, 48, [0, 0, 0]);
        let result = tracker.process(&frame.as_view()).unwrap();
        assert!(result.left.is_none() && result.right.is_none());
        assert!(result.raw_left.is_none());
        assert!(!tracker.smoother(LaneSide::Left).is_tracking());
        // The overlay still spans the image edges.
        assert!(result.overlay.is_some());
    }

    #[test]
    fn birdseye_lines_are_tracked_and_coasted() {
        init();
        let mut tracker = LaneTracker::new(seeded_params(), 600, 400).unwrap();
        let mask = vertical_lines(600, 400, &[100, 500]);
        let first = tracker.process_birdseye(&mask).unwrap().result;
        let left = first.left.clone().unwrap();
        let right = first.right.clone().unwrap();
        assert_eq!(first.raw_left.as_ref(), Some(&left));
        assert!((left.eval(200.0) - 100.0).abs() < 1.5);
        assert!((right.eval(200.0) - 500.0).abs() < 1.5);

        let empty = Mask::new(600, 400);
        let coasted = tracker.process_birdseye(&empty).unwrap().result;
        assert!(coasted.raw_left.is_none());
        assert_eq!(coasted.left, Some(left));
        assert_eq!(coasted.right, Some(right));
        assert_eq!(coasted.frame_index, 1);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let mut tracker = LaneTracker::new(seeded_params(), 64, 48).unwrap();
        let frame = ColorImage::filled(64, 48, [0, 0, 0]);
        let report = tracker.process_with_diagnostics(&frame.as_view()).unwrap();
        let labels: Vec<_> = report
            .trace
            .timings
            .stages
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, ["mask", "rectify", "window", "fit", "smooth", "compose"]);
        assert_eq!(report.trace.windows.len(), 2 * 9);
        assert!(report.summary().contains("frame=0"));
    }

    #[test]
    fn reset_forgets_tracks() {
        let mut tracker = LaneTracker::new(seeded_params(), 600, 400).unwrap();
        tracker
            .process_birdseye(&vertical_lines(600, 400, &[100, 500]))
            .unwrap();
        tracker.reset();
        let result = tracker.process_birdseye(&Mask::new(600, 400)).unwrap().result;
        assert!(result.left.is_none());
        assert_eq!(result.frame_index, 0);
    }
}
