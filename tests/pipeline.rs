mod common;

use common::synthetic_image::{road_frame, ASPHALT, WHITE, YELLOW};
use lane_tracker::diagnostics::FrameRecord;
use lane_tracker::fit::FitOptions;
use lane_tracker::image::{ChannelOrder, ColorImage};
use lane_tracker::mask::MaskOptions;
use lane_tracker::rectify::RectifyOptions;
use lane_tracker::source::{FrameQueue, FrameSource, PeekableSource};
use lane_tracker::{LaneError, LaneParams, LaneTracker};

const W: usize = 640;
const H: usize = 480;
// Bird's-eye lane columns inside the rectified road rectangle (128..512).
const LEFT_X: f64 = 200.0;
const RIGHT_X: f64 = 440.0;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn params() -> LaneParams {
    LaneParams {
        fit: FitOptions {
            seed: Some(2024),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn lane_frame() -> ColorImage {
    road_frame(
        W,
        H,
        &RectifyOptions::default(),
        &[(LEFT_X, YELLOW), (RIGHT_X, WHITE)],
        6.0,
    )
}

#[test]
fn painted_lanes_are_found_in_birdseye_space() {
    init();
    let frame = lane_frame();
    let mut tracker = LaneTracker::new(params(), W, H).unwrap();
    let report = tracker.process_with_diagnostics(&frame.as_view()).unwrap();
    let result = &report.result;

    let left = result.left.as_ref().expect("left lane");
    let right = result.right.as_ref().expect("right lane");
    for y in [60.0, 240.0, 420.0] {
        assert!((left.eval(y) - LEFT_X).abs() < 8.0, "left x({y})={}", left.eval(y));
        assert!((right.eval(y) - RIGHT_X).abs() < 8.0, "right x({y})={}", right.eval(y));
    }
    assert!(report.trace.mask_pixels > 0);
    assert!(report.trace.left_fit.as_ref().unwrap().inliers >= 3);
}

#[test]
fn overlay_region_covers_the_lane_in_the_frame() {
    let frame = lane_frame();
    let mut tracker = LaneTracker::new(params(), W, H).unwrap();
    let result = tracker.process(&frame.as_view()).unwrap();
    let overlay = result.overlay.expect("overlay enabled by default");
    assert!(!overlay.left.is_empty() && !overlay.right.is_empty());

    let region = overlay.region_mask(W, H);
    // Bottom centre of the frame sits between the lanes; the corners do not.
    assert!(region.is_on(W / 2, H - 5));
    assert!(!region.is_on(5, H - 5));
    assert!(!region.is_on(W - 5, H - 5));
    // Nothing above the road trapezoid.
    assert!(!region.is_on(W / 2, H / 2));
}

#[test]
fn blank_frame_coasts_then_lanes_resume() {
    init();
    let mut tracker = LaneTracker::new(params(), W, H).unwrap();
    let lanes = lane_frame();
    let blank = ColorImage::filled(W, H, ASPHALT);

    let first = tracker.process(&lanes.as_view()).unwrap();
    let coasted = tracker.process(&blank.as_view()).unwrap();
    assert!(coasted.raw_left.is_none() && coasted.raw_right.is_none());
    assert_eq!(coasted.left, first.left);
    assert_eq!(coasted.right, first.right);

    let resumed = tracker.process(&lanes.as_view()).unwrap();
    assert!(resumed.raw_left.is_some());
    assert_eq!(resumed.frame_index, 2);
}

#[test]
fn bgr_frames_match_rgb_frames() {
    let rgb = lane_frame();
    let bgr_data: Vec<u8> = rgb
        .as_raw()
        .chunks_exact(3)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect();
    let bgr = ColorImage::from_raw(W, H, bgr_data).unwrap();

    let mut rgb_tracker = LaneTracker::new(params(), W, H).unwrap();
    let mut bgr_params = params();
    bgr_params.mask = MaskOptions {
        channel_order: ChannelOrder::Bgr,
        ..Default::default()
    };
    let mut bgr_tracker = LaneTracker::new(bgr_params, W, H).unwrap();

    let a = rgb_tracker.process(&rgb.as_view()).unwrap();
    let b = bgr_tracker.process(&bgr.as_view()).unwrap();
    assert_eq!(a.left_points, b.left_points);
    assert_eq!(a.right_points, b.right_points);
    assert_eq!(a.left, b.left);
}

#[test]
fn stream_produces_one_record_per_frame() {
    let mut source = FrameQueue::new([lane_frame(), ColorImage::filled(W, H, ASPHALT), lane_frame()]);
    let mut tracker = LaneTracker::new(params(), W, H).unwrap();
    let mut records = Vec::new();
    let count = tracker
        .track_stream(&mut source, None, |_, report| {
            records.push(FrameRecord::from_report(&report, true));
            Ok(())
        })
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(
        records.iter().map(|r| r.frame_index).collect::<Vec<_>>(),
        [0, 1, 2]
    );
    assert!(records[1].raw_left.is_none());
    assert_eq!(records[1].left, records[0].left);
    assert_eq!(
        records[0].left_pixels.as_ref().map(Vec::len),
        Some(records[0].left_points)
    );
}

#[test]
fn stream_honours_frame_limit() {
    let mut source = FrameQueue::new((0..4).map(|_| ColorImage::filled(W, H, ASPHALT)));
    let mut tracker = LaneTracker::new(params(), W, H).unwrap();
    let count = tracker
        .track_stream(&mut source, Some(2), |_, _| Ok(()))
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(source.len(), 2);
}

#[test]
fn zero_frame_limit_tracks_nothing_after_sizing() {
    let mut source = PeekableSource::new(FrameQueue::new([lane_frame(), lane_frame()]));
    let (w, h) = source
        .peek()
        .unwrap()
        .map(|f| (f.width(), f.height()))
        .unwrap();
    let mut tracker = LaneTracker::new(params(), w, h).unwrap();
    let mut seen = 0;
    let count = tracker
        .track_stream(&mut source, Some(0), |_, _| {
            seen += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!((count, seen), (0, 0));
    assert_eq!(tracker.frame_index(), 0);
    // The sized frame is still pending.
    assert!(source.next_frame().unwrap().is_some());
    assert_eq!(source.into_inner().len(), 1);
}

#[test]
fn collinear_corners_fail_at_construction() {
    let mut params = LaneParams::default();
    params.rectify.src_ratios = [[0.1, 0.5], [0.5, 0.5], [0.9, 0.5], [0.1, 1.0]];
    let err = LaneTracker::new(params, W, H).unwrap_err();
    assert!(matches!(err, LaneError::DegenerateQuad { which: "source", .. }), "{err}");
    assert!(err.is_configuration());
}

#[test]
fn invalid_options_fail_at_construction() {
    let mut params = LaneParams::default();
    params.fit.degree = 0;
    assert!(matches!(
        LaneTracker::new(params, W, H),
        Err(LaneError::InvalidParameter { name: "fit.degree", .. })
    ));

    let mut params = LaneParams::default();
    params.kalman.process_noise = f64::NAN;
    assert!(LaneTracker::new(params, W, H).is_err());
}
