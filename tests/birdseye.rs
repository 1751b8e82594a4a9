mod common;

use common::synthetic_image::{birdseye_mask, vertical_lanes};
use lane_tracker::fit::{FitOptions, RansacOptions};
use lane_tracker::{LaneParams, LaneSide, LaneTracker};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seeded(seed: u64) -> LaneParams {
    LaneParams {
        fit: FitOptions {
            seed: Some(seed),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn straight_lanes_are_recovered_and_first_update_is_unchanged() {
    init();
    let (w, h) = (600, 400);
    let mask = vertical_lanes(w, h, &[100, 500], 2);
    let mut tracker = LaneTracker::new(seeded(11), w, h).unwrap();

    let report = tracker.process_birdseye(&mask).unwrap();
    assert_eq!(report.trace.base_columns, (98, 498));

    let result = report.result;
    let left = result.left.as_ref().expect("left lane");
    let right = result.right.as_ref().expect("right lane");
    assert_eq!(result.raw_left.as_ref(), Some(left));
    assert_eq!(result.raw_right.as_ref(), Some(right));
    for y in [10.0, 150.0, 300.0, 399.0] {
        assert!((left.eval(y) - 100.0).abs() < 2.0, "left x({y})={}", left.eval(y));
        assert!((right.eval(y) - 500.0).abs() < 2.0, "right x({y})={}", right.eval(y));
    }
    assert_eq!(left.degree(), 3);
}

#[test]
fn one_sided_dropout_coasts_only_that_side() {
    init();
    let (w, h) = (600, 400);
    let both = vertical_lanes(w, h, &[100, 500], 2);
    let left_only = vertical_lanes(w, h, &[100], 2);
    let mut tracker = LaneTracker::new(seeded(5), w, h).unwrap();

    let first = tracker.process_birdseye(&both).unwrap().result;
    let held_right = first.right.clone().unwrap();
    for _ in 0..5 {
        let r = tracker.process_birdseye(&left_only).unwrap().result;
        assert!(r.raw_left.is_some());
        assert!(r.raw_right.is_none());
        assert_eq!(r.right.as_ref(), Some(&held_right));
    }
    assert!(tracker.smoother(LaneSide::Right).is_tracking());
}

#[test]
fn smoothed_boundary_follows_a_lane_change_gradually() {
    init();
    let (w, h) = (600, 400);
    let mut tracker = LaneTracker::new(seeded(3), w, h).unwrap();
    tracker
        .process_birdseye(&vertical_lanes(w, h, &[100, 500], 2))
        .unwrap();
    let mut previous = 100.0;
    for _ in 0..10 {
        let r = tracker
            .process_birdseye(&vertical_lanes(w, h, &[140, 500], 2))
            .unwrap()
            .result;
        let x = r.left.unwrap().eval(300.0);
        let raw = r.raw_left.unwrap().eval(300.0);
        assert!((raw - 140.0).abs() < 2.0);
        assert!(x >= previous - 0.5, "smoothed x went backwards: {x} < {previous}");
        assert!(x <= 142.0);
        previous = x;
    }
    assert!((previous - 140.0).abs() < 2.0);
}

#[test]
fn curved_lane_with_quadratic_consensus() {
    init();
    let (w, h) = (600, 400);
    let curve = |y: f64| {
        let t = (400.0 - y) / 400.0;
        150.0 + 100.0 * t * t
    };
    let mask = birdseye_mask(w, h, &[&curve], 1.0);
    let params = LaneParams {
        fit: FitOptions {
            seed: Some(9),
            ransac: RansacOptions {
                model_degree: 2,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let mut tracker = LaneTracker::new(params, w, h).unwrap();
    let result = tracker.process_birdseye(&mask).unwrap().result;
    let left = result.left.expect("curved lane");
    for y in [20.0, 120.0, 250.0, 390.0] {
        assert!(
            (left.eval(y) - curve(y)).abs() < 1.5,
            "x({y})={} expected {}",
            left.eval(y),
            curve(y)
        );
    }
    assert!(result.right.is_none());
}
