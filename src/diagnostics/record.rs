use crate::diagnostics::TrackingReport;
use crate::types::{LanePointSet, LaneResult, LaneSide, PolynomialFit};
use serde::Serialize;

/// Flat per-frame export for headless consumers.
#[derive(Clone, Debug, Serialize)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub left: Option<Vec<f64>>,
    pub right: Option<Vec<f64>>,
    pub raw_left: Option<Vec<f64>>,
    pub raw_right: Option<Vec<f64>>,
    pub left_points: usize,
    pub right_points: usize,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_pixels: Option<Vec<[i32; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_pixels: Option<Vec<[i32; 2]>>,
}

fn coeffs(fit: Option<&PolynomialFit>) -> Option<Vec<f64>> {
    fit.map(|f| f.coefficients().to_vec())
}

fn pixels(points: &LanePointSet) -> Vec<[i32; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

impl FrameRecord {
    pub fn from_result(result: &LaneResult) -> Self {
        Self {
            frame_index: result.frame_index,
            left: coeffs(result.smoothed(LaneSide::Left)),
            right: coeffs(result.smoothed(LaneSide::Right)),
            raw_left: coeffs(result.raw_left.as_ref()),
            raw_right: coeffs(result.raw_right.as_ref()),
            left_points: result.left_points,
            right_points: result.right_points,
            latency_ms: result.latency_ms,
            left_pixels: None,
            right_pixels: None,
        }
    }

    /// Record of a diagnostic run, optionally with the window pixels.
    pub fn from_report(report: &TrackingReport, include_points: bool) -> Self {
        let mut record = Self::from_result(&report.result);
        if include_points {
            record.left_pixels = Some(pixels(&report.left_points));
            record.right_pixels = Some(pixels(&report.right_points));
        }
        record
    }
}
