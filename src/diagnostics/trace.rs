use crate::diagnostics::TimingBreakdown;
use crate::types::{LanePointSet, LaneResult, PolynomialFit};
use crate::window::WindowTrace;
use serde::Serialize;

/// Result produced by
/// [`LaneTracker::process_with_diagnostics`](crate::LaneTracker).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReport {
    pub result: LaneResult,
    pub trace: FrameTrace,
    /// Window pixels behind each raw fit.
    pub left_points: LanePointSet,
    pub right_points: LanePointSet,
}

fn format_optional(val: Option<&PolynomialFit>) -> String {
    val.map(|fit| {
        let coeffs: Vec<String> = fit.coefficients().iter().map(|c| format!("{c:.4e}")).collect();
        format!("[{}]", coeffs.join(", "))
    })
    .unwrap_or_else(|| "-".to_string())
}

impl TrackingReport {
    /// One-line human readable summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "frame={} mask={} birdseye={} left_pts={} right_pts={} left={} right={} total={:.2}ms",
            self.trace.frame_index,
            self.trace.mask_pixels,
            self.trace.birdseye_pixels,
            self.result.left_points,
            self.result.right_points,
            format_optional(self.result.left.as_ref()),
            format_optional(self.result.right.as_ref()),
            self.trace.timings.total_ms
        )
    }
}

/// Stage-by-stage account of one frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTrace {
    pub frame_index: u64,
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    /// "On" pixels in the frame-space mask.
    pub mask_pixels: usize,
    /// "On" pixels after rectification.
    pub birdseye_pixels: usize,
    pub base_columns: (usize, usize),
    pub windows: Vec<WindowTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_fit: Option<FitStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_fit: Option<FitStage>,
    /// Whether each smoother held a track after this frame.
    pub tracking: (bool, bool),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub birdseye_width: usize,
    pub birdseye_height: usize,
}

/// Consensus statistics of one side's robust fit.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitStage {
    pub points: usize,
    pub inliers: usize,
    pub threshold: f64,
    pub trials: usize,
}
