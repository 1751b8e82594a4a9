#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod compose;
pub mod diagnostics;
pub mod error;
pub mod params;
pub mod source;
pub mod tracker;
pub mod types;

// Stage modules, public for tools and tests.
pub mod edges;
pub mod fit;
pub mod homography;
pub mod image;
pub mod kalman;
pub mod mask;
pub mod rectify;
pub mod window;

// Demo configuration.
pub mod config;

// --- High-level re-exports -------------------------------------------------

// Main entry points: tracker + results.
pub use crate::error::{LaneError, Result};
pub use crate::params::LaneParams;
pub use crate::tracker::LaneTracker;
pub use crate::types::{LanePoint, LanePointSet, LaneResult, LaneSide, PolynomialFit};

// High-level diagnostics returned by the tracker.
pub use crate::diagnostics::{FrameRecord, FrameTrace, TrackingReport};

// Geometry helpers that are generally useful.
pub use crate::homography::{apply_homography_points, PerspectiveTransform};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use lane_tracker::prelude::*;
///
/// # fn main() -> lane_tracker::Result<()> {
/// let (w, h) = (640usize, 480usize);
/// let frame = ColorImage::filled(w, h, [90, 90, 90]);
///
/// let mut tracker = LaneTracker::new(LaneParams::default(), w, h)?;
/// let result = tracker.process(&frame.as_view())?;
/// println!("left={:?} latency_ms={:.3}", result.left, result.latency_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ColorImage, Mask};
    pub use crate::{LaneParams, LaneResult, LaneTracker, PolynomialFit};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::compose::{compose_overlay, ComposeOptions, LaneOverlay};
    pub use crate::fit::{FitOptions, FitOutcome, RobustFitter};
    pub use crate::kalman::{
        CoastPolicy, CovarianceUpdate, KalmanLaneState, KalmanOptions, PolynomialKalman,
    };
    pub use crate::mask::{MaskExtractor, MaskOptions};
    pub use crate::rectify::{Rectifier, RectifyOptions};
    pub use crate::window::{SlidingWindowDetector, WindowOptions, WindowSearch, WindowTrace};

    pub use crate::diagnostics::{FitStage, InputDescriptor, StageTiming, TimingBreakdown};
}
