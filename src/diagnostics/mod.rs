//! Diagnostics data model exposed by the tracker and the demo binary.
//!
//! `TrackingReport` is returned by
//! [`LaneTracker::process_with_diagnostics`](crate::LaneTracker): it bundles
//! the per-frame `LaneResult` with a `FrameTrace` describing what each stage
//! saw. `FrameRecord` is the flat JSON export written per frame.

pub mod record;
pub mod timing;
pub mod trace;

pub use record::FrameRecord;
pub use timing::{StageTiming, TimingBreakdown};
pub use trace::{FitStage, FrameTrace, InputDescriptor, TrackingReport};
