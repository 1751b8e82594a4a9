//! Parameter set configuring every stage of the lane tracker.
//!
//! Each stage owns its option struct (defined next to the stage); this module
//! only groups them. Every field has a default, so a JSON object may name
//! just the knobs it changes.

use crate::compose::ComposeOptions;
use crate::error::Result;
use crate::fit::FitOptions;
use crate::kalman::KalmanOptions;
use crate::mask::MaskOptions;
use crate::rectify::RectifyOptions;
use crate::window::WindowOptions;
use serde::Deserialize;

/// Tracker-wide parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LaneParams {
    /// Colour and gradient thresholds of the mask extractor.
    pub mask: MaskOptions,
    /// Road trapezoid and bird's-eye target.
    pub rectify: RectifyOptions,
    /// Sliding-window geometry.
    pub window: WindowOptions,
    /// Polynomial degree and RANSAC settings.
    pub fit: FitOptions,
    /// Coefficient smoother noise levels.
    pub kalman: KalmanOptions,
    /// Frame-space overlay sampling.
    pub compose: ComposeOptions,
}

impl LaneParams {
    /// Check every stage's options. Geometry (degenerate corners) is checked
    /// later, when the frame size is known.
    pub fn validate(&self) -> Result<()> {
        self.mask.validate()?;
        self.window.validate()?;
        self.fit.validate()?;
        self.kalman.validate()?;
        self.compose.validate()?;
        Ok(())
    }
}
