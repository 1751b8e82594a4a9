//! Error taxonomy for the lane tracker.
//!
//! Only construction (configuration, geometry) and I/O fail with an error.
//! Per-frame shortages of data surface as absent fits, never as `Err`.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LaneError>;

#[derive(Debug, Error)]
pub enum LaneError {
    /// Three corners of a rectification quadrilateral are collinear.
    #[error("degenerate {which} quadrilateral: corners {corners:?} are collinear")]
    DegenerateQuad {
        which: &'static str,
        corners: [usize; 3],
    },

    /// The four-point linear system has no unique solution.
    #[error("perspective transform is singular")]
    SingularHomography,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A frame does not match the geometry the tracker was built for.
    #[error("frame size {actual:?} does not match configured size {expected:?}")]
    FrameSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LaneError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        LaneError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors raised while validating configuration or geometry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LaneError::DegenerateQuad { .. }
                | LaneError::SingularHomography
                | LaneError::InvalidParameter { .. }
        )
    }
}
