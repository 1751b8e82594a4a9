use crate::compose::LaneOverlay;
use serde::{Deserialize, Serialize};

/// Which boundary of the ego lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    pub const BOTH: [LaneSide; 2] = [LaneSide::Left, LaneSide::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            LaneSide::Left => "left",
            LaneSide::Right => "right",
        }
    }
}

/// Pixel in bird's-eye space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanePoint {
    pub x: i32,
    pub y: i32,
}

/// Unordered pixels attributed to one lane boundary in one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanePointSet {
    pub points: Vec<LanePoint>,
}

impl LanePointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, x: i32, y: i32) {
        self.points.push(LanePoint { x, y });
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanePoint> {
        self.points.iter()
    }

    /// Split into `(ys, xs)` regression inputs for `x = f(y)`.
    pub fn regression_data(&self) -> (Vec<f64>, Vec<f64>) {
        self.points
            .iter()
            .map(|p| (p.y as f64, p.x as f64))
            .unzip()
    }
}

impl FromIterator<LanePoint> for LanePointSet {
    fn from_iter<T: IntoIterator<Item = LanePoint>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Polynomial `x = f(y)`, coefficients ordered highest degree first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolynomialFit {
    coefficients: Vec<f64>,
}

impl PolynomialFit {
    pub fn new(coefficients: Vec<f64>) -> Self {
        debug_assert!(!coefficients.is_empty(), "polynomial needs a coefficient");
        Self { coefficients }
    }

    /// `x = value` expressed with `degree + 1` coefficients.
    pub fn constant(value: f64, degree: usize) -> Self {
        let mut coefficients = vec![0.0; degree + 1];
        coefficients[degree] = value;
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Horner evaluation at `y`.
    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, &c| acc * y + c)
    }

    /// Evaluate at every `y` in `ys`.
    pub fn sample(&self, ys: &[f64]) -> Vec<f64> {
        ys.iter().map(|&y| self.eval(y)).collect()
    }

    pub fn is_finite(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_finite())
    }
}

/// Per-frame tracker output.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LaneResult {
    pub frame_index: u64,
    /// Kalman-smoothed boundaries.
    pub left: Option<PolynomialFit>,
    pub right: Option<PolynomialFit>,
    /// Fits of this frame before smoothing.
    pub raw_left: Option<PolynomialFit>,
    pub raw_right: Option<PolynomialFit>,
    pub left_points: usize,
    pub right_points: usize,
    /// Frame-space lane region, when composing is enabled.
    pub overlay: Option<LaneOverlay>,
    pub latency_ms: f64,
}

impl LaneResult {
    pub fn smoothed(&self, side: LaneSide) -> Option<&PolynomialFit> {
        match side {
            LaneSide::Left => self.left.as_ref(),
            LaneSide::Right => self.right.as_ref(),
        }
    }
}
