//! Robust lane-curve fitting.
//!
//! Raw window pixels carry shadows, neighbouring markings and partial
//! occlusion. The fitter first finds a RANSAC consensus over `x = g(y)` and
//! then fits the output polynomial to the consensus prediction at every
//! sampled row, so a single stray cluster cannot bend the curve.
//!
//! Modules
//! - [`polyfit`] – column-scaled least-squares polynomial solve.
//! - [`ransac`] – consensus search with an adaptive (MAD) inlier band.

pub mod polyfit;
pub mod ransac;

pub use polyfit::{polyfit, polyval};
pub use ransac::{median_absolute_deviation, ransac_fit, RansacModel, RansacOptions};

use crate::error::{LaneError, Result};
use crate::types::{LanePointSet, PolynomialFit};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

/// Fewest points a fit is attempted on.
pub const MIN_FIT_POINTS: usize = 3;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Degree of the emitted polynomial (>= 1).
    pub degree: usize,
    /// Point sets smaller than this yield no fit (>= 3).
    pub min_points: usize,
    pub ransac: RansacOptions,
    /// Fixed seed makes every call reproducible; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            degree: 3,
            min_points: MIN_FIT_POINTS,
            ransac: RansacOptions::default(),
            seed: None,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<()> {
        if self.degree < 1 {
            return Err(LaneError::invalid("fit.degree", "must be at least 1"));
        }
        if self.min_points < MIN_FIT_POINTS {
            return Err(LaneError::invalid(
                "fit.min_points",
                format!("must be at least {MIN_FIT_POINTS}"),
            ));
        }
        if self.ransac.max_trials == 0 {
            return Err(LaneError::invalid("fit.ransac.max_trials", "must be positive"));
        }
        let p = self.ransac.stop_probability;
        if !(p > 0.0 && p <= 1.0) {
            return Err(LaneError::invalid(
                "fit.ransac.stop_probability",
                format!("must lie in (0, 1], got {p}"),
            ));
        }
        if let Some(t) = self.ransac.residual_threshold {
            if !t.is_finite() || t < 0.0 {
                return Err(LaneError::invalid(
                    "fit.ransac.residual_threshold",
                    format!("must be finite and non-negative, got {t}"),
                ));
            }
        }
        Ok(())
    }
}

/// Fit plus the consensus statistics behind it.
#[derive(Clone, Debug)]
pub struct FitOutcome {
    pub fit: PolynomialFit,
    pub inliers: usize,
    pub threshold: f64,
    pub trials: usize,
}

#[derive(Clone, Debug)]
pub struct RobustFitter {
    options: FitOptions,
}

impl RobustFitter {
    pub fn new(options: FitOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    pub fn fit(&self, points: &LanePointSet) -> Option<PolynomialFit> {
        self.fit_detailed(points).map(|outcome| outcome.fit)
    }

    pub fn fit_detailed(&self, points: &LanePointSet) -> Option<FitOutcome> {
        if points.len() < self.options.min_points {
            return None;
        }
        let (ys, xs) = points.regression_data();
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let Some(model) = ransac_fit(&ys, &xs, &self.options.ransac, &mut rng) else {
            debug!(
                "RobustFitter::fit no consensus over {} points",
                points.len()
            );
            return None;
        };

        let predicted: Vec<f64> = ys
            .iter()
            .map(|&y| polyval(&model.coefficients, y))
            .collect();
        let coefficients = polyfit(&ys, &predicted, self.options.degree)?;
        debug!(
            "RobustFitter::fit points={} inliers={} threshold={:.3} trials={}",
            points.len(),
            model.inliers.len(),
            model.threshold,
            model.trials
        );
        Some(FitOutcome {
            fit: PolynomialFit::new(coefficients),
            inliers: model.inliers.len(),
            threshold: model.threshold,
            trials: model.trials,
        })
    }
}
