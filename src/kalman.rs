//! Constant-velocity Kalman smoothing of polynomial coefficients.
//!
//! One [`PolynomialKalman`] per lane side. The state stacks the `n = degree
//! + 1` coefficients on top of their per-frame velocities (`2n` entries);
//! only the coefficient block is measured.
//!
//! Transitions of `update`:
//!
//! | state          | measurement | effect                                     |
//! |----------------|-------------|--------------------------------------------|
//! | uninitialized  | absent      | nothing, returns `None`                    |
//! | uninitialized  | present     | adopt it, zero velocity, `P = p0·I`        |
//! | tracking       | absent      | coast: return the held estimate            |
//! | tracking       | present     | predict, then correct the coefficients     |
//!
//! The velocity has no measurement and is carried through the correction
//! unchanged. A gain whose innovation covariance cannot be factored falls
//! back to the predicted estimate and logs a warning.
use crate::error::{LaneError, Result};
use crate::types::PolynomialFit;
use log::warn;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// What a tracking filter reports when a frame has no measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoastPolicy {
    /// Return the last estimate verbatim; the state is not touched.
    #[default]
    Hold,
    /// Run the predict step (coefficients advance by their velocity).
    Extrapolate,
}

/// Covariance bookkeeping after a correction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceUpdate {
    /// Keep the predicted covariance; the gain approaches one as it grows.
    #[default]
    Hold,
    /// Joseph-form correction of the coefficient block and cross terms.
    Joseph,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct KalmanOptions {
    /// Diagonal of the process noise `Q` (all `2n` state entries).
    pub process_noise: f64,
    /// Diagonal of the measurement noise `R`.
    pub measurement_noise: f64,
    /// Diagonal of the covariance a track starts with.
    pub initial_covariance: f64,
    pub coast: CoastPolicy,
    pub covariance_update: CovarianceUpdate,
}

impl Default for KalmanOptions {
    fn default() -> Self {
        Self {
            process_noise: 1e-3,
            measurement_noise: 1e-2,
            initial_covariance: 1.0,
            coast: CoastPolicy::Hold,
            covariance_update: CovarianceUpdate::Hold,
        }
    }
}

impl KalmanOptions {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("kalman.process_noise", self.process_noise),
            ("kalman.measurement_noise", self.measurement_noise),
            ("kalman.initial_covariance", self.initial_covariance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LaneError::invalid(
                    name,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Estimate held by a tracking filter.
#[derive(Clone, Debug, PartialEq)]
pub struct KalmanLaneState {
    pub coefficients: DVector<f64>,
    pub velocity: DVector<f64>,
    /// `2n × 2n`, coefficient block first.
    pub covariance: DMatrix<f64>,
}

impl KalmanLaneState {
    fn initial(z: DVector<f64>, initial_covariance: f64) -> Self {
        let n = z.len();
        Self {
            velocity: DVector::zeros(n),
            covariance: DMatrix::identity(2 * n, 2 * n) * initial_covariance,
            coefficients: z,
        }
    }

    fn predict(&mut self, q: &DMatrix<f64>) {
        self.coefficients += &self.velocity;
        self.covariance += q;
    }

    pub fn fit(&self) -> PolynomialFit {
        PolynomialFit::new(self.coefficients.iter().copied().collect())
    }
}

/// Per-lane coefficient smoother.
#[derive(Clone, Debug)]
pub struct PolynomialKalman {
    degree: usize,
    options: KalmanOptions,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    state: Option<KalmanLaneState>,
}

impl PolynomialKalman {
    pub fn new(degree: usize, options: KalmanOptions) -> Result<Self> {
        if degree < 1 {
            return Err(LaneError::invalid("fit.degree", "must be at least 1"));
        }
        options.validate()?;
        let n = degree + 1;
        Ok(Self {
            degree,
            q: DMatrix::identity(2 * n, 2 * n) * options.process_noise,
            r: DMatrix::identity(n, n) * options.measurement_noise,
            options,
            state: None,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn is_tracking(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&KalmanLaneState> {
        self.state.as_ref()
    }

    /// Current estimate without advancing the filter.
    pub fn estimate(&self) -> Option<PolynomialFit> {
        self.state.as_ref().map(KalmanLaneState::fit)
    }

    /// Drop the track; the next measurement starts a new one.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Feed one frame's measurement (or its absence) and return the smoothed
    /// coefficients.
    pub fn update(&mut self, measurement: Option<&PolynomialFit>) -> Option<PolynomialFit> {
        let z = measurement.and_then(|fit| self.accept(fit));
        let state = match (self.state.take(), z) {
            (None, None) => return None,
            (None, Some(z)) => KalmanLaneState::initial(z, self.options.initial_covariance),
            (Some(mut state), None) => {
                if self.options.coast == CoastPolicy::Extrapolate {
                    state.predict(&self.q);
                }
                state
            }
            (Some(mut state), Some(z)) => {
                state.predict(&self.q);
                self.correct(&mut state, &z);
                state
            }
        };
        let out = state.fit();
        self.state = Some(state);
        Some(out)
    }

    fn accept(&self, fit: &PolynomialFit) -> Option<DVector<f64>> {
        let n = self.degree + 1;
        if fit.coefficients().len() != n {
            warn!(
                "PolynomialKalman::update expected {} coefficients, got {}; treating as missing",
                n,
                fit.coefficients().len()
            );
            return None;
        }
        if !fit.is_finite() {
            warn!("PolynomialKalman::update non-finite measurement; treating as missing");
            return None;
        }
        Some(DVector::from_column_slice(fit.coefficients()))
    }

    /// Measurement update on a predicted state. Leaves the prediction in place
    /// when the innovation covariance is not positive definite.
    fn correct(&self, state: &mut KalmanLaneState, z: &DVector<f64>) {
        let n = self.degree + 1;
        let p_pp = state.covariance.view((0, 0), (n, n)).clone_owned();
        let innovation_cov = &p_pp + &self.r;
        let Some(s_inv) = innovation_cov.cholesky().map(|c| c.inverse()) else {
            warn!("PolynomialKalman::update innovation covariance is singular; keeping prediction");
            return;
        };
        let gain = &p_pp * s_inv;
        if gain.iter().any(|g| !g.is_finite()) {
            warn!("PolynomialKalman::update gain is not finite; keeping prediction");
            return;
        }

        let innovation = z - &state.coefficients;
        state.coefficients += &gain * innovation;

        if self.options.covariance_update == CovarianceUpdate::Joseph {
            // Full-state gain with a zero velocity block.
            let mut k = DMatrix::zeros(2 * n, n);
            k.view_mut((0, 0), (n, n)).copy_from(&gain);
            let mut i_kh = DMatrix::identity(2 * n, 2 * n);
            {
                let mut measured = i_kh.view_mut((0, 0), (2 * n, n));
                measured -= &k;
            }
            let p = &i_kh * &state.covariance * i_kh.transpose() + &k * &self.r * k.transpose();
            state.covariance = (&p + p.transpose()) * 0.5;
        }
    }
}
