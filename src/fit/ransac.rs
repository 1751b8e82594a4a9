//! RANSAC consensus for polynomial models `x = g(y)`.
//!
//! Minimal samples of `model_degree + 1` points with distinct rows propose a
//! model; points whose absolute residual is within the threshold are its
//! inliers. The best proposal (most inliers, then lowest inlier residual sum)
//! is re-estimated by least squares over its inliers. Without an explicit
//! threshold the median absolute deviation of `x` is used, so the band adapts
//! to how spread the point set is.
use super::polyfit::{polyfit, polyval};
use rand::seq::index;
use rand::Rng;
use serde::Deserialize;

/// Floor under the residual threshold so exact fits survive rounding.
const MIN_THRESHOLD: f64 = 1e-6;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RansacOptions {
    /// Degree of the consensus model (1 = straight line).
    pub model_degree: usize,
    /// Inlier band in pixels; `None` selects the MAD of the samples.
    pub residual_threshold: Option<f64>,
    pub max_trials: usize,
    /// Desired probability of drawing at least one outlier-free sample;
    /// shortens the search once a good consensus is found.
    pub stop_probability: f64,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            model_degree: 1,
            residual_threshold: None,
            max_trials: 100,
            stop_probability: 0.99,
        }
    }
}

/// Winning consensus model.
#[derive(Clone, Debug)]
pub struct RansacModel {
    pub coefficients: Vec<f64>,
    pub inliers: Vec<usize>,
    pub threshold: f64,
    pub trials: usize,
}

/// Run RANSAC over paired samples. `None` when there are too few points or
/// every drawn sample was degenerate.
pub fn ransac_fit<R: Rng + ?Sized>(
    ys: &[f64],
    xs: &[f64],
    options: &RansacOptions,
    rng: &mut R,
) -> Option<RansacModel> {
    let n = ys.len();
    let min_samples = options.model_degree + 1;
    if n != xs.len() || n < min_samples {
        return None;
    }

    let threshold = options
        .residual_threshold
        .unwrap_or_else(|| median_absolute_deviation(xs))
        .max(MIN_THRESHOLD);

    let mut best: Option<(Vec<f64>, Vec<usize>, f64)> = None;
    let mut trial_budget = options.max_trials;
    let mut trials = 0usize;
    let mut sample_y = Vec::with_capacity(min_samples);
    let mut sample_x = Vec::with_capacity(min_samples);

    while trials < trial_budget {
        trials += 1;
        let sample = index::sample(rng, n, min_samples);
        sample_y.clear();
        sample_x.clear();
        for i in sample.iter() {
            sample_y.push(ys[i]);
            sample_x.push(xs[i]);
        }
        if has_repeated_rows(&sample_y) {
            continue;
        }
        let Some(coeffs) = polyfit(&sample_y, &sample_x, options.model_degree) else {
            continue;
        };

        let mut inliers = Vec::new();
        let mut residual_sum = 0.0;
        for i in 0..n {
            let r = (xs[i] - polyval(&coeffs, ys[i])).abs();
            if r <= threshold {
                inliers.push(i);
                residual_sum += r;
            }
        }
        if inliers.is_empty() {
            continue;
        }

        let better = match &best {
            None => true,
            Some((_, best_inliers, best_sum)) => {
                inliers.len() > best_inliers.len()
                    || (inliers.len() == best_inliers.len() && residual_sum < *best_sum)
            }
        };
        if better {
            let support = inliers.len();
            best = Some((coeffs, inliers, residual_sum));
            if support == n {
                break;
            }
            trial_budget = trial_budget.min(dynamic_max_trials(
                support,
                n,
                min_samples,
                options.stop_probability,
            ));
        }
    }

    let (sample_coeffs, inliers, _) = best?;
    let (in_y, in_x): (Vec<f64>, Vec<f64>) = inliers.iter().map(|&i| (ys[i], xs[i])).unzip();
    let coefficients = polyfit(&in_y, &in_x, options.model_degree).unwrap_or(sample_coeffs);
    Some(RansacModel {
        coefficients,
        inliers,
        threshold,
        trials,
    })
}

/// Median of `|v - median(v)|`.
pub fn median_absolute_deviation(values: &[f64]) -> f64 {
    let Some(center) = median(values) else {
        return 0.0;
    };
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations).unwrap_or(0.0)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

fn has_repeated_rows(ys: &[f64]) -> bool {
    ys.iter()
        .enumerate()
        .any(|(i, a)| ys[i + 1..].iter().any(|b| a == b))
}

/// Trials needed to draw an all-inlier sample with `probability`, given the
/// current inlier ratio.
fn dynamic_max_trials(
    n_inliers: usize,
    n_samples: usize,
    min_samples: usize,
    probability: f64,
) -> usize {
    let inlier_ratio = n_inliers as f64 / n_samples as f64;
    let nom = 1.0 - probability;
    let denom = 1.0 - inlier_ratio.powi(min_samples as i32);
    if nom <= 0.0 || denom >= 1.0 {
        return usize::MAX;
    }
    if denom <= 0.0 {
        return 1;
    }
    (nom.ln() / denom.ln()).ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mad_of_known_values() {
        assert_eq!(median_absolute_deviation(&[1.0, 2.0, 3.0, 4.0, 100.0]), 1.0);
        assert_eq!(median_absolute_deviation(&[5.0; 8]), 0.0);
        assert_eq!(median_absolute_deviation(&[]), 0.0);
    }

    #[test]
    fn ignores_gross_outliers() {
        // x = 0.5 y + 40 with every fifth point thrown 80 px off.
        let ys: Vec<f64> = (0..200).map(f64::from).collect();
        let xs: Vec<f64> = ys
            .iter()
            .enumerate()
            .map(|(i, &y)| 0.5 * y + 40.0 + if i % 5 == 0 { 80.0 } else { 0.0 })
            .collect();
        let opts = RansacOptions {
            residual_threshold: Some(2.0),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let model = ransac_fit(&ys, &xs, &opts, &mut rng).expect("model");
        assert!((model.coefficients[0] - 0.5).abs() < 1e-9);
        assert!((model.coefficients[1] - 40.0).abs() < 1e-6);
        assert_eq!(model.inliers.len(), 160);
    }

    #[test]
    fn degenerate_rows_yield_no_model() {
        let ys = vec![10.0; 20];
        let xs: Vec<f64> = (0..20).map(f64::from).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(ransac_fit(&ys, &xs, &RansacOptions::default(), &mut rng).is_none());
    }

    #[test]
    fn dynamic_trials_shrink_with_inlier_ratio() {
        assert_eq!(dynamic_max_trials(100, 100, 2, 0.99), 1);
        let half = dynamic_max_trials(50, 100, 2, 0.99);
        let most = dynamic_max_trials(90, 100, 2, 0.99);
        assert!(most < half, "most={most} half={half}");
        assert_eq!(half, 17);
    }
}
