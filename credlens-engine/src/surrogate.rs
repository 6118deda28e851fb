//! Weighted local surrogate fitting.
//!
//! Fits a weighted least-squares linear model of observed scores on encoded
//! profile features, using each sample's kernel weight as the regression
//! weight. Numeric attributes pass through directly; categorical attributes
//! are one-hot encoded over the category universe observed in the sample
//! set. Degenerate (collinear) columns are dropped and recorded rather than
//! raised, so ill-conditioned fits surface as `fit_quality` degradation.
//!
//! The normal equations are symmetric sums over samples, so the fitted model
//! is independent of sample order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use credlens_core::config::SurrogateConfig;
use credlens_core::error::SurrogateError;
use credlens_core::profile::AttributeValue;

use crate::sampler::PerturbedSample;

/// A perturbed sample together with the score observed for it.
///
/// Samples whose scoring call failed never become `ScoredSample`s; they are
/// dropped before fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSample {
    pub sample: PerturbedSample,
    pub score: f64,
}

/// The fitted local surrogate: an interpretable linear approximation of the
/// black-box scoring function around one reference profile.
///
/// Owned exclusively by one explanation run; never shared or cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateModel {
    /// Coefficient per encoded feature column. Categorical columns are
    /// named `attribute=category`.
    pub coefficients: BTreeMap<String, f64>,
    pub intercept: f64,
    /// Weighted R-squared against the fitting sample set, clamped to [0, 1].
    /// An explicit, auditable confidence signal for the caller.
    pub fit_quality: f64,
    pub sample_count: usize,
    /// Columns dropped during fitting because they were collinear or
    /// constant. Reported, never raised.
    pub dropped_columns: Vec<String>,
}

impl SurrogateModel {
    /// Predict the score for one encoded feature vector.
    pub fn predict(&self, features: &BTreeMap<String, f64>) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .map(|(name, coef)| coef * features.get(name).copied().unwrap_or(0.0))
                .sum::<f64>()
    }

    /// The attribute a column belongs to (strips any `=category` suffix).
    pub fn column_attribute(column: &str) -> &str {
        column.split('=').next().unwrap_or(column)
    }
}

/// Fit the weighted surrogate over a set of scored samples.
///
/// Fails with `InsufficientSamples` when fewer than `config.min_samples`
/// samples are provided; the engine performs the authoritative check with
/// the true attempted count, this one guards direct callers.
pub fn fit(
    samples: &[ScoredSample],
    config: &SurrogateConfig,
) -> Result<SurrogateModel, SurrogateError> {
    if samples.len() < config.min_samples {
        return Err(SurrogateError::InsufficientSamples {
            succeeded: samples.len(),
            attempted: samples.len(),
            needed: config.min_samples,
        });
    }

    let columns = encode_columns(samples);
    let rows: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| encode_row(s, &columns))
        .collect();
    let targets: Vec<f64> = samples.iter().map(|s| s.score).collect();
    let weights: Vec<f64> = samples
        .iter()
        .map(|s| s.sample.similarity_weight)
        .collect();

    // Active set starts with every column; degenerate columns fall out one
    // at a time until the normal equations are solvable.
    let mut active: Vec<usize> = (0..columns.len()).collect();
    let mut dropped: Vec<String> = Vec::new();
    let solution = loop {
        match solve_normal_equations(&rows, &targets, &weights, &active) {
            Ok(solution) => break solution,
            Err(0) => {
                // Intercept pivot vanished: the total weight mass is zero.
                // There is nothing to fit; report it as zero fit quality.
                return Ok(SurrogateModel {
                    coefficients: BTreeMap::new(),
                    intercept: 0.0,
                    fit_quality: 0.0,
                    sample_count: samples.len(),
                    dropped_columns: columns,
                });
            }
            Err(local_idx) => {
                // local_idx is in intercept-first coordinates; offset by one
                // to find the encoded column.
                let col = active.remove(local_idx - 1);
                debug!(column = %columns[col], "Dropping collinear surrogate column");
                dropped.push(columns[col].clone());
            }
        }
    };

    let intercept = solution[0];
    let mut coefficients = BTreeMap::new();
    for (slot, &col) in active.iter().enumerate() {
        coefficients.insert(columns[col].clone(), solution[slot + 1]);
    }

    let fit_quality = weighted_r_squared(&rows, &targets, &weights, &active, &solution);

    Ok(SurrogateModel {
        coefficients,
        intercept,
        fit_quality,
        sample_count: samples.len(),
        dropped_columns: dropped,
    })
}

/// The ordered encoded column names for a sample set: numeric attributes by
/// name, then one categorical column per (attribute, observed category).
fn encode_columns(samples: &[ScoredSample]) -> Vec<String> {
    let mut numeric = BTreeSet::new();
    let mut categorical = BTreeSet::new();
    for s in samples {
        for (name, value) in s.sample.profile.attributes() {
            match value {
                AttributeValue::Numeric(_) => {
                    numeric.insert(name.clone());
                }
                AttributeValue::Categorical(cat) => {
                    categorical.insert(format!("{name}={cat}"));
                }
                AttributeValue::Text(_) => {}
            }
        }
    }
    numeric.into_iter().chain(categorical).collect()
}

/// Encode one sample into the full column space.
fn encode_row(sample: &ScoredSample, columns: &[String]) -> Vec<f64> {
    columns
        .iter()
        .map(|col| match col.split_once('=') {
            Some((attr, cat)) => {
                match sample.sample.profile.get(attr).and_then(|v| v.as_categorical()) {
                    Some(actual) if actual == cat => 1.0,
                    _ => 0.0,
                }
            }
            None => sample
                .sample
                .profile
                .get(col)
                .and_then(|v| v.as_numeric())
                .unwrap_or(0.0),
        })
        .collect()
}

/// Solve the weighted normal equations over the active columns (plus an
/// implicit leading intercept column).
///
/// Returns the solution vector `[intercept, coef_0, ...]`, or the local
/// index of a degenerate pivot column on near-singularity.
fn solve_normal_equations(
    rows: &[Vec<f64>],
    targets: &[f64],
    weights: &[f64],
    active: &[usize],
) -> Result<Vec<f64>, usize> {
    let p = active.len() + 1;
    let mut a = vec![vec![0.0f64; p]; p];
    let mut b = vec![0.0f64; p];

    for ((row, &y), &w) in rows.iter().zip(targets).zip(weights) {
        let x = design_vector(row, active);
        for i in 0..p {
            b[i] += w * x[i] * y;
            for j in i..p {
                a[i][j] += w * x[i] * x[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            a[i][j] = a[j][i];
        }
    }

    gaussian_solve(a, b)
}

fn design_vector(row: &[f64], active: &[usize]) -> Vec<f64> {
    std::iter::once(1.0)
        .chain(active.iter().map(|&c| row[c]))
        .collect()
}

/// Gaussian elimination with partial pivoting.
///
/// Returns the column index of the first near-zero pivot instead of a
/// garbage solution, letting the caller drop that column and refit. The
/// degeneracy tolerance is relative to each column's own initial diagonal
/// magnitude: feature columns live on wildly different scales (dollars next
/// to ratios), so a global threshold would misclassify small-scale columns
/// as collinear.
fn gaussian_solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, usize> {
    let n = b.len();
    let diag0: Vec<f64> = (0..n).map(|i| a[i][i].abs()).collect();

    for k in 0..n {
        let pivot_row = (k..n)
            .max_by(|&i, &j| {
                a[i][k]
                    .abs()
                    .partial_cmp(&a[j][k].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(k);
        let tol = 1e-9 * diag0[k].max(f64::MIN_POSITIVE);
        if a[pivot_row][k].abs() < tol {
            return Err(k);
        }
        a.swap(k, pivot_row);
        b.swap(k, pivot_row);

        for i in (k + 1)..n {
            let factor = a[i][k] / a[k][k];
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                a[i][j] -= factor * a[k][j];
            }
            b[i] -= factor * b[k];
        }
    }

    let mut x = vec![0.0f64; n];
    for k in (0..n).rev() {
        let sum: f64 = ((k + 1)..n).map(|j| a[k][j] * x[j]).sum();
        x[k] = (b[k] - sum) / a[k][k];
    }
    Ok(x)
}

/// Weighted R-squared of the solution against the fitting set, clamped to
/// [0, 1]. A constant target with zero residual is a perfect fit.
fn weighted_r_squared(
    rows: &[Vec<f64>],
    targets: &[f64],
    weights: &[f64],
    active: &[usize],
    solution: &[f64],
) -> f64 {
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let mean: f64 = targets
        .iter()
        .zip(weights)
        .map(|(y, w)| w * y)
        .sum::<f64>()
        / weight_sum;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for ((row, &y), &w) in rows.iter().zip(targets).zip(weights) {
        let x = design_vector(row, active);
        let predicted: f64 = x.iter().zip(solution).map(|(xi, ci)| xi * ci).sum();
        ss_res += w * (y - predicted) * (y - predicted);
        ss_tot += w * (y - mean) * (y - mean);
    }

    if ss_tot < f64::EPSILON {
        return if ss_res < f64::EPSILON { 1.0 } else { 0.0 };
    }
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credlens_core::profile::Profile;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn sample_from(income: f64, defaults: f64, housing: &str, score: f64) -> ScoredSample {
        ScoredSample {
            sample: PerturbedSample {
                profile: Profile::builder()
                    .attribute("income", income)
                    .attribute("payment_defaults", defaults)
                    .attribute("housing_status", housing)
                    .build(),
                similarity_weight: 1.0,
            },
            score,
        }
    }

    /// Samples scored by an exact linear rule, which the fit must recover.
    fn linear_samples(n: usize, noise_std: f64, seed: u64) -> Vec<ScoredSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, noise_std.max(f64::MIN_POSITIVE)).unwrap();
        (0..n)
            .map(|_| {
                let income = rng.gen_range(20_000.0..150_000.0);
                let defaults = rng.gen_range(0.0..5.0f64).floor();
                let housing = if rng.gen_bool(0.5) { "owner" } else { "rent" };
                let owner_bonus = if housing == "owner" { 5.0 } else { 0.0 };
                let score = 20.0 + income * 0.0004 - defaults * 8.0 + owner_bonus
                    + if noise_std > 0.0 { noise.sample(&mut rng) } else { 0.0 };
                sample_from(income, defaults, housing, score)
            })
            .collect()
    }

    #[test]
    fn test_recovers_linear_coefficients() {
        let model = fit(&linear_samples(200, 0.0, 11), &SurrogateConfig::default()).unwrap();
        assert!(model.fit_quality > 0.999);
        let income_coef = model.coefficients["income"];
        assert!((income_coef - 0.0004).abs() < 5e-5, "got {income_coef}");
        let defaults_coef = model.coefficients["payment_defaults"];
        assert!((defaults_coef + 8.0).abs() < 0.05, "got {defaults_coef}");
    }

    #[test]
    fn test_fit_quality_in_unit_interval() {
        for noise in [0.0, 1.0, 10.0, 100.0] {
            let model = fit(&linear_samples(100, noise, 3), &SurrogateConfig::default()).unwrap();
            assert!((0.0..=1.0).contains(&model.fit_quality), "noise {noise}");
        }
    }

    #[test]
    fn test_fit_quality_degrades_with_label_noise() {
        let clean = fit(&linear_samples(200, 0.5, 5), &SurrogateConfig::default()).unwrap();
        let noisy = fit(&linear_samples(200, 25.0, 5), &SurrogateConfig::default()).unwrap();
        assert!(noisy.fit_quality <= clean.fit_quality);
    }

    #[test]
    fn test_insufficient_samples_rejected() {
        let samples = linear_samples(9, 0.0, 1);
        let err = fit(&samples, &SurrogateConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SurrogateError::InsufficientSamples { succeeded: 9, needed: 10, .. }
        ));
    }

    #[test]
    fn test_order_independence() {
        let mut samples = linear_samples(120, 2.0, 8);
        let forward = fit(&samples, &SurrogateConfig::default()).unwrap();
        samples.reverse();
        let reversed = fit(&samples, &SurrogateConfig::default()).unwrap();
        assert!((forward.intercept - reversed.intercept).abs() < 1e-4);
        for (name, coef) in &forward.coefficients {
            assert!((coef - reversed.coefficients[name]).abs() < 1e-4, "{name}");
        }
    }

    #[test]
    fn test_collinear_one_hot_column_dropped_not_raised() {
        // Full one-hot over a two-category attribute is collinear with the
        // intercept; the fit must drop a column and still succeed.
        let model = fit(&linear_samples(100, 0.0, 13), &SurrogateConfig::default()).unwrap();
        assert!(!model.dropped_columns.is_empty());
        assert!(model.fit_quality > 0.99);
    }

    #[test]
    fn test_constant_column_dropped() {
        let samples: Vec<ScoredSample> = (0..30)
            .map(|i| sample_from(50_000.0, i as f64 % 3.0, "rent", 60.0 - (i % 3) as f64))
            .collect();
        let model = fit(&samples, &SurrogateConfig::default()).unwrap();
        // income never varies and housing only has one observed category.
        assert!(model.dropped_columns.iter().any(|c| c == "income"));
    }

    #[test]
    fn test_predict_matches_training_scores() {
        let samples = linear_samples(150, 0.0, 21);
        let model = fit(&samples, &SurrogateConfig::default()).unwrap();
        for s in samples.iter().take(10) {
            let features: BTreeMap<String, f64> = model
                .coefficients
                .keys()
                .map(|col| {
                    let value = match col.split_once('=') {
                        Some((attr, cat)) => {
                            match s.sample.profile.get(attr).and_then(|v| v.as_categorical()) {
                                Some(actual) if actual == cat => 1.0,
                                _ => 0.0,
                            }
                        }
                        None => s
                            .sample
                            .profile
                            .get(col)
                            .and_then(|v| v.as_numeric())
                            .unwrap_or(0.0),
                    };
                    (col.clone(), value)
                })
                .collect();
            assert!((model.predict(&features) - s.score).abs() < 1e-3);
        }
    }
}
