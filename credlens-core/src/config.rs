//! Configuration types for an explanation-quality assessment run.
//!
//! All knobs are plain serde structs with field-level defaults; a config is
//! constructed by the caller and passed into the engine entry point. There is
//! no ambient global configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for one assessment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Perturbation sampling configuration.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Local surrogate fit configuration.
    #[serde(default)]
    pub surrogate: SurrogateConfig,
    /// Text-analysis configuration.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Perturbation sampling and scoring-sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Number of perturbed samples to draw per run.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// Lower bound of the per-draw noise scale, as a fraction of the
    /// attribute magnitude.
    #[serde(default = "default_noise_scale_min")]
    pub noise_scale_min: f64,
    /// Upper bound of the per-draw noise scale.
    #[serde(default = "default_noise_scale_max")]
    pub noise_scale_max: f64,
    /// Probability that a categorical attribute flips to another category.
    #[serde(default = "default_flip_probability")]
    pub flip_probability: f64,
    /// Bandwidth of the exponential similarity kernel.
    #[serde(default = "default_kernel_bandwidth")]
    pub kernel_bandwidth: f64,
    /// Maximum concurrent scoring calls during the sweep. Modest by default
    /// to respect collaborator rate limits.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Overall deadline for the scoring sweep, in seconds. On deadline the
    /// run proceeds with whatever valid samples were collected.
    #[serde(default = "default_run_deadline_secs")]
    pub run_deadline_secs: u64,
    /// Random seed. With a seed, sampling is reproducible run to run;
    /// without one the sampler is entropy-seeded and results vary. That
    /// variation is a documented non-guarantee, not a defect.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            noise_scale_min: default_noise_scale_min(),
            noise_scale_max: default_noise_scale_max(),
            flip_probability: default_flip_probability(),
            kernel_bandwidth: default_kernel_bandwidth(),
            concurrency: default_concurrency(),
            run_deadline_secs: default_run_deadline_secs(),
            seed: None,
        }
    }
}

fn default_sample_count() -> usize {
    500
}

fn default_noise_scale_min() -> f64 {
    0.05
}

fn default_noise_scale_max() -> f64 {
    0.15
}

fn default_flip_probability() -> f64 {
    0.30
}

fn default_kernel_bandwidth() -> f64 {
    0.75
}

fn default_concurrency() -> usize {
    8
}

fn default_run_deadline_secs() -> u64 {
    120
}

/// Local surrogate fit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateConfig {
    /// Minimum scored samples required after dropping failed scoring calls.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// R-squared below this floor flags the run as `low_fidelity`.
    #[serde(default = "default_fidelity_floor")]
    pub fidelity_floor: f64,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            fidelity_floor: default_fidelity_floor(),
        }
    }
}

fn default_min_samples() -> usize {
    10
}

fn default_fidelity_floor() -> f64 {
    0.5
}

/// Text-analysis configuration shared by the eight analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of top-ranked surrogate features the analyzers consider.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum absolute importance for a feature to count as important in
    /// the completeness analysis.
    #[serde(default = "default_importance_threshold")]
    pub importance_threshold: f64,
    /// Number of repeated scoring calls used for the consistency analysis.
    #[serde(default = "default_repeat_calls")]
    pub repeat_calls: usize,
    /// Features probed by the counterfactual analysis.
    #[serde(default = "default_counterfactual_features")]
    pub counterfactual_features: Vec<String>,
    /// Relative shift applied to numeric counterfactual probes (+20%).
    #[serde(default = "default_counterfactual_shift")]
    pub counterfactual_shift: f64,
    /// Score movement (in points on the 0-100 scale) above which a
    /// counterfactual probe counts as high impact.
    #[serde(default = "default_impact_threshold")]
    pub impact_threshold: f64,
    /// Relative tolerance for numeric claim verification.
    #[serde(default = "default_value_tolerance")]
    pub value_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            importance_threshold: default_importance_threshold(),
            repeat_calls: default_repeat_calls(),
            counterfactual_features: default_counterfactual_features(),
            counterfactual_shift: default_counterfactual_shift(),
            impact_threshold: default_impact_threshold(),
            value_tolerance: default_value_tolerance(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_importance_threshold() -> f64 {
    0.1
}

fn default_repeat_calls() -> usize {
    5
}

fn default_counterfactual_features() -> Vec<String> {
    vec![
        "income".to_string(),
        "credit_utilization".to_string(),
        "employment_status".to_string(),
    ]
}

fn default_counterfactual_shift() -> f64 {
    0.20
}

fn default_impact_threshold() -> f64 {
    10.0
}

fn default_value_tolerance() -> f64 {
    0.10
}

/// Scoring gateway connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the scoring service.
    pub base_url: String,
    /// Basic-auth username.
    #[serde(default)]
    pub username: String,
    /// Basic-auth password.
    #[serde(default)]
    pub password: String,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Requests-per-minute ceiling enforced client-side (0 = unlimited).
    #[serde(default)]
    pub requests_per_minute: usize,
    /// Minimum spacing between consecutive requests in milliseconds
    /// (0 = no spacing).
    #[serde(default)]
    pub min_interval_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
            requests_per_minute: 0,
            min_interval_ms: 0,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_assessment_config() {
        let config = AssessmentConfig::default();
        assert_eq!(config.sampling.sample_count, 500);
        assert_eq!(config.sampling.kernel_bandwidth, 0.75);
        assert_eq!(config.sampling.flip_probability, 0.30);
        assert_eq!(config.surrogate.min_samples, 10);
        assert_eq!(config.analysis.top_k, 10);
        assert_eq!(config.analysis.repeat_calls, 5);
        assert!(config.sampling.seed.is_none());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = AssessmentConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AssessmentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sampling.sample_count, config.sampling.sample_count);
        assert_eq!(parsed.analysis.top_k, config.analysis.top_k);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AssessmentConfig =
            serde_json::from_str(r#"{"sampling": {"sample_count": 50, "seed": 7}}"#).unwrap();
        assert_eq!(parsed.sampling.sample_count, 50);
        assert_eq!(parsed.sampling.seed, Some(7));
        assert_eq!(parsed.sampling.kernel_bandwidth, 0.75);
        assert_eq!(parsed.surrogate.min_samples, 10);
    }
}
