//! Counterfactual sensitivity: when changing a feature moves the score, does
//! the new explanation acknowledge that feature?
//!
//! Probe construction and re-scoring happen in the engine (they need the
//! gateway); this module builds the altered profiles and scores the
//! resulting observations as a pure function.

use serde::{Deserialize, Serialize};

use credlens_core::profile::{
    categorical_attribute, numeric_attribute, AttributeValue, Profile,
};

use crate::analyzers::{Dimension, DimensionScore};
use crate::text::mentions::MentionScanner;

/// The outcome of one counterfactual probe: the feature changed, the score
/// movement observed, and the explanation returned for the altered profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterfactualObservation {
    pub feature: String,
    pub baseline_score: f64,
    pub probe_score: f64,
    pub explanation: String,
}

impl CounterfactualObservation {
    pub fn score_shift(&self) -> f64 {
        (self.probe_score - self.baseline_score).abs()
    }
}

/// Build the meaningfully altered profile for one probe feature.
///
/// Numeric features shift by the configured fraction (+20% by default),
/// clamped to the schema range. Categorical features move to their defined
/// "more favorable" category. Returns `None` when the feature is absent,
/// unknown, or already at its favorable category.
pub fn build_probe(profile: &Profile, feature: &str, numeric_shift: f64) -> Option<Profile> {
    match profile.get(feature)? {
        AttributeValue::Numeric(v) => {
            let schema = numeric_attribute(feature)?;
            let shifted = schema.clamp(v * (1.0 + numeric_shift));
            if (shifted - v).abs() < f64::EPSILON {
                return None;
            }
            Some(profile.with_attribute(feature, AttributeValue::Numeric(shifted)))
        }
        AttributeValue::Categorical(current) => {
            let schema = categorical_attribute(feature)?;
            if current == schema.favorable {
                return None;
            }
            Some(profile.with_attribute(
                feature,
                AttributeValue::Categorical(schema.favorable.to_string()),
            ))
        }
        AttributeValue::Text(_) => None,
    }
}

pub fn analyze(
    observations: &[CounterfactualObservation],
    impact_threshold: f64,
    scanner: &MentionScanner,
) -> DimensionScore {
    if observations.is_empty() {
        return DimensionScore::new(Dimension::Counterfactual, 0.0)
            .with_flag("no_counterfactual_probes");
    }

    let high_impact: Vec<_> = observations
        .iter()
        .filter(|o| o.score_shift() > impact_threshold)
        .collect();

    if high_impact.is_empty() {
        // Every probe moved the score less than the threshold; there is
        // nothing the explanations were obliged to reflect.
        return DimensionScore::new(Dimension::Counterfactual, 1.0)
            .with_flag("no_high_impact_probes");
    }

    let reflected = high_impact
        .iter()
        .filter(|o| scanner.mentions_attribute(&o.explanation, &o.feature))
        .count();

    DimensionScore::new(
        Dimension::Counterfactual,
        reflected as f64 / high_impact.len() as f64,
    )
}
