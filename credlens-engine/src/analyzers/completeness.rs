//! Completeness: does the explanation cover the features that actually
//! drove the decision?
//!
//! Restricts the ranking to features whose absolute importance clears a
//! threshold, partitions them into positive and negative drivers, and
//! measures the mentioned fraction of each partition. Both partitions weigh
//! equally unless one is empty.

use crate::analyzers::{Dimension, DimensionScore};
use crate::ranking::{FeatureRanking, RankedFeature};
use crate::text::mentions::MentionScanner;

fn mentioned_fraction(
    features: &[&RankedFeature],
    text: &str,
    scanner: &MentionScanner,
) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let mentioned = features
        .iter()
        .filter(|f| scanner.mentions_attribute(text, f.attribute()))
        .count();
    mentioned as f64 / features.len() as f64
}

pub fn analyze(
    text: &str,
    ranking: &FeatureRanking,
    importance_threshold: f64,
    scanner: &MentionScanner,
) -> DimensionScore {
    if ranking.is_empty() {
        return DimensionScore::new(Dimension::Completeness, 0.0).with_flag("no_ranking");
    }

    let (positive, negative) = ranking.important_drivers(importance_threshold);
    if positive.is_empty() && negative.is_empty() {
        // Nothing cleared the importance bar; there is nothing the text was
        // obliged to cover.
        return DimensionScore::new(Dimension::Completeness, 1.0)
            .with_flag("no_important_features");
    }

    let positive_fraction = mentioned_fraction(&positive, text, scanner);
    let negative_fraction = mentioned_fraction(&negative, text, scanner);

    let value = match (positive.is_empty(), negative.is_empty()) {
        (false, false) => 0.5 * positive_fraction + 0.5 * negative_fraction,
        (false, true) => positive_fraction,
        (true, false) => negative_fraction,
        (true, true) => unreachable!("handled above"),
    };

    let mut score = DimensionScore::new(Dimension::Completeness, value);
    if !positive.is_empty() && positive_fraction < 0.5 {
        score = score.with_flag("missing_positives");
    }
    if !negative.is_empty() && negative_fraction < 0.5 {
        score = score.with_flag("missing_negatives");
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surrogate::SurrogateModel;
    use std::collections::BTreeMap;

    fn ranking(coefs: &[(&str, f64)]) -> FeatureRanking {
        let model = SurrogateModel {
            coefficients: coefs
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
            intercept: 50.0,
            fit_quality: 0.9,
            sample_count: 100,
            dropped_columns: Vec::new(),
        };
        FeatureRanking::from_model(&model, 10)
    }

    #[test]
    fn test_full_coverage() {
        let ranking = ranking(&[("income", 0.5), ("payment_defaults", -0.7)]);
        let text = "Your income is strong but payment defaults count against you.";
        let score = analyze(text, &ranking, 0.1, &MentionScanner::new());
        assert!((score.value - 1.0).abs() < 1e-9);
        assert!(score.flags.is_empty());
    }

    #[test]
    fn test_one_partition_missing() {
        let ranking = ranking(&[("income", 0.5), ("payment_defaults", -0.7)]);
        let text = "Your income is strong.";
        let score = analyze(text, &ranking, 0.1, &MentionScanner::new());
        assert!((score.value - 0.5).abs() < 1e-9);
        assert!(score.has_flag("missing_negatives"));
        assert!(!score.has_flag("missing_positives"));
    }

    #[test]
    fn test_nothing_mentioned_scores_near_zero() {
        let ranking = ranking(&[("income", 0.5), ("payment_defaults", -0.7)]);
        let score = analyze("Thank you for applying.", &ranking, 0.1, &MentionScanner::new());
        assert_eq!(score.value, 0.0);
        assert!(score.has_flag("missing_positives"));
        assert!(score.has_flag("missing_negatives"));
    }

    #[test]
    fn test_only_positive_partition() {
        let ranking = ranking(&[("income", 0.5), ("credit_limit", 0.3)]);
        let text = "Your income looks fine.";
        let score = analyze(text, &ranking, 0.1, &MentionScanner::new());
        assert!((score.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_important_features_is_vacuously_complete() {
        let ranking = ranking(&[("income", 0.01), ("household_size", -0.02)]);
        let score = analyze("Anything.", &ranking, 0.1, &MentionScanner::new());
        assert_eq!(score.value, 1.0);
        assert!(score.has_flag("no_important_features"));
    }

    #[test]
    fn test_empty_ranking() {
        let score = analyze("Anything.", &ranking(&[]), 0.1, &MentionScanner::new());
        assert_eq!(score.value, 0.0);
        assert!(score.has_flag("no_ranking"));
    }
}
