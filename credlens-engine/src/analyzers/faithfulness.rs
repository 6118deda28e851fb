//! Faithfulness: are the explanation's factual claims true of the input?
//!
//! Extracts claims from the text, verifies each against the fact table, and
//! scores the supported fraction. An explanation with no extractable claims
//! is vacuously faithful; it scores 1.0 but is flagged for review. Any
//! contradicted or hallucinated claim raises a critical flag that the
//! aggregate scorer surfaces regardless of the numeric score.

use credlens_core::facts::FactTable;

use crate::analyzers::{Dimension, DimensionScore};
use crate::text::claims::{verify, Claim, ClaimExtractor, ClaimVerdict};

/// Per-verdict claim counts, kept for the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimTally {
    pub supported: usize,
    pub contradicted: usize,
    pub not_in_input: usize,
    pub hallucinated: usize,
}

impl ClaimTally {
    pub fn total(&self) -> usize {
        self.supported + self.contradicted + self.not_in_input + self.hallucinated
    }
}

pub fn analyze(
    text: &str,
    facts: &FactTable,
    extractor: &dyn ClaimExtractor,
    tolerance: f64,
) -> DimensionScore {
    let claims = extractor.extract(text);
    let mut tally = ClaimTally::default();
    let mut verdicts: Vec<(Claim, ClaimVerdict)> = Vec::with_capacity(claims.len());

    for claim in claims {
        let verdict = verify(&claim, facts, tolerance);
        match verdict {
            ClaimVerdict::Supported => tally.supported += 1,
            ClaimVerdict::Contradicted => tally.contradicted += 1,
            ClaimVerdict::NotInInput => tally.not_in_input += 1,
            ClaimVerdict::Hallucinated => tally.hallucinated += 1,
        }
        verdicts.push((claim, verdict));
    }

    if tally.total() == 0 {
        return DimensionScore::new(Dimension::Faithfulness, 1.0)
            .with_flag("vacuous_explanation");
    }

    let mut score = DimensionScore::new(
        Dimension::Faithfulness,
        tally.supported as f64 / tally.total() as f64,
    );
    if tally.contradicted > 0 {
        score = score.with_flag("contradicted_claim");
        for (claim, verdict) in &verdicts {
            if *verdict == ClaimVerdict::Contradicted {
                if let Some(attr) = &claim.attribute {
                    score = score.with_flag(format!("contradicted:{attr}"));
                }
            }
        }
    }
    if tally.hallucinated > 0 {
        score = score.with_flag("hallucinated_claim");
    }
    if tally.not_in_input > 0 {
        score = score.with_flag("claims_not_in_input");
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::claims::RegexClaimExtractor;
    use credlens_core::profile::Profile;

    fn facts() -> FactTable {
        let profile = Profile::builder()
            .attribute("income", 120_000.0)
            .attribute("employment_status", "employed")
            .attribute("employment_duration_years", 12.0)
            .attribute("credit_limit", 20_000.0)
            .attribute("used_credit", 5_000.0)
            .attribute("credit_utilization", 0.25)
            .attribute("payment_defaults", 0.0)
            .attribute("housing_status", "owner")
            .build();
        FactTable::from_profile(&profile).unwrap()
    }

    #[test]
    fn test_accurate_explanation_scores_high() {
        let extractor = RegexClaimExtractor::new();
        let text = "Your income of $120,000 is strong. You have 12 years of employment. \
                    Your credit utilization of 25% is healthy.";
        let score = analyze(text, &facts(), &extractor, 0.1);
        assert!(score.value >= 0.9, "got {}", score.value);
        assert!(!score.has_flag("contradicted_claim"));
    }

    #[test]
    fn test_wrong_value_is_contradicted() {
        let extractor = RegexClaimExtractor::new();
        let text = "Your income of $45,000 limits the score.";
        let score = analyze(text, &facts(), &extractor, 0.1);
        assert_eq!(score.value, 0.0);
        assert!(score.has_flag("contradicted_claim"));
        assert!(score.has_flag("contradicted:income"));
    }

    #[test]
    fn test_vacuous_explanation_scores_one_with_flag() {
        let extractor = RegexClaimExtractor::new();
        let score = analyze("Thank you for your application.", &facts(), &extractor, 0.1);
        assert_eq!(score.value, 1.0);
        assert!(score.has_flag("vacuous_explanation"));
    }

    #[test]
    fn test_mixed_claims_fraction() {
        let extractor = RegexClaimExtractor::new();
        // One supported (income), one contradicted (utilization).
        let text = "Your income of $120,000 helps, but your credit utilization of 80% hurts.";
        let score = analyze(text, &facts(), &extractor, 0.1);
        assert!((score.value - 0.5).abs() < 1e-9, "got {}", score.value);
    }
}
