//! Claim extraction and verification.
//!
//! A claim is a factual statement about an input attribute recovered from
//! free explanation text: "your income of $120,000" claims that the income
//! attribute equals 120000. Claims are verified against the fact table and
//! classified into exactly one verdict each.
//!
//! Extraction is behind the [`ClaimExtractor`] trait so a more robust NLP
//! extractor can replace the regex rules without touching scoring or
//! aggregation.

use regex::Regex;
use serde::{Deserialize, Serialize};

use credlens_core::facts::{fold_category, parse_quantity, FactTable};
use credlens_core::profile::AttributeValue;

use crate::text::mentions::MentionScanner;
use crate::text::split_sentences;

/// The value a claim asserts for an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClaimedValue {
    Numeric(f64),
    Categorical(String),
}

/// One claim extracted from explanation text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// The sentence the claim was extracted from.
    pub span: String,
    /// Canonical attribute the claim is about; `None` when a quantity could
    /// not be attributed to any known attribute.
    pub attribute: Option<String>,
    pub claimed: ClaimedValue,
}

/// Classification of a claim against the fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimVerdict {
    /// Claimed value agrees with the fact table.
    Supported,
    /// Attribute is in the fact table but the claimed value disagrees.
    Contradicted,
    /// Known attribute, but absent from this applicant's input.
    NotInInput,
    /// Quantity attached to no known attribute.
    Hallucinated,
}

/// Pluggable claim extraction.
pub trait ClaimExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<Claim>;
}

/// Unit hint carried by a quantity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuantityUnit {
    Dollar,
    Percent,
    Years,
    Bare,
}

/// Whether a quantity with the given unit can plausibly describe the
/// attribute. Keeps "$120,000" from being paired with a defaults mention
/// that happens to sit closer in the sentence.
fn unit_compatible(attribute: &str, unit: QuantityUnit) -> bool {
    match attribute {
        "credit_utilization" => matches!(unit, QuantityUnit::Percent | QuantityUnit::Bare),
        "employment_duration_years" | "address_stability_years" => {
            matches!(unit, QuantityUnit::Years | QuantityUnit::Bare)
        }
        "income" | "loan_amount" | "credit_limit" | "used_credit" => {
            matches!(unit, QuantityUnit::Dollar | QuantityUnit::Bare)
        }
        "payment_defaults" | "credit_inquiries_last_6_months" | "existing_loans"
        | "household_size" => matches!(unit, QuantityUnit::Bare),
        _ => false,
    }
}

/// Category keyword rules, longest-first so "self-employed" is consumed
/// before the bare "employed" pattern can fire inside it.
const CATEGORY_PATTERNS: &[(&str, &str, &str)] = &[
    ("employment_status", "self_employed", r"(?i)\bself.employed\b"),
    ("employment_status", "unemployed", r"(?i)\bunemployed\b"),
    ("employment_status", "retired", r"(?i)\bretired\b"),
    ("employment_status", "employed", r"(?i)\bemployed\b"),
    (
        "housing_status",
        "owner",
        r"(?i)\bhome\s?owner\b|\bowns? (?:a|your|their) home\b",
    ),
    ("housing_status", "rent", r"(?i)\brent(?:er|ing)?\b"),
    ("housing_status", "mortgage", r"(?i)\bmortgage\b"),
];

/// Regex-rule claim extractor: quantities paired with their nearest
/// unit-compatible attribute mention, plus categorical keyword claims.
pub struct RegexClaimExtractor {
    scanner: MentionScanner,
    quantity_re: Option<Regex>,
    score_re: Option<Regex>,
    categories: Vec<(&'static str, &'static str, Regex)>,
}

impl Default for RegexClaimExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexClaimExtractor {
    pub fn new() -> Self {
        let quantity_re = Regex::new(
            r"(?i)\$\s*\d[\d,]*(?:\.\d+)?|\d[\d,]*(?:\.\d+)?\s*(?:%|percent\b|years?\b|yrs\b|months?\b)|\d[\d,]*(?:\.\d+)?",
        )
        .ok();
        let score_re = Regex::new(r"(?i)\bscores?\b|\brating\b").ok();
        let categories = CATEGORY_PATTERNS
            .iter()
            .filter_map(|(attr, cat, pattern)| {
                Regex::new(pattern).ok().map(|re| (*attr, *cat, re))
            })
            .collect();
        Self {
            scanner: MentionScanner::new(),
            quantity_re,
            score_re,
            categories,
        }
    }

    fn numeric_claims(&self, sentence: &str, out: &mut Vec<Claim>) {
        let Some(quantity_re) = &self.quantity_re else {
            return;
        };
        let mentions = self.scanner.sentence_mentions(sentence);
        // The decision score itself is an output, not an input fact; a
        // quantity closest to a score mention is neither claim nor
        // hallucination.
        let score_positions: Vec<usize> = self
            .score_re
            .iter()
            .flat_map(|re| re.find_iter(sentence).map(|m| m.start()))
            .collect();

        for m in quantity_re.find_iter(sentence) {
            let Some(value) = parse_quantity(m.as_str()) else {
                continue;
            };
            let unit = classify_unit(m.as_str());

            let qty_pos = m.start();
            let nearest_compatible = mentions
                .iter()
                .filter(|(attr, _)| unit_compatible(attr, unit))
                .min_by_key(|(_, pos)| pos.abs_diff(qty_pos));
            let nearest_score_dist = score_positions
                .iter()
                .map(|pos| pos.abs_diff(qty_pos))
                .min();

            if let Some((attr, pos)) = nearest_compatible {
                // A quantity sitting closer to "score" than to any
                // attribute mention describes the decision, not an input.
                let score_closer =
                    nearest_score_dist.is_some_and(|d| d < pos.abs_diff(qty_pos));
                if !score_closer {
                    out.push(Claim {
                        span: sentence.to_string(),
                        attribute: Some(attr.clone()),
                        claimed: ClaimedValue::Numeric(value),
                    });
                }
            } else if nearest_score_dist.is_none() {
                out.push(Claim {
                    span: sentence.to_string(),
                    attribute: None,
                    claimed: ClaimedValue::Numeric(value),
                });
            }
        }
    }

    fn categorical_claims(&self, sentence: &str, out: &mut Vec<Claim>) {
        let mut taken: Vec<(usize, usize)> = Vec::new();
        for (attr, cat, re) in &self.categories {
            for m in re.find_iter(sentence) {
                let overlaps = taken
                    .iter()
                    .any(|&(s, e)| m.start() < e && s < m.end());
                if overlaps {
                    continue;
                }
                taken.push((m.start(), m.end()));
                out.push(Claim {
                    span: sentence.to_string(),
                    attribute: Some(attr.to_string()),
                    claimed: ClaimedValue::Categorical(cat.to_string()),
                });
            }
        }
    }
}

impl ClaimExtractor for RegexClaimExtractor {
    fn extract(&self, text: &str) -> Vec<Claim> {
        let mut claims = Vec::new();
        for sentence in split_sentences(text) {
            self.numeric_claims(sentence, &mut claims);
            self.categorical_claims(sentence, &mut claims);
        }
        // One claim per (attribute, value); repeating a fact is not a new
        // claim.
        let mut seen = Vec::new();
        claims.retain(|c| {
            let key = (c.attribute.clone(), c.claimed.clone());
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
        claims
    }
}

fn classify_unit(token: &str) -> QuantityUnit {
    let lowered = token.to_lowercase();
    if lowered.starts_with('$') {
        QuantityUnit::Dollar
    } else if lowered.contains('%') || lowered.contains("percent") {
        QuantityUnit::Percent
    } else if lowered.contains("year") || lowered.contains("yr") || lowered.contains("month") {
        QuantityUnit::Years
    } else {
        QuantityUnit::Bare
    }
}

/// Verify one claim against the fact table.
///
/// Numeric claims match within a relative tolerance; a claimed percentage
/// written as points ("25" against a stored ratio 0.25) is rescaled before
/// comparison. Every claim receives exactly one verdict.
pub fn verify(claim: &Claim, facts: &FactTable, tolerance: f64) -> ClaimVerdict {
    let Some(attribute) = &claim.attribute else {
        return ClaimVerdict::Hallucinated;
    };
    let Some(fact) = facts.get(attribute) else {
        return ClaimVerdict::NotInInput;
    };

    match (&claim.claimed, &fact.value) {
        (ClaimedValue::Numeric(claimed), AttributeValue::Numeric(actual)) => {
            if numeric_match(*claimed, *actual, tolerance) {
                ClaimVerdict::Supported
            } else {
                ClaimVerdict::Contradicted
            }
        }
        (ClaimedValue::Categorical(claimed), AttributeValue::Categorical(actual)) => {
            if fold_category(claimed) == *actual {
                ClaimVerdict::Supported
            } else {
                ClaimVerdict::Contradicted
            }
        }
        // Kind mismatch: the claim asserts something the fact cannot mean.
        _ => ClaimVerdict::Contradicted,
    }
}

fn numeric_match(claimed: f64, actual: f64, tolerance: f64) -> bool {
    let close = |a: f64, b: f64| {
        if b.abs() < f64::EPSILON {
            a.abs() < f64::EPSILON
        } else {
            (a - b).abs() <= tolerance * b.abs()
        }
    };
    if close(claimed, actual) {
        return true;
    }
    // Ratio facts are stored in [0, 1] but often written in points.
    (0.0..=1.0).contains(&actual) && claimed > 1.0 && close(claimed / 100.0, actual)
}
