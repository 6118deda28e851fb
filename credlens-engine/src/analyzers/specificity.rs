//! Specificity and actionability: does the explanation cite concrete values
//! and tell the applicant what to do?
//!
//! Counts concrete value mentions, threshold statements, cross-feature
//! comparisons, and actionable imperative phrases, then maps the counts
//! onto a 0-5 ordinal scale normalized to [0, 1].

use regex::Regex;

use crate::analyzers::{Dimension, DimensionScore};

const VALUE_PATTERNS: &[&str] = &[
    r"\$[\d,]+",
    r"\b\d{3,4}\b",
    r"\b\d+\.\d+%",
    r"\b\d+%",
];

const THRESHOLD_PATTERNS: &[&str] = &[
    r"(?i)\babove \d|\bbelow \d|\bover \d|\bunder \d",
    r"(?i)\bthreshold\b|\bcriteria\b|\brequirement\b|\bminimum\b|\bmaximum\b",
    r"(?i)\bat least \d|\bno more than \d",
];

const INTERACTION_PATTERNS: &[&str] = &[
    r"(?i)\bcombined with\b|\balong with\b|\btogether with\b",
    r"(?i)\bratio\b|\bcompared to\b|\brelative to\b",
    r"(?i)\bgiven your\b|\bconsidering your\b|\bbecause of your\b",
];

const ACTIONABLE_PATTERNS: &[&str] = &[
    r"(?i)reduce.{0,40}below|increase.{0,40}above|maintain.{0,40}under|keep.{0,40}below",
    r"(?i)pay.{0,30}on time|avoid.{0,30}late payments?",
    r"(?i)lower.{0,30}utili[sz]ation|decrease.{0,30}balance|pay down",
    r"(?i)consider.{0,30}consolidat|refinanc",
    r"(?i)improve.{0,30}history|build.{0,30}credit",
];

fn count_matches(text: &str, patterns: &[&str]) -> usize {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .map(|re| re.find_iter(text).count())
        .sum()
}

/// Count distinct actionable-advice patterns present in the text. Each
/// pattern counts at most once. Shared with the readability analyzer's
/// next-step check.
pub(crate) fn count_actionable(text: &str) -> usize {
    ACTIONABLE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .filter(|re| re.is_match(text))
        .count()
}

pub fn analyze(text: &str) -> DimensionScore {
    let values = count_matches(text, VALUE_PATTERNS);
    let thresholds = count_matches(text, THRESHOLD_PATTERNS);
    let interactions = count_matches(text, INTERACTION_PATTERNS);
    let actionable = count_actionable(text);

    // 0-5 ordinal: up to 2 points for concrete values and thresholds, up to
    // 1 for cross-feature comparisons, up to 2 for actionable advice.
    let mut points = 0.0;
    points += ((values + thresholds) as f64 * 0.5).min(2.0);
    points += (interactions as f64 * 0.5).min(1.0);
    points += (actionable as f64).min(2.0);

    let mut score = DimensionScore::new(Dimension::Specificity, points / 5.0);
    if points <= 2.0 {
        score = score.with_flag("too_vague");
    }
    if actionable == 0 {
        score = score.with_flag("no_actionable_advice");
    }
    score
}
