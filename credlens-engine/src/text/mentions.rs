//! Attribute mention detection in explanation text.
//!
//! Maps free-text wordings onto canonical attribute names via per-attribute
//! synonym patterns. Several analyzers share one scanner: alignment and
//! completeness check which ranked features are mentioned, consistency
//! compares mention sets across repeated explanations, and the claim
//! extractor uses mentions to attribute quantities.

use std::collections::BTreeMap;

use regex::Regex;

/// Synonym pattern per canonical attribute. Patterns are matched
/// case-insensitively against whole sentences.
const MENTION_PATTERNS: &[(&str, &str)] = &[
    ("income", r"\bincome\b|\bsalary\b|\bearnings\b"),
    (
        "employment_duration_years",
        r"years? (?:of |in )?employment|employment (?:duration|length|history of)|job tenure|employed for|with (?:your|their|the same) employer",
    ),
    (
        "employment_status",
        r"employment status|\bjob\b|\bemployed\b|\bunemployed\b|self.employed|\bretired\b",
    ),
    (
        "credit_utilization",
        r"\butili[sz]ation\b|credit usage|revolving balance",
    ),
    ("used_credit", r"used credit|outstanding balance|\bbalances?\b"),
    ("credit_limit", r"credit limit|\blimit\b"),
    (
        "payment_defaults",
        r"\bdefaults?\b|missed payments?|late payments?|payment history",
    ),
    (
        "credit_inquiries_last_6_months",
        r"\binquir(?:y|ies)\b|recent credit checks?",
    ),
    (
        "existing_loans",
        r"existing loans?|open loans?|number of loans|current loans?",
    ),
    ("loan_amount", r"loan amount|requested amount|amount requested"),
    (
        "address_stability_years",
        r"address stability|time at (?:your|their|this) address|at the same address",
    ),
    ("household_size", r"\bhousehold\b"),
    (
        "housing_status",
        r"\bhousing\b|\bhome\s?owner(?:ship)?\b|\bowns? (?:a|your|their) home\b|\brent(?:er|ing|al)?s?\b|\bmortgage\b",
    ),
];

/// Compiled mention scanner. Build once per engine, reuse across runs.
pub struct MentionScanner {
    patterns: Vec<(String, Regex)>,
}

impl Default for MentionScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MentionScanner {
    pub fn new() -> Self {
        let patterns = MENTION_PATTERNS
            .iter()
            .filter_map(|(name, pattern)| {
                Regex::new(&format!("(?i){pattern}"))
                    .ok()
                    .map(|re| (name.to_string(), re))
            })
            .collect();
        Self { patterns }
    }

    /// All attributes mentioned anywhere in the text, mapped to the first
    /// sentence that mentions them.
    pub fn mentions(&self, text: &str) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for sentence in super::split_sentences(text) {
            for (attribute, re) in &self.patterns {
                if out.contains_key(attribute) {
                    continue;
                }
                if re.is_match(sentence) {
                    out.insert(attribute.clone(), sentence.to_string());
                }
            }
        }
        out
    }

    /// Attributes mentioned in one sentence, with the byte offset of the
    /// first match. Used for pairing quantities with their nearest mention.
    pub fn sentence_mentions(&self, sentence: &str) -> Vec<(String, usize)> {
        self.patterns
            .iter()
            .filter_map(|(attribute, re)| {
                re.find(sentence).map(|m| (attribute.clone(), m.start()))
            })
            .collect()
    }

    /// Whether the text mentions the given attribute at all.
    pub fn mentions_attribute(&self, text: &str, attribute: &str) -> bool {
        self.patterns
            .iter()
            .find(|(name, _)| name == attribute)
            .is_some_and(|(_, re)| re.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_income_synonyms() {
        let scanner = MentionScanner::new();
        assert!(scanner.mentions("Your salary supports approval.").contains_key("income"));
        assert!(scanner.mentions("Strong earnings history.").contains_key("income"));
        assert!(!scanner.mentions("Nothing relevant here.").contains_key("income"));
    }

    #[test]
    fn test_detects_utilization_spellings() {
        let scanner = MentionScanner::new();
        assert!(scanner
            .mentions("Credit utilisation is moderate.")
            .contains_key("credit_utilization"));
        assert!(scanner
            .mentions("Your credit utilization of 25% is healthy.")
            .contains_key("credit_utilization"));
    }

    #[test]
    fn test_mention_context_is_the_sentence() {
        let scanner = MentionScanner::new();
        let mentions =
            scanner.mentions("Approved. Your income of $85,000 is stable. Thank you.");
        assert_eq!(
            mentions.get("income").unwrap(),
            "Your income of $85,000 is stable"
        );
    }

    #[test]
    fn test_homeowner_maps_to_housing_status() {
        let scanner = MentionScanner::new();
        assert!(scanner
            .mentions("Being a homeowner strengthens the application.")
            .contains_key("housing_status"));
        assert!(scanner
            .mentions("You rent your apartment.")
            .contains_key("housing_status"));
    }

    #[test]
    fn test_sentence_mentions_offsets() {
        let scanner = MentionScanner::new();
        let found = scanner.sentence_mentions("income of $85,000 and 2 defaults");
        let attrs: Vec<&str> = found.iter().map(|(a, _)| a.as_str()).collect();
        assert!(attrs.contains(&"income"));
        assert!(attrs.contains(&"payment_defaults"));
        let income_pos = found.iter().find(|(a, _)| a == "income").unwrap().1;
        assert_eq!(income_pos, 0);
    }
}
