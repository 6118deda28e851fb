//! Consistency: does the collaborator explain the same decision the same
//! way across repeated calls?
//!
//! Given M independently obtained explanation texts for the identical
//! profile, scores the mean pairwise similarity. The similarity function is
//! a collaborator dependency behind [`TextSimilarity`]; the default is
//! token overlap (word Jaccard averaged with feature-mention Jaccard), and
//! an embedding-based cosine implementation can be plugged in by the caller.

use std::collections::BTreeSet;

use crate::analyzers::{Dimension, DimensionScore};
use crate::text::mentions::MentionScanner;

/// Pairwise semantic similarity between two explanation texts, in [0, 1].
pub trait TextSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Default similarity: the mean of word-level Jaccard overlap and
/// feature-mention Jaccard overlap.
pub struct TokenOverlapSimilarity {
    scanner: MentionScanner,
}

impl Default for TokenOverlapSimilarity {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenOverlapSimilarity {
    pub fn new() -> Self {
        Self {
            scanner: MentionScanner::new(),
        }
    }

    fn words(text: &str) -> BTreeSet<String> {
        text.split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect()
    }

    fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        let intersection = a.intersection(b).count();
        let union = a.union(b).count();
        intersection as f64 / union as f64
    }
}

impl TextSimilarity for TokenOverlapSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let word_overlap = Self::jaccard(&Self::words(a), &Self::words(b));

        let mentions_a: BTreeSet<String> = self.scanner.mentions(a).into_keys().collect();
        let mentions_b: BTreeSet<String> = self.scanner.mentions(b).into_keys().collect();
        let mention_overlap = Self::jaccard(&mentions_a, &mentions_b);

        (word_overlap + mention_overlap) / 2.0
    }
}

pub fn analyze(texts: &[String], similarity: &dyn TextSimilarity) -> DimensionScore {
    if texts.len() < 2 {
        return DimensionScore::new(Dimension::Consistency, 0.0)
            .with_flag("insufficient_observations");
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..texts.len() {
        for j in (i + 1)..texts.len() {
            total += similarity.similarity(&texts[i], &texts[j]);
            pairs += 1;
        }
    }
    DimensionScore::new(Dimension::Consistency, total / pairs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_fully_consistent() {
        let texts = vec![
            "Your income of $85,000 supports approval.".to_string();
            3
        ];
        let score = analyze(&texts, &TokenOverlapSimilarity::new());
        assert!((score.value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_texts_score_low() {
        let texts = vec![
            "Your income of $85,000 supports approval.".to_string(),
            "Recent defaults and inquiries weigh heavily.".to_string(),
        ];
        let score = analyze(&texts, &TokenOverlapSimilarity::new());
        assert!(score.value < 0.3, "got {}", score.value);
    }

    #[test]
    fn test_single_text_flags_insufficient() {
        let texts = vec!["Only one explanation.".to_string()];
        let score = analyze(&texts, &TokenOverlapSimilarity::new());
        assert_eq!(score.value, 0.0);
        assert!(score.has_flag("insufficient_observations"));
    }

    #[test]
    fn test_paraphrase_scores_between() {
        let texts = vec![
            "Your income of $85,000 supports approval.".to_string(),
            "A salary of $85,000 works in your favor.".to_string(),
        ];
        let score = analyze(&texts, &TokenOverlapSimilarity::new());
        assert!(score.value > 0.3 && score.value < 1.0, "got {}", score.value);
    }
}
