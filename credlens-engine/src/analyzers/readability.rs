//! Readability and structure: is the explanation organized the way a
//! decision letter should be?
//!
//! Checks for a leading summary sentence, at least three structured reason
//! statements, at least one actionable next step, and basic grammatical
//! well-formedness, mapped onto a 0-5 ordinal scale normalized to [0, 1].

use regex::Regex;

use crate::analyzers::specificity::count_actionable;
use crate::analyzers::{Dimension, DimensionScore};
use crate::text::mentions::MentionScanner;
use crate::text::split_sentences;

/// Sentences this long no longer read as a summary.
const MAX_SUMMARY_WORDS: usize = 25;

/// Average sentence length band considered well-formed.
const WELL_FORMED_RANGE: std::ops::RangeInclusive<f64> = 8.0..=30.0;

pub fn analyze(text: &str, scanner: &MentionScanner) -> DimensionScore {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return DimensionScore::new(Dimension::Readability, 0.0).with_flag("empty_text");
    }

    let reason_re = Regex::new(r"(?i)\bbecause\b|\bdue to\b|\bas a result\b|\breflect(?:s|ing)?\b|\bcontribut(?:es|ed|ing)?\b").ok();

    // Leading summary: a first sentence short enough to read as one.
    let summary_words = sentences[0].split_whitespace().count();
    let has_summary = summary_words > 0 && summary_words <= MAX_SUMMARY_WORDS;

    // Reason statements: sentences that tie the decision to an input,
    // either by naming an attribute or by causal phrasing.
    let reason_count = sentences
        .iter()
        .filter(|s| {
            !scanner.sentence_mentions(s).is_empty()
                || reason_re.as_ref().is_some_and(|re| re.is_match(s))
        })
        .count();

    let has_next_step = count_actionable(text) > 0;

    let word_count: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    let avg_sentence_len = word_count as f64 / sentences.len() as f64;
    let well_formed = WELL_FORMED_RANGE.contains(&avg_sentence_len);

    let mut points = 0.0;
    if has_summary {
        points += 1.0;
    }
    points += match reason_count {
        0 => 0.0,
        1 | 2 => 1.0,
        _ => 2.0,
    };
    if has_next_step {
        points += 1.0;
    }
    if well_formed {
        points += 1.0;
    }

    let mut score = DimensionScore::new(Dimension::Readability, points / 5.0);
    if !has_summary {
        score = score.with_flag("no_summary");
    }
    if reason_count < 3 {
        score = score.with_flag("unstructured");
    }
    if !has_next_step {
        score = score.with_flag("no_next_step");
    }
    score
}
