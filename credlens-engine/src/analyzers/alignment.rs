//! Surrogate alignment: does the explanation talk about the features the
//! surrogate says mattered, with the right direction?
//!
//! Coverage is the fraction of top-K ranked features mentioned anywhere in
//! the text; direction agreement is the fraction of mentioned features whose
//! stated direction (increases or decreases the score) matches the sign of
//! the surrogate coefficient. Score = 0.7 * coverage + 0.3 * agreement.

use regex::Regex;

use crate::analyzers::{Dimension, DimensionScore};
use crate::ranking::{Direction, FeatureRanking};
use crate::text::mentions::MentionScanner;

const POSITIVE_CUES: &str =
    r"(?i)\bincrease[sd]?\b|\bimprove[sd]?\b|\bboost(?:s|ed)?\b|\bhigher\b|\bbetter\b|\bstrengthen(?:s|ed)?\b|\bsupports?\b|\bhelps?\b|\bin your favou?r\b";
const NEGATIVE_CUES: &str =
    r"(?i)\bdecrease[sd]?\b|\breduce[sd]?\b|\blower(?:s|ed)?\b|\bworse\b|\bhurts?\b|\bharms?\b|\bweaken(?:s|ed)?\b|\bpenali[sz](?:es|ed)\b|\bdrags? down\b|\bagainst you\b|\bcosts? you\b";

pub fn analyze(
    text: &str,
    ranking: &FeatureRanking,
    top_k: usize,
    scanner: &MentionScanner,
) -> DimensionScore {
    if ranking.is_empty() {
        return DimensionScore::new(Dimension::SurrogateAlignment, 0.0).with_flag("no_ranking");
    }

    let positive_re = Regex::new(POSITIVE_CUES).ok();
    let negative_re = Regex::new(NEGATIVE_CUES).ok();
    let mentions = scanner.mentions(text);

    let top: Vec<_> = ranking.iter().take(top_k).collect();
    let mut covered = 0usize;
    let mut directional = 0usize;
    let mut agreements = 0usize;

    for feature in &top {
        let Some(context) = mentions.get(feature.attribute()) else {
            continue;
        };
        covered += 1;

        let says_positive = positive_re.as_ref().is_some_and(|re| re.is_match(context));
        let says_negative = negative_re.as_ref().is_some_and(|re| re.is_match(context));
        if !says_positive && !says_negative {
            continue;
        }
        directional += 1;
        let agrees = match feature.direction {
            Direction::PositiveDriver => says_positive && !says_negative,
            Direction::NegativeDriver => says_negative && !says_positive,
        };
        if agrees {
            agreements += 1;
        }
    }

    let coverage = covered as f64 / top.len() as f64;
    let direction_agreement = if directional > 0 {
        agreements as f64 / directional as f64
    } else {
        0.0
    };

    let mut score = DimensionScore::new(
        Dimension::SurrogateAlignment,
        0.7 * coverage + 0.3 * direction_agreement,
    );
    if covered > 0 && directional == 0 {
        score = score.with_flag("no_directional_language");
    }
    if covered == 0 {
        score = score.with_flag("top_features_unmentioned");
    }
    score
}
