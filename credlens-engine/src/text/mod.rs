//! Text scanning shared by the analyzers: sentence splitting, attribute
//! mention detection, and claim extraction.

pub mod claims;
pub mod mentions;

pub use claims::{Claim, ClaimExtractor, ClaimVerdict, ClaimedValue, RegexClaimExtractor};
pub use mentions::MentionScanner;

/// Split text into sentences on terminal punctuation.
///
/// A period only terminates a sentence when followed by whitespace or the
/// end of text, so decimals ("0.25") and currency amounts ("$1,234.56")
/// survive intact. Deliberately simple beyond that; the analyzers only need
/// rough boundaries for pairing quantities with mentions and counting
/// reason statements.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let terminal = match b {
            b'\n' => true,
            b'.' | b'!' | b'?' => bytes
                .get(i + 1)
                .map_or(true, |next| next.is_ascii_whitespace()),
            _ => false,
        };
        if terminal {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First one. Second!\nThird? ");
        assert_eq!(sentences, vec!["First one", "Second", "Third"]);
    }

    #[test]
    fn test_split_preserves_decimals() {
        let sentences = split_sentences("Your utilization is 0.25 of $1,234.56 today.");
        assert_eq!(sentences, vec!["Your utilization is 0.25 of $1,234.56 today"]);
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(". . .").is_empty());
    }
}
