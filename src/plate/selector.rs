//! Best-candidate selection over recognizer output.

use tracing::{debug, warn};

use crate::error::RecognitionError;

/// Candidates shorter than this are noise and do not count as usable.
pub const MIN_TEXT_LEN: usize = 3;

/// One ranked text hypothesis for an image region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCandidate {
    pub text: String,
    /// Recognizer confidence in `[0, 1]`
    pub confidence: f32,
    /// Length of `text` in characters
    pub length: usize,
}

impl TextCandidate {
    /// Build a candidate, computing its length from the text.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            text,
            confidence,
            length,
        }
    }

    pub fn score(&self) -> f32 {
        self.length as f32 * self.confidence
    }
}

/// Pick the plate text from a recognizer's candidates.
///
/// The length filter only decides whether the region produced anything
/// usable. The returned text is the top of the unfiltered ranking by
/// `length * confidence`, so a short candidate can still win when at least
/// one usable candidate exists. Ties keep recognizer order.
pub fn select(candidates: &[TextCandidate]) -> String {
    let usable = candidates
        .iter()
        .filter(|c| c.length >= MIN_TEXT_LEN)
        .count();
    if usable == 0 {
        return String::new();
    }

    let mut best: Option<&TextCandidate> = None;
    for candidate in candidates {
        if best.is_none_or(|b| candidate.score() > b.score()) {
            best = Some(candidate);
        }
    }
    best.map(|c| c.text.clone()).unwrap_or_default()
}

/// Select from a recognizer outcome, degrading failures to no text.
pub fn select_from(outcome: Result<Vec<TextCandidate>, RecognitionError>) -> String {
    match outcome {
        Ok(candidates) => {
            let text = select(&candidates);
            debug!(candidates = candidates.len(), %text, "plate text selected");
            text
        }
        Err(e) => {
            warn!(error = %e, "text recognition failed, continuing without plate text");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_is_character_count() {
        let c = TextCandidate::new("ÄB1", 0.5);
        assert_eq!(c.length, 3);
        assert!((c.score() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_short_noise_filtered_long_text_wins() {
        let candidates = vec![
            TextCandidate {
                text: "AB".into(),
                confidence: 0.9,
                length: 2,
            },
            TextCandidate {
                text: "XYZ123".into(),
                confidence: 0.5,
                length: 7,
            },
        ];
        assert_eq!(select(&candidates), "XYZ123");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(select(&[]), "");
    }

    #[test]
    fn test_only_short_candidates() {
        let candidates = vec![TextCandidate::new("A", 1.0), TextCandidate::new("7Q", 0.99)];
        assert_eq!(select(&candidates), "");
    }

    #[test]
    fn test_winner_taken_from_unfiltered_ranking() {
        // "KA" scores 2 * 0.95 = 1.9 and beats "MH12" at 4 * 0.3 = 1.2,
        // even though only "MH12" passes the length filter.
        let candidates = vec![TextCandidate::new("MH12", 0.3), TextCandidate::new("KA", 0.95)];
        assert_eq!(select(&candidates), "KA");
    }

    #[test]
    fn test_tie_keeps_first() {
        let candidates = vec![TextCandidate::new("ABCD", 0.5), TextCandidate::new("WXYZ", 0.5)];
        assert_eq!(select(&candidates), "ABCD");
    }

    #[test]
    fn test_recognition_failure_is_empty_text() {
        assert_eq!(select_from(Err(RecognitionError::Timeout)), "");
        assert_eq!(
            select_from(Ok(vec![TextCandidate::new("DL3CAB1234", 0.8)])),
            "DL3CAB1234"
        );
    }
}
