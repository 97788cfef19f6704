//! Trait for the external text recognizer.

use std::sync::{Arc, Mutex};

use image::GrayImage;

use crate::error::RecognitionError;
use crate::plate::TextCandidate;

/// Raw recognizer hypothesis; the pipeline derives the length itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

impl From<RecognizedText> for TextCandidate {
    fn from(raw: RecognizedText) -> Self {
        TextCandidate::new(raw.text, raw.confidence)
    }
}

/// Converts a conditioned image region into ranked text hypotheses.
pub trait TextRecognizer {
    fn recognize(
        &mut self,
        region: &GrayImage,
        languages: &[String],
    ) -> Result<Vec<RecognizedText>, RecognitionError>;
}

/// A single recognizer model shared by several sessions.
impl<R: TextRecognizer> TextRecognizer for Arc<Mutex<R>> {
    fn recognize(
        &mut self,
        region: &GrayImage,
        languages: &[String],
    ) -> Result<Vec<RecognizedText>, RecognitionError> {
        let mut recognizer = self
            .lock()
            .map_err(|_| RecognitionError::Engine("recognizer lock poisoned".into()))?;
        recognizer.recognize(region, languages)
    }
}

/// Run `recognizer` on `region` and turn its output into candidates.
pub fn recognize_candidates<R: TextRecognizer + ?Sized>(
    recognizer: &mut R,
    region: &GrayImage,
    languages: &[String],
) -> Result<Vec<TextCandidate>, RecognitionError> {
    if region.width() == 0 || region.height() == 0 {
        return Err(RecognitionError::MalformedInput("empty region".into()));
    }
    let raw = recognizer.recognize(region, languages)?;
    Ok(raw.into_iter().map(TextCandidate::from).collect())
}
