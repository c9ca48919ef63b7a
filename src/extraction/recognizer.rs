//! The injected entity-recognition capability.
//!
//! The real NLP model is an external collaborator; the pipeline consumes it
//! through [`EntityRecognizer`] and assumes no side effects. A naive
//! regex-based recognizer ships for local runs and tests.

use crate::error::RecognizerError;
use regex::Regex;

/// A phrase detected by the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedEntity {
    pub value: String,
    /// Byte span in the source text, when the recognizer reports one.
    pub span: Option<(usize, usize)>,
}

/// Entity-recognition capability: pure function over message text.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError>;
}

/// Naive recognizer that treats runs of capitalized words as entities.
///
/// Good enough for demos and deterministic tests; not a substitute for a real
/// NER model.
pub struct CapitalizedPhraseRecognizer {
    pattern: Regex,
}

impl CapitalizedPhraseRecognizer {
    pub fn new() -> Self {
        // One capitalized word, optionally followed by more capitalized words.
        let pattern = Regex::new(r"\b[A-Z][a-z]+(?: [A-Z][a-z]+)*\b")
            .expect("capitalized-phrase pattern is valid");
        Self { pattern }
    }
}

impl Default for CapitalizedPhraseRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRecognizer for CapitalizedPhraseRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizerError> {
        let found = self
            .pattern
            .find_iter(text)
            .filter(|m| m.as_str().len() > 2)
            .map(|m| RecognizedEntity {
                value: m.as_str().to_string(),
                span: Some((m.start(), m.end())),
            })
            .collect();
        Ok(found)
    }
}
