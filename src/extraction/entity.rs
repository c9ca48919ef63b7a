//! Entity extraction stage.

use super::recognizer::EntityRecognizer;
use super::{check_resolved, ExtractionStage};
use crate::error::ExtractionError;
use crate::mention::{EntityMention, MentionRecord};
use crate::model::FatMessage;
use std::collections::HashMap;
use std::sync::Arc;

/// Extracts entity mentions from message text through an injected recognizer.
///
/// Detected phrases are grouped by normalized text within the message; one
/// record is emitted per distinct phrase with `occurrences` set to its
/// in-message count. Every record carries the message timestamp, not a
/// per-occurrence time. A recognizer failure counts as zero entities for that
/// message.
pub struct EntityExtractionStage {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl EntityExtractionStage {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }
}

impl ExtractionStage for EntityExtractionStage {
    fn name(&self) -> &'static str {
        "entity-extraction"
    }

    fn extract(&self, message: &FatMessage) -> Result<Vec<MentionRecord>, ExtractionError> {
        check_resolved(message)?;

        let recognized = match self.recognizer.recognize(&message.message.text) {
            Ok(recognized) => recognized,
            Err(e) => {
                tracing::warn!(error = %e, "recognizer failed; treating message as entity-free");
                return Ok(Vec::new());
            }
        };

        let mut counts: HashMap<String, i32> = HashMap::new();
        for entity in recognized {
            let normalized = normalize(&entity.value);
            if normalized.is_empty() {
                continue;
            }
            *counts.entry(normalized).or_insert(0) += 1;
        }

        let records = counts
            .into_iter()
            .map(|(phrase, occurrences)| {
                MentionRecord::Entity(EntityMention::new(
                    &message.user.username,
                    &message.room.name,
                    message.message.time,
                    phrase,
                    occurrences,
                    message.user.is_bot,
                ))
            })
            .collect();
        Ok(records)
    }
}

/// Normalization used for in-message grouping: trim, collapse inner
/// whitespace, lowercase.
fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
