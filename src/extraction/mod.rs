//! Extraction stages: pure transforms from one inbound message to mention
//! records.
//!
//! Each stage is stateless per message and holds no shared mutable state,
//! which is what allows the pipeline to run many workers of the same stage
//! concurrently and lets the stages be unit-tested with literal message
//! fixtures.

pub mod emoji;
pub mod entity;
pub mod recognizer;
pub mod summary;

pub use emoji::EmojiExtractionStage;
pub use entity::EntityExtractionStage;
pub use recognizer::{CapitalizedPhraseRecognizer, EntityRecognizer, RecognizedEntity};
pub use summary::MessageSummaryStage;

use crate::error::ExtractionError;
use crate::mention::MentionRecord;
use crate::model::FatMessage;
use std::sync::Arc;

/// A stateless transform from one message to zero or more mention records.
pub trait ExtractionStage: Send + Sync + 'static {
    /// Stage name used in logs.
    fn name(&self) -> &'static str;

    /// Extract mention records from one message.
    ///
    /// An `Err` skips the message for this stage only; other stages still run.
    fn extract(&self, message: &FatMessage) -> Result<Vec<MentionRecord>, ExtractionError>;
}

/// The standard stage set: entity, emoji, and message-summary extraction.
pub fn default_stages(recognizer: Arc<dyn EntityRecognizer>) -> Vec<Arc<dyn ExtractionStage>> {
    vec![
        Arc::new(EntityExtractionStage::new(recognizer)),
        Arc::new(EmojiExtractionStage::new()),
        Arc::new(MessageSummaryStage::new()),
    ]
}

/// Reject messages missing the metadata every record needs.
pub(crate) fn check_resolved(message: &FatMessage) -> Result<(), ExtractionError> {
    if message.user.username.is_empty() {
        return Err(ExtractionError::Malformed(
            "message has no resolved username".to_string(),
        ));
    }
    if message.room.name.is_empty() {
        return Err(ExtractionError::Malformed(
            "message has no resolved room name".to_string(),
        ));
    }
    Ok(())
}
