//! Emoji extraction stage.

use super::{check_resolved, ExtractionStage};
use crate::error::ExtractionError;
use crate::mention::{EmojiMention, MentionRecord};
use crate::model::FatMessage;
use regex::Regex;
use std::collections::HashMap;

/// Scans message text for `:short_code:` emoji patterns and emits one
/// [`EmojiMention`] per distinct code with its in-message count. The sender's
/// bot flag is carried on every record.
pub struct EmojiExtractionStage {
    pattern: Regex,
}

impl EmojiExtractionStage {
    pub fn new() -> Self {
        let pattern =
            Regex::new(r":([a-z0-9_+\-]+):").expect("emoji short-code pattern is valid");
        Self { pattern }
    }
}

impl Default for EmojiExtractionStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStage for EmojiExtractionStage {
    fn name(&self) -> &'static str {
        "emoji-extraction"
    }

    fn extract(&self, message: &FatMessage) -> Result<Vec<MentionRecord>, ExtractionError> {
        check_resolved(message)?;

        let mut counts: HashMap<String, i32> = HashMap::new();
        for capture in self.pattern.captures_iter(&message.message.text) {
            let code = &capture[1];
            *counts.entry(code.to_string()).or_insert(0) += 1;
        }

        let records = counts
            .into_iter()
            .map(|(code, occurrences)| {
                MentionRecord::Emoji(EmojiMention::new(
                    &message.user.username,
                    &message.room.name,
                    message.message.time,
                    code,
                    occurrences,
                    message.user.is_bot,
                ))
            })
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::MentionRecord;
    use crate::model::{Message, MessageType, Room, User};
    use chrono::NaiveDate;

    fn fixture(text: &str, is_bot: bool) -> FatMessage {
        FatMessage::new(
            Message {
                time: NaiveDate::from_ymd_opt(2026, 1, 15)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                from_user_id: "U1".to_string(),
                text: text.to_string(),
                message_type: MessageType::Message,
            },
            User {
                user_id: "U1".to_string(),
                username: "jane".to_string(),
                is_bot,
            },
            Room {
                room_id: "R1".to_string(),
                name: "theroom".to_string(),
            },
        )
    }

    #[test]
    fn test_counts_grouped_by_code() {
        let stage = EmojiExtractionStage::new();
        let records = stage
            .extract(&fixture("gg :wave: :+1: :wave: :wave:", false))
            .unwrap();

        assert_eq!(records.len(), 2);
        let wave = records.iter().find(|r| r.value_label() == "wave").unwrap();
        assert_eq!(wave.occurrences(), 3);
        let plus_one = records.iter().find(|r| r.value_label() == "+1").unwrap();
        assert_eq!(plus_one.occurrences(), 1);
    }

    #[test]
    fn test_no_emoji_no_records() {
        let stage = EmojiExtractionStage::new();
        assert!(stage.extract(&fixture("plain text", false)).unwrap().is_empty());
    }

    #[test]
    fn test_bot_flag_carried() {
        let stage = EmojiExtractionStage::new();
        let records = stage.extract(&fixture(":robot:", true)).unwrap();
        match &records[0] {
            MentionRecord::Emoji(m) => assert!(m.bot),
            other => panic!("expected emoji record, got {:?}", other),
        }
    }

    #[test]
    fn test_adjacent_codes_both_match() {
        let stage = EmojiExtractionStage::new();
        let records = stage.extract(&fixture(":a1::b2:", false)).unwrap();
        let mut values: Vec<String> = records.iter().map(|r| r.value_label()).collect();
        values.sort();
        assert_eq!(values, vec!["a1".to_string(), "b2".to_string()]);
    }
}
