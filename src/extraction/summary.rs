//! Message summary stage.

use super::{check_resolved, ExtractionStage};
use crate::error::ExtractionError;
use crate::mention::{MentionRecord, MessageSummary};
use crate::model::{FatMessage, MessageType};

/// Emits exactly one [`MessageSummary`] per message, classified by message
/// type. Summaries carry no message text and are used purely for volume
/// counting.
pub struct MessageSummaryStage;

impl MessageSummaryStage {
    pub fn new() -> Self {
        Self
    }

    fn classify(message: &FatMessage) -> MessageType {
        // A plain message sent by a bot account counts as bot traffic.
        if message.user.is_bot && message.message.message_type == MessageType::Message {
            MessageType::BotMessage
        } else {
            message.message.message_type
        }
    }
}

impl Default for MessageSummaryStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStage for MessageSummaryStage {
    fn name(&self) -> &'static str {
        "message-summary"
    }

    fn extract(&self, message: &FatMessage) -> Result<Vec<MentionRecord>, ExtractionError> {
        check_resolved(message)?;

        let summary = MessageSummary::new(
            &message.user.username,
            &message.room.name,
            message.message.time,
            Self::classify(message),
            message.user.is_bot,
        );
        Ok(vec![MentionRecord::Summary(summary)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, Room, User};
    use chrono::NaiveDate;

    fn fixture(message_type: MessageType, is_bot: bool) -> FatMessage {
        FatMessage::new(
            Message {
                time: NaiveDate::from_ymd_opt(2026, 1, 15)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                from_user_id: "U1".to_string(),
                text: "hi".to_string(),
                message_type,
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
    fn test_one_summary_per_message() {
        let stage = MessageSummaryStage::new();
        let records = stage.extract(&fixture(MessageType::Message, false)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].occurrences(), 1);
        assert_eq!(records[0].value_label(), "MESSAGE");
    }

    #[test]
    fn test_join_event_classified() {
        let stage = MessageSummaryStage::new();
        let records = stage
            .extract(&fixture(MessageType::ChannelJoin, false))
            .unwrap();
        assert_eq!(records[0].value_label(), "CHANNEL_JOIN");
    }

    #[test]
    fn test_bot_plain_message_becomes_bot_message() {
        let stage = MessageSummaryStage::new();
        let records = stage.extract(&fixture(MessageType::Message, true)).unwrap();
        assert_eq!(records[0].value_label(), "BOT_MESSAGE");

        // Non-plain events keep their type even from bots.
        let records = stage
            .extract(&fixture(MessageType::ChannelLeave, true))
            .unwrap();
        assert_eq!(records[0].value_label(), "CHANNEL_LEAVE");
    }
}
