//! Core chat domain types.
//!
//! A [`FatMessage`] bundles a raw message with its resolved sender and room
//! metadata. It is the unit that flows from a source adapter through the
//! extraction pipeline.

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A raw chat message as delivered by a platform connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message timestamp (UTC).
    pub time: NaiveDateTime,
    /// Platform identifier of the sender.
    pub from_user_id: String,
    /// Message body. May be empty for join/leave events.
    pub text: String,
    /// Classified message event type.
    pub message_type: MessageType,
}

/// A resolved chat user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub is_bot: bool,
}

/// A resolved chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: String,
}

/// A message bundled with resolved sender and room metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatMessage {
    pub message: Message,
    pub user: User,
    pub room: Room,
}

impl FatMessage {
    pub fn new(message: Message, user: User, room: Room) -> Self {
        Self { message, user, room }
    }
}

/// Classified type of a chat message event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Message,
    BotMessage,
    ChannelJoin,
    ChannelLeave,
    MessageChanged,
    PinnedItem,
    Unknown,
}

impl MessageType {
    /// Stable string form used for persistence and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Message => "MESSAGE",
            MessageType::BotMessage => "BOT_MESSAGE",
            MessageType::ChannelJoin => "CHANNEL_JOIN",
            MessageType::ChannelLeave => "CHANNEL_LEAVE",
            MessageType::MessageChanged => "MESSAGE_CHANGED",
            MessageType::PinnedItem => "PINNED_ITEM",
            MessageType::Unknown => "UNKNOWN",
        }
    }

    /// Parse a stable string form. Unrecognized names map to `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MESSAGE" => Some(MessageType::Message),
            "BOT_MESSAGE" => Some(MessageType::BotMessage),
            "CHANNEL_JOIN" => Some(MessageType::ChannelJoin),
            "CHANNEL_LEAVE" => Some(MessageType::ChannelLeave),
            "MESSAGE_CHANGED" => Some(MessageType::MessageChanged),
            "PINNED_ITEM" => Some(MessageType::PinnedItem),
            "UNKNOWN" => Some(MessageType::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::from_name(s).ok_or_else(|| format!("unknown message type: {}", s))
    }
}

impl ToSql<Text, Sqlite> for MessageType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for MessageType {
    fn from_sql(bytes: diesel::sqlite::SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
        let name = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        // Tolerate names written by newer versions instead of failing the row.
        Ok(MessageType::from_name(&name).unwrap_or(MessageType::Unknown))
    }
}

/// A half-open time range `[start, end)`.
///
/// Every store query is inclusive of `start` and exclusive of `end`. A record
/// timestamped exactly at `end` is outside the interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// The interval covering the last `days` days, ending now (UTC).
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now().naive_utc();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_interval_half_open() {
        let interval = Interval::new(at(9), at(17));

        assert!(interval.contains(at(9)), "start boundary is inclusive");
        assert!(interval.contains(at(12)));
        assert!(!interval.contains(at(17)), "end boundary is exclusive");
        assert!(!interval.contains(at(8)));
    }

    #[test]
    fn test_message_type_round_trip() {
        for mt in [
            MessageType::Message,
            MessageType::BotMessage,
            MessageType::ChannelJoin,
            MessageType::ChannelLeave,
            MessageType::MessageChanged,
            MessageType::PinnedItem,
            MessageType::Unknown,
        ] {
            assert_eq!(MessageType::from_name(mt.as_str()), Some(mt));
        }
        assert_eq!(MessageType::from_name("NOT_A_TYPE"), None);
    }

    #[test]
    fn test_fat_message_serde() {
        let fat = FatMessage::new(
            Message {
                time: at(10),
                from_user_id: "U1".to_string(),
                text: "hello :wave:".to_string(),
                message_type: MessageType::Message,
            },
            User {
                user_id: "U1".to_string(),
                username: "jane".to_string(),
                is_bot: false,
            },
            Room {
                room_id: "R1".to_string(),
                name: "general".to_string(),
            },
        );

        let json = serde_json::to_string(&fat).unwrap();
        let back: FatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fat);
    }
}
