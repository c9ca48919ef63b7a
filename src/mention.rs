//! The mentionable abstraction: facts-with-counts extracted from chat messages.
//!
//! Each concrete kind ([`EntityMention`], [`EmojiMention`], [`MessageSummary`])
//! is persisted in its own table and implements [`Mentionable`], the capability
//! the store and analytics layers are written against. [`MentionRecord`] is the
//! tagged fan-in type flowing from extraction stages to the store and the
//! realtime aggregator.

use crate::model::MessageType;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Tag identifying a concrete mentionable kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    Entity,
    Emoji,
    Summary,
}

impl MentionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentionKind::Entity => "entity",
            MentionKind::Emoji => "emoji",
            MentionKind::Summary => "summary",
        }
    }
}

impl fmt::Display for MentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fact-with-count extracted from one chat message.
///
/// The identity tuple for persistence is `(value, username, room_name,
/// mention_time)`; `occurrences` is payload, not identity. Records are
/// create-only: once stored they are never mutated.
pub trait Mentionable: Clone + Send + Sync + 'static {
    const KIND: MentionKind;

    /// The value type occurrence statistics are grouped by.
    type Value: Clone + PartialEq + Eq + Hash + fmt::Display + Send + Sync;

    fn value(&self) -> &Self::Value;
    fn occurrences(&self) -> i32;
    fn mention_time(&self) -> NaiveDateTime;
    fn username(&self) -> &str;
    fn room_name(&self) -> &str;
    fn is_bot(&self) -> bool;
}

/// A mention of a recognized entity (proper noun or phrase).
///
/// `occurrences` counts how many times the normalized phrase appeared in one
/// message; `mention_time` is the message timestamp for all records emitted
/// from that message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = crate::store::schema::entity_mentions)]
pub struct EntityMention {
    pub username: String,
    pub room_name: String,
    pub mention_time: NaiveDateTime,
    pub value: String,
    pub occurrences: i32,
    pub bot: bool,
}

impl EntityMention {
    pub fn new(
        username: impl Into<String>,
        room_name: impl Into<String>,
        mention_time: NaiveDateTime,
        value: impl Into<String>,
        occurrences: i32,
        bot: bool,
    ) -> Self {
        Self {
            username: username.into(),
            room_name: room_name.into(),
            mention_time,
            value: value.into(),
            occurrences,
            bot,
        }
    }
}

impl Mentionable for EntityMention {
    const KIND: MentionKind = MentionKind::Entity;
    type Value = String;

    fn value(&self) -> &String {
        &self.value
    }
    fn occurrences(&self) -> i32 {
        self.occurrences
    }
    fn mention_time(&self) -> NaiveDateTime {
        self.mention_time
    }
    fn username(&self) -> &str {
        &self.username
    }
    fn room_name(&self) -> &str {
        &self.room_name
    }
    fn is_bot(&self) -> bool {
        self.bot
    }
}

/// A mention of an emoji. `value` is the short-code alias without `:`
/// delimiters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = crate::store::schema::emoji_mentions)]
pub struct EmojiMention {
    pub username: String,
    pub room_name: String,
    pub mention_time: NaiveDateTime,
    pub value: String,
    pub occurrences: i32,
    pub bot: bool,
}

impl EmojiMention {
    pub fn new(
        username: impl Into<String>,
        room_name: impl Into<String>,
        mention_time: NaiveDateTime,
        value: impl Into<String>,
        occurrences: i32,
        bot: bool,
    ) -> Self {
        Self {
            username: username.into(),
            room_name: room_name.into(),
            mention_time,
            value: value.into(),
            occurrences,
            bot,
        }
    }
}

impl Mentionable for EmojiMention {
    const KIND: MentionKind = MentionKind::Emoji;
    type Value = String;

    fn value(&self) -> &String {
        &self.value
    }
    fn occurrences(&self) -> i32 {
        self.occurrences
    }
    fn mention_time(&self) -> NaiveDateTime {
        self.mention_time
    }
    fn username(&self) -> &str {
        &self.username
    }
    fn room_name(&self) -> &str {
        &self.room_name
    }
    fn is_bot(&self) -> bool {
        self.bot
    }
}

/// Summary event for one chat message, used purely for volume counting.
///
/// Carries no message text; `value` is the classified [`MessageType`] and
/// `occurrences` is always 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = crate::store::schema::message_summaries)]
pub struct MessageSummary {
    pub username: String,
    pub room_name: String,
    pub mention_time: NaiveDateTime,
    pub value: MessageType,
    pub occurrences: i32,
    pub bot: bool,
}

impl MessageSummary {
    pub fn new(
        username: impl Into<String>,
        room_name: impl Into<String>,
        mention_time: NaiveDateTime,
        value: MessageType,
        bot: bool,
    ) -> Self {
        Self {
            username: username.into(),
            room_name: room_name.into(),
            mention_time,
            value,
            occurrences: 1,
            bot,
        }
    }
}

impl Mentionable for MessageSummary {
    const KIND: MentionKind = MentionKind::Summary;
    type Value = MessageType;

    fn value(&self) -> &MessageType {
        &self.value
    }
    fn occurrences(&self) -> i32 {
        self.occurrences
    }
    fn mention_time(&self) -> NaiveDateTime {
        self.mention_time
    }
    fn username(&self) -> &str {
        &self.username
    }
    fn room_name(&self) -> &str {
        &self.room_name
    }
    fn is_bot(&self) -> bool {
        self.bot
    }
}

/// Tagged union of all mentionable kinds, used between the extraction stages
/// and the downstream sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MentionRecord {
    Entity(EntityMention),
    Emoji(EmojiMention),
    Summary(MessageSummary),
}

impl MentionRecord {
    pub fn kind(&self) -> MentionKind {
        match self {
            MentionRecord::Entity(_) => MentionKind::Entity,
            MentionRecord::Emoji(_) => MentionKind::Emoji,
            MentionRecord::Summary(_) => MentionKind::Summary,
        }
    }

    /// Display form of the record's value, used for counter keys and logging.
    pub fn value_label(&self) -> String {
        match self {
            MentionRecord::Entity(m) => m.value.clone(),
            MentionRecord::Emoji(m) => m.value.clone(),
            MentionRecord::Summary(m) => m.value.to_string(),
        }
    }

    pub fn room_name(&self) -> &str {
        match self {
            MentionRecord::Entity(m) => &m.room_name,
            MentionRecord::Emoji(m) => &m.room_name,
            MentionRecord::Summary(m) => &m.room_name,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            MentionRecord::Entity(m) => &m.username,
            MentionRecord::Emoji(m) => &m.username,
            MentionRecord::Summary(m) => &m.username,
        }
    }

    pub fn occurrences(&self) -> i32 {
        match self {
            MentionRecord::Entity(m) => m.occurrences,
            MentionRecord::Emoji(m) => m.occurrences,
            MentionRecord::Summary(m) => m.occurrences,
        }
    }
}
