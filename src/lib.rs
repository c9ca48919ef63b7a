//! # Chatstats: chat activity analytics
//!
//! Chatstats ingests a stream of chat messages, extracts "mentionable" facts
//! from each one (named entities, emoji usage, message-type summaries),
//! persists aggregated occurrence statistics, and answers analytical queries
//! over them.
//!
//! ## Architecture
//!
//! ```text
//! [Source] → [Pipeline] → {entity, emoji, summary} stages (parallel)
//!                              ↓                ↓
//!                       [Mention Store]  [Realtime Aggregator]
//!                              ↑
//!                      [Analytics Engine]
//! ```
//!
//! - **Sources** (`source`): local fixtures, JSONL backfill, or a NATS
//!   JetStream live feed, all exposed as at-least-once message sequences.
//! - **Pipeline** (`pipeline`): bounded worker pool per extraction stage;
//!   broadcast across stage types, round-robin within a pool.
//! - **Store** (`store`): Diesel/SQLite occurrence records with a unique
//!   identity tuple per record; duplicate rejection makes redelivery safe.
//! - **Analytics** (`analytics`): top-K rankings, activity-share rankings,
//!   and cross-room similarity matrices, read fresh from the store per query.

pub mod analytics;
pub mod config;
pub mod error;
pub mod extraction;
pub mod mention;
pub mod model;
pub mod pipeline;
pub mod realtime;
pub mod source;
pub mod store;

// Re-export key types
pub use analytics::{ActiveColumn, AnalyticsEngine, LabeledMatrix};
pub use config::{ChatStatsConfig, SourceConfig, SourceKind};
pub use error::{ExtractionError, RecognizerError, StoreError};
pub use extraction::{
    default_stages, CapitalizedPhraseRecognizer, EntityRecognizer, ExtractionStage,
};
pub use mention::{
    EmojiMention, EntityMention, MentionKind, MentionRecord, Mentionable, MessageSummary,
};
pub use model::{FatMessage, Interval, Message, MessageType, Room, User};
pub use pipeline::{Pipeline, PipelineConfig};
pub use realtime::RealtimeAggregator;
pub use source::{spawn_source, ChatMessageEnvelope, NatsPublisher};
pub use store::{Database, DatabaseConfig, MentionStore, MentionableDao};
