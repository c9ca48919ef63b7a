//! Deterministic fixture source for demos and integration tests.

use super::should_stop;
use crate::config::SourceConfig;
use crate::model::{FatMessage, Message, MessageType, Room, User};
use chrono::{Duration, Utc};
use tokio::sync::{mpsc, watch};

const USERS: &[(&str, bool)] = &[
    ("jane", false),
    ("giannis", false),
    ("ana", false),
    ("deploybot", true),
];

const ROOMS: &[&str] = &["general", "engineering", "random"];

const TEXTS: &[&str] = &[
    "Jane Doe is going to climb Mount Everest :tada:",
    "deploy finished :rocket: :rocket:",
    "lunch at Blue Bottle anyone? :coffee:",
    "reviewing the Storm Topology doc",
    "gg :+1:",
    "has anyone seen Giannis Antetokounmpo play? :basketball:",
];

/// Emit `message_count` synthetic messages by cycling through a fixed corpus
/// of users, rooms, and texts. Timestamps walk backwards one minute per
/// message from now, so a freshly generated batch always lands inside a
/// "recent days" query interval with distinct identity tuples.
pub async fn run(
    config: SourceConfig,
    tx: mpsc::Sender<FatMessage>,
    stop: watch::Receiver<bool>,
) {
    let count = config.message_count;
    let now = Utc::now().naive_utc();
    tracing::info!(count, "local test source starting");

    for i in 0..count {
        if should_stop(&stop) {
            tracing::info!(emitted = i, "local test source stopped");
            return;
        }

        let (username, is_bot) = USERS[i % USERS.len()];
        let room = ROOMS[i % ROOMS.len()];
        let text = TEXTS[i % TEXTS.len()];
        let message_type = if i % 17 == 0 {
            MessageType::ChannelJoin
        } else {
            MessageType::Message
        };

        let fat = FatMessage::new(
            Message {
                time: now - Duration::minutes(i as i64),
                from_user_id: format!("U{}", i % USERS.len()),
                text: text.to_string(),
                message_type,
            },
            User {
                user_id: format!("U{}", i % USERS.len()),
                username: username.to_string(),
                is_bot,
            },
            Room {
                room_id: format!("R{}", i % ROOMS.len()),
                name: room.to_string(),
            },
        );

        if tx.send(fat).await.is_err() {
            tracing::info!(emitted = i, "pipeline closed; local test source stopped");
            return;
        }
    }
    tracing::info!(count, "local test source exhausted");
}
