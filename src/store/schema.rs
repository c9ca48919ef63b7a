//! Diesel table definitions and bootstrap DDL for the mention tables.
//!
//! All three tables share the same column set; the kind is selected by the
//! table. Secondary indexes cover the grouped-aggregation access patterns
//! (by user, by room, by value, by bot flag).

diesel::table! {
    entity_mentions (id) {
        id -> Integer,
        username -> Text,
        room_name -> Text,
        mention_time -> Timestamp,
        value -> Text,
        occurrences -> Integer,
        bot -> Bool,
    }
}

diesel::table! {
    emoji_mentions (id) {
        id -> Integer,
        username -> Text,
        room_name -> Text,
        mention_time -> Timestamp,
        value -> Text,
        occurrences -> Integer,
        bot -> Bool,
    }
}

diesel::table! {
    message_summaries (id) {
        id -> Integer,
        username -> Text,
        room_name -> Text,
        mention_time -> Timestamp,
        value -> Text,
        occurrences -> Integer,
        bot -> Bool,
    }
}

/// Idempotent schema bootstrap, applied through `batch_execute` at startup.
pub const DDL: &str = "
CREATE TABLE IF NOT EXISTS entity_mentions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    room_name TEXT NOT NULL,
    mention_time TIMESTAMP NOT NULL,
    value TEXT NOT NULL,
    occurrences INTEGER NOT NULL CHECK (occurrences >= 1),
    bot BOOLEAN NOT NULL DEFAULT 0,
    UNIQUE (value, username, room_name, mention_time)
);
CREATE INDEX IF NOT EXISTS em_idx_username ON entity_mentions (username);
CREATE INDEX IF NOT EXISTS em_idx_room_name ON entity_mentions (room_name);
CREATE INDEX IF NOT EXISTS em_idx_value ON entity_mentions (value);
CREATE INDEX IF NOT EXISTS em_idx_bot ON entity_mentions (bot);

CREATE TABLE IF NOT EXISTS emoji_mentions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    room_name TEXT NOT NULL,
    mention_time TIMESTAMP NOT NULL,
    value TEXT NOT NULL,
    occurrences INTEGER NOT NULL CHECK (occurrences >= 1),
    bot BOOLEAN NOT NULL DEFAULT 0,
    UNIQUE (value, username, room_name, mention_time)
);
CREATE INDEX IF NOT EXISTS ej_idx_username ON emoji_mentions (username);
CREATE INDEX IF NOT EXISTS ej_idx_room_name ON emoji_mentions (room_name);
CREATE INDEX IF NOT EXISTS ej_idx_value ON emoji_mentions (value);
CREATE INDEX IF NOT EXISTS ej_idx_bot ON emoji_mentions (bot);

CREATE TABLE IF NOT EXISTS message_summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    room_name TEXT NOT NULL,
    mention_time TIMESTAMP NOT NULL,
    value TEXT NOT NULL,
    occurrences INTEGER NOT NULL CHECK (occurrences >= 1),
    bot BOOLEAN NOT NULL DEFAULT 0,
    UNIQUE (value, username, room_name, mention_time)
);
CREATE INDEX IF NOT EXISTS ms_idx_username ON message_summaries (username);
CREATE INDEX IF NOT EXISTS ms_idx_room_name ON message_summaries (room_name);
CREATE INDEX IF NOT EXISTS ms_idx_value ON message_summaries (value);
CREATE INDEX IF NOT EXISTS ms_idx_bot ON message_summaries (bot);
";
