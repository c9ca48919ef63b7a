//! Integration tests for the analytics engine against a real store: activity
//! shares, row-count capping, volume merging, and room similarity.

use chatstats::analytics::{ActiveColumn, AnalyticsEngine};
use chatstats::mention::{EmojiMention, MessageSummary};
use chatstats::model::{Interval, MessageType};
use chatstats::store::{Database, MentionStore, MentionableDao};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tempfile::TempDir;

fn open_engine() -> (TempDir, Arc<MentionStore>, AnalyticsEngine) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("analytics.db");
    let database = Database::open(path.to_str().unwrap()).expect("Failed to open database");
    let store = Arc::new(MentionStore::new(&database));
    let engine = AnalyticsEngine::new(Arc::clone(&store));
    (dir, store, engine)
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 15)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn day() -> Interval {
    Interval::new(at(0, 0), at(23, 59))
}

fn emoji(user: &str, room: &str, time: NaiveDateTime, code: &str, occurrences: i32) -> EmojiMention {
    EmojiMention::new(user, room, time, code, occurrences, false)
}

#[test]
fn test_activity_shares_sum_to_one_ascending() {
    let (_dir, store, engine) = open_engine();

    // 8 occurrences total: r1..r3 one each, r4 two, r5 three.
    store.emoji.persist(&emoji("u1", "r1", at(10, 0), "wave", 1)).unwrap();
    store.emoji.persist(&emoji("u1", "r2", at(10, 1), "wave", 1)).unwrap();
    store.emoji.persist(&emoji("u1", "r3", at(10, 2), "wave", 1)).unwrap();
    store.emoji.persist(&emoji("u1", "r4", at(10, 3), "wave", 2)).unwrap();
    store.emoji.persist(&emoji("u1", "r5", at(10, 4), "wave", 3)).unwrap();

    let shares = engine
        .active_columns_by_total_variation(ActiveColumn::Room, &day(), 10)
        .unwrap();

    assert_eq!(shares.len(), 5);
    assert_eq!(shares["r5"], 0.375);
    assert_eq!(shares["r4"], 0.25);
    assert_eq!(shares["r1"], 0.125);

    let total: f64 = shares.values().sum();
    assert!((total - 1.0).abs() < 1e-9, "shares form a distribution");

    let values: Vec<f64> = shares.values().cloned().collect();
    for window in values.windows(2) {
        assert!(window[0] <= window[1], "presented ascending by share");
    }
}

#[test]
fn test_activity_cap_keeps_largest_groups() {
    let (_dir, store, engine) = open_engine();

    store.emoji.persist(&emoji("u1", "quiet", at(10, 0), "wave", 1)).unwrap();
    store.emoji.persist(&emoji("u1", "busy", at(10, 1), "wave", 10)).unwrap();
    store.emoji.persist(&emoji("u1", "mid", at(10, 2), "wave", 5)).unwrap();

    let shares = engine
        .active_columns_by_total_variation(ActiveColumn::Room, &day(), 2)
        .unwrap();

    assert_eq!(shares.len(), 2);
    assert!(shares.contains_key("busy"));
    assert!(shares.contains_key("mid"));
    assert!(!shares.contains_key("quiet"), "cap discards the smallest groups");
}

#[test]
fn test_activity_by_user_column() {
    let (_dir, store, engine) = open_engine();

    store.emoji.persist(&emoji("jane", "general", at(10, 0), "wave", 3)).unwrap();
    store.emoji.persist(&emoji("omar", "general", at(10, 1), "wave", 1)).unwrap();

    let shares = engine
        .active_columns_by_total_variation(ActiveColumn::User, &day(), 10)
        .unwrap();

    assert_eq!(shares["jane"], 0.75);
    assert_eq!(shares["omar"], 0.25);
}

#[test]
fn test_volume_shares_merge_emoji_and_summaries() {
    let (_dir, store, engine) = open_engine();

    store.emoji.persist(&emoji("u1", "r1", at(10, 0), "wave", 2)).unwrap();
    store
        .summaries
        .persist(&MessageSummary::new("u2", "r2", at(10, 1), MessageType::Message, false))
        .unwrap();

    let shares = engine
        .active_columns_by_message_volume(ActiveColumn::Room, &day(), 10)
        .unwrap();

    // 2 emoji occurrences in r1, 1 summary event in r2: 3 total.
    assert!((shares["r1"] - 2.0 / 3.0).abs() < 1e-9);
    assert!((shares["r2"] - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_room_similarity_matrix() {
    let (_dir, store, engine) = open_engine();

    // r1 and r2 have proportional emoji vectors; r3 is disjoint.
    store.emoji.persist(&emoji("u1", "r1", at(10, 0), "wave", 2)).unwrap();
    store.emoji.persist(&emoji("u1", "r1", at(10, 1), "smile", 1)).unwrap();
    store.emoji.persist(&emoji("u2", "r2", at(10, 2), "wave", 4)).unwrap();
    store.emoji.persist(&emoji("u2", "r2", at(10, 3), "smile", 2)).unwrap();
    store.emoji.persist(&emoji("u3", "r3", at(10, 4), "tada", 5)).unwrap();

    let matrix = engine.room_similarities_by_value(&day()).unwrap();

    assert_eq!(matrix.labels(), &["r1", "r2", "r3"], "labels sorted");
    assert_eq!(matrix.len(), 3);

    for i in 0..3 {
        assert!((matrix.get(i, i) - 1.0).abs() < 1e-9, "self-similarity is 1");
    }
    assert!((matrix.get(0, 1) - 1.0).abs() < 1e-9, "proportional vectors score 1");
    assert_eq!(matrix.get(0, 2), 0.0, "disjoint vectors score 0");
    assert_eq!(matrix.get(1, 0), matrix.get(0, 1), "symmetric");
}

#[test]
fn test_room_similarity_seven_rooms() {
    let (_dir, store, engine) = open_engine();

    // 16 records over 7 rooms and 8 distinct emoji values.
    let records = [
        ("r1", "alpha", 2),
        ("r1", "bravo", 1),
        ("r1", "charlie", 1),
        ("r2", "alpha", 4),
        ("r2", "bravo", 2),
        ("r3", "charlie", 3),
        ("r3", "delta", 1),
        ("r4", "echo", 2),
        ("r4", "foxtrot", 2),
        ("r4", "golf", 1),
        ("r5", "hotel", 5),
        ("r5", "golf", 1),
        ("r6", "alpha", 1),
        ("r6", "charlie", 1),
        ("r7", "hotel", 2),
        ("r7", "golf", 2),
    ];
    for (i, (room, code, occurrences)) in records.iter().enumerate() {
        store
            .emoji
            .persist(&emoji("u1", room, at(10, i as u32), code, *occurrences))
            .unwrap();
    }

    let matrix = engine.room_similarities_by_value(&day()).unwrap();

    assert_eq!(matrix.len(), 7);
    assert_eq!(
        matrix.labels(),
        &["r1", "r2", "r3", "r4", "r5", "r6", "r7"]
    );
    for i in 0..7 {
        assert!((matrix.get(i, i) - 1.0).abs() < 1e-9);
        for j in 0..7 {
            let score = matrix.get(i, j);
            assert!((0.0..=1.0 + 1e-9).contains(&score));
            assert_eq!(score, matrix.get(j, i));
        }
    }
    // r3 {charlie, delta} and r7 {hotel, golf} share no values.
    assert_eq!(matrix.get(2, 6), 0.0);
}

#[test]
fn test_empty_store_yields_empty_results() {
    let (_dir, _store, engine) = open_engine();

    let shares = engine
        .active_columns_by_total_variation(ActiveColumn::Room, &day(), 10)
        .unwrap();
    assert!(shares.is_empty());

    let matrix = engine.room_similarities_by_value(&day()).unwrap();
    assert!(matrix.is_empty());

    let top = engine.top_emoji(&day(), &[], &[], 10).unwrap();
    assert!(top.is_empty());
}
