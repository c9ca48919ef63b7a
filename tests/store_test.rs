//! Integration tests for the mention store: identity-tuple duplicate
//! rejection, interval semantics, filters, and rank-ordered top values.

use chatstats::error::StoreError;
use chatstats::mention::{EmojiMention, MessageSummary};
use chatstats::model::{Interval, MessageType};
use chatstats::store::{Database, MentionStore, MentionableDao};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

fn open_store() -> (TempDir, MentionStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("store.db");
    let database = Database::open(path.to_str().unwrap()).expect("Failed to open database");
    let store = MentionStore::new(&database);
    (dir, store)
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn emoji(user: &str, room: &str, time: NaiveDateTime, code: &str, occurrences: i32) -> EmojiMention {
    EmojiMention::new(user, room, time, code, occurrences, false)
}

#[test]
fn test_duplicate_insert_preserves_original() {
    let (_dir, store) = open_store();

    let original = emoji("jane", "general", at(15, 12), "wave", 2);
    store.emoji.persist(&original).unwrap();

    // Same identity tuple, different occurrence count.
    let replay = emoji("jane", "general", at(15, 12), "wave", 5);
    match store.emoji.persist(&replay) {
        Err(StoreError::Duplicate(_)) => {}
        other => panic!("expected Duplicate, got {:?}", other),
    }

    let stored = store.emoji.get(&replay).unwrap();
    assert_eq!(stored.occurrences, 2, "first write wins");

    let interval = Interval::new(at(15, 0), at(16, 0));
    let total = store
        .emoji
        .get_total_mentions(None, &interval, &[], &[])
        .unwrap();
    assert_eq!(total, 2);
}

#[test]
fn test_concurrent_inserts_resolve_to_one_winner() {
    let (_dir, store) = open_store();
    let store = std::sync::Arc::new(store);
    let record = emoji("jane", "general", at(15, 12), "wave", 2);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = std::sync::Arc::clone(&store);
            let record = record.clone();
            std::thread::spawn(move || store.emoji.persist(&record))
        })
        .collect();

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) => successes += 1,
            Err(StoreError::Duplicate(_)) => duplicates += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(successes, 1, "the unique index picks exactly one winner");
    assert_eq!(duplicates, 7);

    let interval = Interval::new(at(15, 0), at(16, 0));
    let total = store
        .emoji
        .get_total_mentions(None, &interval, &[], &[])
        .unwrap();
    assert_eq!(total, 2);
}

#[test]
fn test_interval_boundaries_half_open() {
    let (_dir, store) = open_store();

    store.emoji.persist(&emoji("jane", "general", at(15, 9), "wave", 1)).unwrap();
    store.emoji.persist(&emoji("jane", "general", at(15, 17), "wave", 1)).unwrap();

    let interval = Interval::new(at(15, 9), at(15, 17));
    let records = store
        .emoji
        .get_all_mentions(None, &interval, &[], &[])
        .unwrap();
    assert_eq!(records.len(), 1, "start inclusive, end exclusive");
    assert_eq!(records[0].mention_time, at(15, 9));

    let total = store
        .emoji
        .get_total_mentions(None, &interval, &[], &[])
        .unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_totals_additive_over_disjoint_intervals() {
    let (_dir, store) = open_store();

    store.emoji.persist(&emoji("jane", "general", at(15, 10), "wave", 3)).unwrap();
    store.emoji.persist(&emoji("jane", "general", at(15, 20), "tada", 1)).unwrap();
    store.emoji.persist(&emoji("jane", "general", at(16, 10), "wave", 4)).unwrap();

    let day_one = Interval::new(at(15, 0), at(16, 0));
    let day_two = Interval::new(at(16, 0), at(17, 0));
    let both = Interval::new(at(15, 0), at(17, 0));

    let t1 = store.emoji.get_total_mentions(None, &day_one, &[], &[]).unwrap();
    let t2 = store.emoji.get_total_mentions(None, &day_two, &[], &[]).unwrap();
    let t_both = store.emoji.get_total_mentions(None, &both, &[], &[]).unwrap();

    assert_eq!(t1, 4);
    assert_eq!(t2, 4);
    assert_eq!(t_both, t1 + t2);
}

#[test]
fn test_total_with_value_filter() {
    let (_dir, store) = open_store();

    store.emoji.persist(&emoji("jane", "general", at(15, 10), "wave", 3)).unwrap();
    store.emoji.persist(&emoji("omar", "general", at(15, 11), "wave", 2)).unwrap();
    store.emoji.persist(&emoji("jane", "general", at(15, 12), "tada", 7)).unwrap();

    let interval = Interval::new(at(15, 0), at(16, 0));
    let wave = store
        .emoji
        .get_total_mentions(Some(&"wave".to_string()), &interval, &[], &[])
        .unwrap();
    assert_eq!(wave, 5);

    let missing = store
        .emoji
        .get_total_mentions(Some(&"shrug".to_string()), &interval, &[], &[])
        .unwrap();
    assert_eq!(missing, 0, "empty matching set sums to zero");
}

#[test]
fn test_top_values_rank_order_and_limit() {
    let (_dir, store) = open_store();

    store.emoji.persist(&emoji("jane", "general", at(15, 10), "wave", 3)).unwrap();
    store.emoji.persist(&emoji("omar", "random", at(15, 11), "wave", 2)).unwrap();
    store.emoji.persist(&emoji("jane", "general", at(15, 12), "smile", 2)).unwrap();
    store.emoji.persist(&emoji("omar", "general", at(15, 13), "tada", 1)).unwrap();

    let interval = Interval::new(at(15, 0), at(16, 0));
    let top = store.emoji.get_top_values(&interval, &[], &[], 2).unwrap();

    let ranked: Vec<(String, i64)> = top.into_iter().collect();
    assert_eq!(
        ranked,
        vec![("wave".to_string(), 5), ("smile".to_string(), 2)],
        "rank order preserved, truncated at limit"
    );
}

#[test]
fn test_filters_conjoin_across_dimensions() {
    let (_dir, store) = open_store();

    let mut hour = 9;
    for user in ["jane", "omar"] {
        for room in ["general", "random"] {
            store.emoji.persist(&emoji(user, room, at(15, hour), "wave", 1)).unwrap();
            hour += 1;
        }
    }

    let interval = Interval::new(at(15, 0), at(16, 0));
    let general = vec!["general".to_string()];
    let jane = vec!["jane".to_string()];
    let both_rooms = vec!["general".to_string(), "random".to_string()];

    let total = |rooms: &[String], users: &[String]| {
        store.emoji.get_total_mentions(None, &interval, rooms, users).unwrap()
    };

    assert_eq!(total(&[], &[]), 4, "no restriction");
    assert_eq!(total(&general, &[]), 2);
    assert_eq!(total(&[], &jane), 2);
    assert_eq!(total(&general, &jane), 1, "dimensions conjoin");
    assert_eq!(total(&both_rooms, &jane), 2, "within a dimension the set is a disjunction");
}

#[test]
fn test_get_missing_is_not_found() {
    let (_dir, store) = open_store();

    let template = emoji("nobody", "nowhere", at(15, 12), "ghost", 1);
    match store.emoji.get(&template) {
        Err(StoreError::NotFound) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_summaries_group_by_message_type() {
    let (_dir, store) = open_store();

    store
        .summaries
        .persist(&MessageSummary::new("jane", "general", at(15, 10), MessageType::Message, false))
        .unwrap();
    store
        .summaries
        .persist(&MessageSummary::new("omar", "general", at(15, 11), MessageType::Message, false))
        .unwrap();
    store
        .summaries
        .persist(&MessageSummary::new("omar", "general", at(15, 12), MessageType::ChannelJoin, false))
        .unwrap();

    let interval = Interval::new(at(15, 0), at(16, 0));
    let top = store.summaries.get_top_values(&interval, &[], &[], 10).unwrap();

    let ranked: Vec<(MessageType, i64)> = top.into_iter().collect();
    assert_eq!(
        ranked,
        vec![(MessageType::Message, 2), (MessageType::ChannelJoin, 1)]
    );
}
