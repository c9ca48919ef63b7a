//! Analytics engine: stateless queries over the mentionable store.
//!
//! Every query is a deterministic function of store state at call time; no
//! caching layer sits between the engine and the store.

pub mod matrix;

pub use matrix::{cosine_similarity, LabeledMatrix};

use crate::error::StoreError;
use crate::mention::Mentionable;
use crate::model::{Interval, MessageType};
use crate::store::{MentionStore, MentionableDao};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Grouping key for activity-share rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveColumn {
    Room,
    User,
}

impl ActiveColumn {
    fn key<T: Mentionable>(&self, record: &T) -> String {
        match self {
            ActiveColumn::Room => record.room_name().to_string(),
            ActiveColumn::User => record.username().to_string(),
        }
    }
}

/// Stateless query layer over the store's DAO contract.
pub struct AnalyticsEngine {
    store: Arc<MentionStore>,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<MentionStore>) -> Self {
        Self { store }
    }

    /// Top entity values by summed occurrences, rank order preserved.
    pub fn top_entities(
        &self,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
        limit: usize,
    ) -> Result<IndexMap<String, i64>, StoreError> {
        self.store.entities.get_top_values(interval, rooms, users, limit)
    }

    /// Top emoji by summed occurrences.
    pub fn top_emoji(
        &self,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
        limit: usize,
    ) -> Result<IndexMap<String, i64>, StoreError> {
        self.store.emoji.get_top_values(interval, rooms, users, limit)
    }

    /// Message volume broken down by message type.
    pub fn top_message_types(
        &self,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
        limit: usize,
    ) -> Result<IndexMap<MessageType, i64>, StoreError> {
        self.store.summaries.get_top_values(interval, rooms, users, limit)
    }

    /// Total entity mentions, optionally restricted to one value.
    pub fn total_entities(
        &self,
        value: Option<&String>,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
    ) -> Result<i64, StoreError> {
        self.store.entities.get_total_mentions(value, interval, rooms, users)
    }

    /// Total emoji mentions, optionally restricted to one short-code.
    pub fn total_emoji(
        &self,
        value: Option<&String>,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
    ) -> Result<i64, StoreError> {
        self.store.emoji.get_total_mentions(value, interval, rooms, users)
    }

    /// Total message events, optionally restricted to one message type.
    pub fn total_messages(
        &self,
        value: Option<&MessageType>,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
    ) -> Result<i64, StoreError> {
        self.store.summaries.get_total_mentions(value, interval, rooms, users)
    }

    /// Activity share per column value, computed over emoji mentions.
    ///
    /// Each group's summed occurrences are divided by the grand total across
    /// all groups in the interval, yielding a distribution over column values
    /// that sums to 1.0. The `limit` largest groups are kept (row-count cap)
    /// and returned **ascending** by share.
    pub fn active_columns_by_total_variation(
        &self,
        column: ActiveColumn,
        interval: &Interval,
        limit: usize,
    ) -> Result<IndexMap<String, f64>, StoreError> {
        let records = self.store.emoji.get_all_mentions(None, interval, &[], &[])?;
        let pairs = records
            .iter()
            .map(|r| (column.key(r), i64::from(r.occurrences())));
        Ok(column_shares(pairs, limit))
    }

    /// Activity share per column value, computed over combined message volume:
    /// emoji mentions and message summaries merged additively with equal
    /// weight.
    pub fn active_columns_by_message_volume(
        &self,
        column: ActiveColumn,
        interval: &Interval,
        limit: usize,
    ) -> Result<IndexMap<String, f64>, StoreError> {
        let emoji = self.store.emoji.get_all_mentions(None, interval, &[], &[])?;
        let summaries = self
            .store
            .summaries
            .get_all_mentions(None, interval, &[], &[])?;

        let pairs = emoji
            .iter()
            .map(|r| (column.key(r), i64::from(r.occurrences())))
            .chain(
                summaries
                    .iter()
                    .map(|r| (column.key(r), i64::from(r.occurrences()))),
            );
        Ok(column_shares(pairs, limit))
    }

    /// Cross-room similarity over mentioned emoji values.
    ///
    /// For each room active in the interval, builds a sparse
    /// `value -> summed occurrences` vector restricted to that room, then
    /// scores every room pair by cosine similarity over the shared value
    /// space. Labels are the sorted distinct room names; rows and columns use
    /// the same order.
    pub fn room_similarities_by_value(
        &self,
        interval: &Interval,
    ) -> Result<LabeledMatrix<String>, StoreError> {
        let records = self.store.emoji.get_all_mentions(None, interval, &[], &[])?;

        // BTreeMap keeps label order deterministic.
        let mut vectors: BTreeMap<String, HashMap<String, f64>> = BTreeMap::new();
        for record in &records {
            let vector = vectors.entry(record.room_name.clone()).or_default();
            *vector.entry(record.value.clone()).or_insert(0.0) +=
                f64::from(record.occurrences);
        }

        let labels: Vec<String> = vectors.keys().cloned().collect();
        let rows: Vec<&HashMap<String, f64>> = vectors.values().collect();
        let n = labels.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let score = cosine_similarity(rows[i], rows[j]);
                matrix[i][j] = score;
                matrix[j][i] = score;
            }
        }

        Ok(LabeledMatrix::new(labels, matrix))
    }
}

/// Group (key, occurrences) pairs, normalize sums into shares of the grand
/// total, keep the `limit` largest groups, and return ascending by share.
/// Ties order by key so results are deterministic.
fn column_shares(
    pairs: impl Iterator<Item = (String, i64)>,
    limit: usize,
) -> IndexMap<String, f64> {
    let mut sums: HashMap<String, i64> = HashMap::new();
    let mut grand_total: i64 = 0;
    for (key, occurrences) in pairs {
        *sums.entry(key).or_insert(0) += occurrences;
        grand_total += occurrences;
    }

    if grand_total == 0 {
        return IndexMap::new();
    }

    let mut shares: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(key, total)| (key, total as f64 / grand_total as f64))
        .collect();

    // Largest shares win the cap; ascending order is the presentation contract.
    shares.sort_by(|a, b| match b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    shares.truncate(limit);
    shares.sort_by(|a, b| match a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    shares.into_iter().collect()
}
