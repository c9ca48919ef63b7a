//! Volatile realtime aggregation of extraction results.
//!
//! Best-effort counters for low-latency dashboards, updated as records flow
//! out of the extraction stages. Under at-least-once delivery this view may
//! double-count redelivered messages; the durable store is the source of
//! truth for analytics.

use crate::mention::{MentionKind, MentionRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

/// Counter key: one counter per (kind, value, room).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CounterKey {
    pub kind: MentionKind,
    pub value: String,
    pub room_name: String,
}

/// In-memory running counters. No persistence; reset on restart.
pub struct RealtimeAggregator {
    counters: RwLock<HashMap<CounterKey, i64>>,
}

impl RealtimeAggregator {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Apply one extraction result to the running counters.
    pub fn record(&self, record: &MentionRecord) {
        let key = CounterKey {
            kind: record.kind(),
            value: record.value_label(),
            room_name: record.room_name().to_string(),
        };
        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        *counters.entry(key).or_insert(0) += i64::from(record.occurrences());
    }

    /// Snapshot of all current counters.
    pub fn snapshot(&self) -> HashMap<CounterKey, i64> {
        self.counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Total occurrences recorded for one kind since startup (or last reset).
    pub fn total_for_kind(&self, kind: MentionKind) -> i64 {
        self.counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn counter_count(&self) -> usize {
        self.counters.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn reset(&self) {
        self.counters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for RealtimeAggregator {
    fn default() -> Self {
        Self::new()
    }
}
