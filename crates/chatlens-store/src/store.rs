use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use chatlens_core::{MessageKind, MessageRecord, Sender};

use crate::key::ContentKey;

/// Counts over the collected records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total: usize,
    pub me: usize,
    pub other: usize,
    pub text: usize,
    pub image: usize,
    pub with_timestamp: usize,
    pub without_timestamp: usize,
}

impl CollectionStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MessageRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.sender {
                Sender::Me => stats.me += 1,
                Sender::Other => stats.other += 1,
            }
            match record.kind {
                MessageKind::Text => stats.text += 1,
                MessageKind::Image => stats.image += 1,
            }
            if record.timestamp.is_some() {
                stats.with_timestamp += 1;
            } else {
                stats.without_timestamp += 1;
            }
        }
        stats
    }

    /// Share of `count` in the total, as a percentage.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}

/// Records keyed by content. Existing entries are never replaced.
#[derive(Debug, Default)]
pub struct CollectedStore {
    records: HashMap<ContentKey, MessageRecord>,
}

impl CollectedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.records.contains_key(key)
    }

    /// Insert a record under `key`. Returns false, leaving the stored record
    /// untouched, when the key is already present.
    pub fn insert(&mut self, key: ContentKey, record: MessageRecord) -> bool {
        if self.records.contains_key(&key) {
            debug!("Duplicate content key {}, keeping first record", key);
            return false;
        }
        self.records.insert(key, record);
        true
    }

    pub fn get(&self, key: &ContentKey) -> Option<&MessageRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, newest first.
    ///
    /// Timestamped records come before untimestamped ones. Timestamped
    /// records sort by descending timestamp, ties by descending sequence;
    /// untimestamped records sort by descending sequence.
    pub fn snapshot(&self) -> Vec<MessageRecord> {
        let mut records: Vec<MessageRecord> = self.records.values().cloned().collect();
        records.sort_by(newest_first);
        records
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats::from_records(self.records.values())
    }
}

fn newest_first(a: &MessageRecord, b: &MessageRecord) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) => tb.cmp(&ta).then(b.sequence.cmp(&a.sequence)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.sequence.cmp(&a.sequence),
    }
}
