use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stormwatch_common::Record;
use tokio::sync::{broadcast, RwLock};

use super::{FeedError, FeedSource, FeedTail};

const NOTIFY_CAPACITY: usize = 1024;
const TIME_FIELD: &str = "time_tag";

#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: usize,
}

/// In-memory append-only log for one feed. Inserts are announced to every
/// open tail; in-place replacements are not.
pub struct FeedLog {
    name: String,
    history: usize,
    rows: RwLock<VecDeque<Record>>,
    inserts: broadcast::Sender<Arc<Record>>,
}

impl FeedLog {
    pub fn new(name: impl Into<String>, history: usize) -> Self {
        let (inserts, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            name: name.into(),
            history: history.max(1),
            rows: RwLock::new(VecDeque::new()),
            inserts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert(&self, record: Record) {
        self.upsert(record, &[]).await;
    }

    /// Replaces the record matching `unique_keys`, or appends and notifies
    /// when there is no match. Only keys present in `record` take part in
    /// the match; with none present the record is always appended.
    ///
    /// Returns `true` when the record was appended.
    pub async fn upsert(&self, record: Record, unique_keys: &[String]) -> bool {
        let filter: Vec<(&String, &Value)> = unique_keys
            .iter()
            .filter_map(|k| record.get(k).map(|v| (k, v)))
            .collect();

        let mut rows = self.rows.write().await;

        if !filter.is_empty() {
            let existing = rows
                .iter()
                .position(|row| filter.iter().all(|(k, v)| row.get(*k) == Some(*v)));
            if let Some(idx) = existing {
                rows[idx] = record;
                return false;
            }
        }

        let record = Arc::new(record);
        rows.push_back(Record::clone(&record));
        while rows.len() > self.history {
            rows.pop_front();
        }
        // no open tails is fine
        let _ = self.inserts.send(record);
        true
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Newest-first read filtered on the `time_tag` field. Bounds compare
    /// as ISO-8601 strings and are inclusive.
    pub async fn query(&self, query: &FeedQuery) -> Vec<Record> {
        let rows = self.rows.read().await;
        rows.iter()
            .rev()
            .filter(|row| in_range(row, query))
            .take(query.limit)
            .cloned()
            .collect()
    }

    pub fn tail(&self) -> FeedLogTail {
        FeedLogTail {
            feed: self.name.clone(),
            rx: self.inserts.subscribe(),
        }
    }
}

fn in_range(row: &Record, query: &FeedQuery) -> bool {
    if query.start.is_none() && query.end.is_none() {
        return true;
    }
    let Some(ts) = row.get(TIME_FIELD).and_then(Value::as_str) else {
        return false;
    };
    if let Some(start) = &query.start {
        if ts < start.as_str() {
            return false;
        }
    }
    if let Some(end) = &query.end {
        if ts > end.as_str() {
            return false;
        }
    }
    true
}

#[async_trait]
impl FeedSource for FeedLog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<Box<dyn FeedTail>, FeedError> {
        Ok(Box::new(self.tail()))
    }
}

pub struct FeedLogTail {
    feed: String,
    rx: broadcast::Receiver<Arc<Record>>,
}

#[async_trait]
impl FeedTail for FeedLogTail {
    async fn next(&mut self) -> Result<Record, FeedError> {
        match self.rx.recv().await {
            Ok(record) => Ok(Record::clone(&record)),
            Err(broadcast::error::RecvError::Lagged(n)) => Err(FeedError::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => Err(FeedError::Closed(self.feed.clone())),
        }
    }
}
