//! Drives a rule registry end to end against an in-memory store and
//! broadcaster, collecting what a subscriber would have seen.

use std::sync::Arc;

use stormwatch_common::{Alert, Record};

use crate::alert::{AlertDispatcher, RuleEngine, RuleRegistry};
use crate::broker::Broadcaster;
use crate::metrics::WorkerMetrics;
use crate::store::{AlertStore, MemoryAlertStore};

pub struct HarnessResult {
    /// Alerts in the order they were published.
    pub published: Vec<Alert>,
    /// Alerts left in the store, ordered by key.
    pub stored: Vec<Alert>,
    pub metrics: Arc<WorkerMetrics>,
}

impl HarnessResult {
    pub fn codes(&self) -> Vec<&str> {
        self.published.iter().map(|a| a.code.as_str()).collect()
    }
}

pub async fn run_harness(registry: RuleRegistry, records: Vec<(&str, Record)>) -> HarnessResult {
    let store = MemoryAlertStore::new();
    let broadcaster = Broadcaster::default();
    let mut subscription = broadcaster.subscribe();
    let metrics = WorkerMetrics::new();

    let dispatcher = AlertDispatcher::new(
        Arc::new(store.clone()),
        Arc::new(broadcaster.clone()),
        metrics.clone(),
    );
    let engine = RuleEngine::new(Arc::new(registry), Arc::new(dispatcher), metrics.clone());

    for (feed, record) in &records {
        metrics.inc_records_processed();
        engine.evaluate(feed, record).await;
    }

    let mut published = Vec::new();
    while let Some(message) = subscription.try_recv() {
        if let Ok(alert) = Alert::from_json(&message) {
            published.push(alert);
        }
    }

    let stored = store
        .list_all()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|e| Alert::from_json(&e.value).ok())
        .collect();

    HarnessResult {
        published,
        stored,
        metrics,
    }
}
