use std::sync::Arc;
use std::time::{Duration, Instant};

use stormwatch_common::retry::{retry_async, RetryConfig};
use stormwatch_common::{Alert, AlertClock, Payload};
use tracing::Instrument;

use super::rule::Rule;
use crate::broker::{AlertPublisher, BroadcastError};
use crate::metrics::WorkerMetrics;
use crate::store::{AlertStore, StoreError};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("alert serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What happened to each of the two independent effects of a dispatch.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub alert: Alert,
    pub published: Result<usize, BroadcastError>,
    pub stored: Result<(), StoreError>,
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.published.is_ok() && self.stored.is_ok()
    }
}

/// Turns a matched rule into an alert, publishes it live and stores it
/// for replay. The two writes are not a transaction: a failure of one is
/// logged and never undoes or blocks the other.
pub struct AlertDispatcher {
    store: Arc<dyn AlertStore>,
    publisher: Arc<dyn AlertPublisher>,
    clock: AlertClock,
    store_timeout: Duration,
    store_retry: RetryConfig,
    metrics: Arc<WorkerMetrics>,
}

impl AlertDispatcher {
    pub fn new(
        store: Arc<dyn AlertStore>,
        publisher: Arc<dyn AlertPublisher>,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        Self {
            store,
            publisher,
            clock: AlertClock::new(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            store_retry: RetryConfig::once(),
            metrics,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_store_retry(mut self, retry: RetryConfig) -> Self {
        self.store_retry = retry;
        self
    }

    pub async fn dispatch(&self, rule: &Rule, payload: Payload) -> Result<DispatchOutcome, DispatchError> {
        let start = Instant::now();
        let alert = Alert::new(self.clock.now(), rule.code.clone(), rule.severity, payload);
        let json = alert.to_json()?;
        self.metrics.inc_alerts_fired();

        let span = tracing::info_span!("dispatch", code = %rule.code, key = %alert.key());
        let (published, stored) = self.fire_both(rule, &alert, &json).instrument(span).await;

        self.metrics.record_dispatch_latency(start);
        Ok(DispatchOutcome {
            alert,
            published,
            stored,
        })
    }

    async fn fire_both(
        &self,
        rule: &Rule,
        alert: &Alert,
        json: &str,
    ) -> (Result<usize, BroadcastError>, Result<(), StoreError>) {
        let published = self.publisher.publish(json).await;
        match &published {
            Ok(receivers) => tracing::debug!(receivers, "alert published"),
            Err(e) => {
                self.metrics.inc_publish_failures();
                tracing::error!(error = %e, "alert publish failed");
            }
        }

        let stored = self.store_with_timeout(&alert.key(), json, rule.retention).await;
        match &stored {
            Ok(()) => {
                self.metrics.inc_alerts_stored();
                tracing::info!(ttl_s = rule.retention.as_secs(), "stored alert");
            }
            Err(e) => {
                self.metrics.inc_store_failures();
                tracing::error!(error = %e, "alert store write failed");
            }
        }

        (published, stored)
    }

    async fn store_with_timeout(&self, key: &str, json: &str, ttl: Duration) -> Result<(), StoreError> {
        let store = &self.store;
        let timeout = self.store_timeout;
        retry_async(&self.store_retry, key, || async move {
            match tokio::time::timeout(timeout, store.set(key, json, ttl)).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(timeout)),
            }
        })
        .await
    }
}
