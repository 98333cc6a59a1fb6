use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::Stream;
use stormwatch_common::Alert;
use stormwatch_workers::broker::{Broadcaster, Subscription};
use stormwatch_workers::metrics::WorkerMetrics;
use stormwatch_workers::store::{AlertStore, StoredAlert};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPhase {
    Replay,
    Live,
}

/// One alert handed to a client. Replay and live events carry the same
/// serialized alert; `phase` is for accounting only.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    pub phase: DeliveryPhase,
    pub data: Arc<str>,
}

/// Opens replay-then-live sessions over the alert store and broadcaster.
#[derive(Clone)]
pub struct DeliveryGateway {
    store: Arc<dyn AlertStore>,
    broadcaster: Broadcaster,
    metrics: Arc<WorkerMetrics>,
}

impl DeliveryGateway {
    pub fn new(store: Arc<dyn AlertStore>, broadcaster: Broadcaster, metrics: Arc<WorkerMetrics>) -> Self {
        Self {
            store,
            broadcaster,
            metrics,
        }
    }

    /// Subscribes to live alerts, then snapshots the store.
    ///
    /// Subscribing first means an alert dispatched while the snapshot is
    /// being read shows up in both. Alerts are published before they are
    /// stored, so every such overlap is already queued on the subscription
    /// when the snapshot returns; that backlog is drained here and copies of
    /// snapshot keys are dropped. An alert published before the subscription
    /// whose store write only lands after the snapshot is missed.
    pub async fn open(&self) -> DeliverySession {
        let mut subscription = self.broadcaster.subscribe();
        let snapshot = match self.store.list_all().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "alert snapshot failed, starting live only");
                Vec::new()
            }
        };

        let replayed: HashSet<&str> = snapshot.iter().map(|e| e.key.as_str()).collect();
        let mut backlog = VecDeque::new();
        let mut overlap = 0;
        while let Some(message) = subscription.try_recv() {
            if is_replayed(&replayed, &message) {
                overlap += 1;
            } else {
                backlog.push_back(message);
            }
        }

        self.metrics.session_opened();
        tracing::debug!(replay = snapshot.len(), backlog = backlog.len(), overlap, "delivery session opened");

        DeliverySession {
            replay: snapshot.into(),
            backlog,
            subscription,
            metrics: self.metrics.clone(),
        }
    }
}

fn is_replayed(replayed: &HashSet<&str>, message: &str) -> bool {
    if replayed.is_empty() {
        return false;
    }
    match Alert::from_json(message) {
        Ok(alert) => replayed.contains(alert.key().as_str()),
        Err(_) => false,
    }
}

pub struct DeliverySession {
    replay: VecDeque<StoredAlert>,
    backlog: VecDeque<Arc<str>>,
    subscription: Subscription,
    metrics: Arc<WorkerMetrics>,
}

impl DeliverySession {
    pub fn pending_replay(&self) -> usize {
        self.replay.len()
    }

    /// Next event for the client: the snapshot in key order first, then live
    /// publishes. Waits as long as nothing new is published.
    pub async fn next(&mut self) -> Option<DeliveryEvent> {
        if let Some(entry) = self.replay.pop_front() {
            self.metrics.inc_replay_events();
            return Some(DeliveryEvent {
                phase: DeliveryPhase::Replay,
                data: Arc::from(entry.value),
            });
        }

        let message = match self.backlog.pop_front() {
            Some(message) => message,
            None => self.subscription.recv().await?,
        };
        self.metrics.inc_live_events();
        Some(DeliveryEvent {
            phase: DeliveryPhase::Live,
            data: message,
        })
    }

    pub fn into_stream(self) -> impl Stream<Item = DeliveryEvent> + Send {
        futures::stream::unfold(self, |mut session| async move {
            let event = session.next().await?;
            Some((event, session))
        })
    }
}

impl Drop for DeliverySession {
    fn drop(&mut self) {
        self.metrics.session_closed();
        tracing::debug!("delivery session closed");
    }
}
