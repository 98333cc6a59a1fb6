use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use stormwatch_workers::feed::FeedHub;
use stormwatch_workers::metrics::WorkerMetrics;
use stormwatch_workers::store::AlertStore;
use stormwatch_workers::tailer::TailerState;
use tokio::sync::watch;

use super::{alerts, feeds, health, metrics};
use crate::gateway::DeliveryGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: DeliveryGateway,
    pub store: Arc<dyn AlertStore>,
    pub feeds: FeedHub,
    /// Live state of each feed's tailer, by feed name.
    pub tailers: Arc<HashMap<String, watch::Receiver<TailerState>>>,
    /// Upsert keys for feeds that have them.
    pub unique_keys: Arc<HashMap<String, Vec<String>>>,
    pub metrics: Arc<WorkerMetrics>,
    pub keep_alive: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/stream", get(alerts::stream_alerts))
        .route("/v1/feeds", get(feeds::list_feeds))
        .route(
            "/v1/feeds/{feed}/records",
            get(feeds::query_records).post(feeds::ingest_records),
        )
        .route("/v1/feeds/{feed}/stream", get(feeds::stream_records))
        .route("/metrics", get(metrics::metrics))
        .with_state(state)
}
