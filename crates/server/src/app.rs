//! Builds the running system from a loaded config.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use stormwatch_common::retry::RetryConfig;
use stormwatch_workers::alert::{AlertDispatcher, ConfigError, RuleEngine, RuleRegistry};
use stormwatch_workers::broker::Broadcaster;
use stormwatch_workers::feed::{FeedHub, FeedSource};
use stormwatch_workers::metrics::WorkerMetrics;
use stormwatch_workers::poller::{PollError, Poller};
use stormwatch_workers::store::MemoryAlertStore;
use stormwatch_workers::tailer::{spawn_supervised, Tailer, TailerHandle};
use tokio::task::JoinHandle;

use crate::config::StormwatchConfig;
use crate::gateway::DeliveryGateway;
use crate::rest::{self, AppState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("rule registry: {0}")]
    Rules(#[from] ConfigError),
    #[error("poller for {feed}: {source}")]
    Poller {
        feed: String,
        #[source]
        source: PollError,
    },
}

pub struct Stormwatch {
    pub state: AppState,
    pub store: MemoryAlertStore,
    pub broadcaster: Broadcaster,
    tailers: Vec<TailerHandle>,
    background: Vec<JoinHandle<()>>,
}

impl Stormwatch {
    /// Compiles the rule set and starts one supervised tailer per feed that
    /// has rules, the store evictor and the configured pollers. A bad rule
    /// set fails here, before anything is spawned.
    pub fn start(config: &StormwatchConfig) -> Result<Self, StartupError> {
        let registry = Arc::new(RuleRegistry::standard(&config.rules)?);
        let pollers = &config.pollers;
        let engine_cfg = &config.engine;

        let metrics = WorkerMetrics::new();
        let store = MemoryAlertStore::new();
        let broadcaster = Broadcaster::default();
        let hub = FeedHub::new(engine_cfg.feed_history);

        let dispatcher = AlertDispatcher::new(
            Arc::new(store.clone()),
            Arc::new(broadcaster.clone()),
            metrics.clone(),
        )
        .with_store_timeout(engine_cfg.store_timeout())
        .with_store_retry(RetryConfig {
            max_attempts: engine_cfg.store_attempts,
            ..RetryConfig::default()
        });
        let engine = Arc::new(RuleEngine::new(registry.clone(), Arc::new(dispatcher), metrics.clone()));

        let mut polling = Vec::with_capacity(pollers.len());
        for p in pollers {
            let poller = Poller::new(p.clone(), hub.ensure(&p.feed)).map_err(|source| StartupError::Poller {
                feed: p.feed.clone(),
                source,
            })?;
            polling.push(poller);
        }

        let mut tailers = Vec::new();
        for feed in registry.feeds() {
            let source: Arc<dyn FeedSource> = hub.ensure(feed);
            let tailer = Tailer::new(source, engine.clone(), engine_cfg.backoff(), metrics.clone());
            tailers.push(spawn_supervised(tailer));
        }
        tracing::info!(
            feeds = tailers.len(),
            rules = registry.rule_count(),
            pollers = polling.len(),
            "tailers started"
        );

        let mut background = vec![store.spawn_evictor(engine_cfg.eviction_interval())];
        background.extend(polling.into_iter().map(Poller::spawn));

        let state = AppState {
            gateway: DeliveryGateway::new(Arc::new(store.clone()), broadcaster.clone(), metrics.clone()),
            store: Arc::new(store.clone()),
            feeds: hub,
            tailers: Arc::new(tailers.iter().map(|t| (t.feed().to_string(), t.watch())).collect()),
            unique_keys: Arc::new(
                pollers
                    .iter()
                    .map(|p| (p.feed.clone(), p.unique_keys.clone()))
                    .collect::<HashMap<_, _>>(),
            ),
            metrics,
            keep_alive: config.server.keep_alive(),
        };

        Ok(Self {
            state,
            store,
            broadcaster,
            tailers,
            background,
        })
    }

    pub fn router(&self) -> Router {
        rest::router(self.state.clone())
    }

    pub fn stop(self) {
        for t in &self.tailers {
            t.abort();
        }
        for task in &self.background {
            task.abort();
        }
        tracing::info!("stopped");
    }
}
