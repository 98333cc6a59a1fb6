use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::TailerState;
use crate::alert::RuleEngine;
use crate::feed::{FeedError, FeedSource};
use crate::metrics::WorkerMetrics;

pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Tails one feed for the lifetime of the process, handing every new record
/// to the rule engine and reopening the tail after a fixed backoff whenever
/// it breaks.
#[derive(Clone)]
pub struct Tailer {
    source: Arc<dyn FeedSource>,
    engine: Arc<RuleEngine>,
    backoff: Duration,
    metrics: Arc<WorkerMetrics>,
    state: Arc<watch::Sender<TailerState>>,
}

impl Tailer {
    pub fn new(
        source: Arc<dyn FeedSource>,
        engine: Arc<RuleEngine>,
        backoff: Duration,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        let (state, _) = watch::channel(TailerState::Listening);
        Self {
            source,
            engine,
            backoff,
            metrics,
            state: Arc::new(state),
        }
    }

    pub fn feed(&self) -> &str {
        self.source.name()
    }

    pub fn metrics(&self) -> &Arc<WorkerMetrics> {
        &self.metrics
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn state(&self) -> watch::Receiver<TailerState> {
        self.state.subscribe()
    }

    pub(crate) fn enter(&self, state: TailerState) {
        self.state.send_replace(state);
    }

    pub async fn run(self) {
        let mut state = TailerState::Listening;
        let mut failure: Option<FeedError> = None;

        loop {
            self.enter(state);
            match state {
                TailerState::Listening => {
                    failure = Some(self.listen().await);
                }
                TailerState::Erroring => {
                    self.metrics.inc_feed_failures();
                    if let Some(e) = failure.take() {
                        tracing::error!(feed = %self.feed(), error = %e, "feed tail failed");
                    }
                }
                TailerState::Backoff => {
                    tokio::time::sleep(self.backoff).await;
                    self.metrics.inc_feed_restarts();
                    tracing::warn!(feed = %self.feed(), backoff_ms = self.backoff.as_millis() as u64, "reopening feed tail");
                }
            }
            state = state.advance();
        }
    }

    /// Forwards records until the tail breaks. Each record is evaluated in
    /// full before the next one is read.
    async fn listen(&self) -> FeedError {
        let mut tail = match self.source.open().await {
            Ok(tail) => tail,
            Err(e) => return e,
        };
        tracing::debug!(feed = %self.feed(), "feed tail open");

        loop {
            match tail.next().await {
                Ok(record) => {
                    self.metrics.inc_records_processed();
                    self.engine.evaluate(self.feed(), &record).await;
                }
                Err(e) => return e,
            }
        }
    }
}
