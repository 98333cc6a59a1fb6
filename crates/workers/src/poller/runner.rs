use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use stormwatch_common::retry::{retry_async, RetryConfig};
use tokio::task::JoinHandle;

use super::normalize::{coerce_numbers, normalize_payload, KeyNormalizer};
use crate::feed::FeedLog;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PollerConfig {
    pub feed: String,
    pub endpoint: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub unique_keys: Vec<String>,
    #[serde(default = "default_startup_attempts")]
    pub startup_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_startup_attempts() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    5
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("key pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("unusable payload: {0}")]
    Shape(String),
}

/// Periodically pulls one upstream JSON endpoint into a feed log.
pub struct Poller {
    config: PollerConfig,
    log: Arc<FeedLog>,
    client: Client,
    keys: KeyNormalizer,
}

impl Poller {
    pub fn new(config: PollerConfig, log: Arc<FeedLog>) -> Result<Self, PollError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            config,
            log,
            client,
            keys: KeyNormalizer::new()?,
        })
    }

    /// Fetches the endpoint once and stores the rows, returning how many
    /// were new.
    pub async fn fetch_and_store(&self) -> Result<usize, PollError> {
        let payload: Value = self
            .client
            .get(&self.config.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        self.store(payload).await
    }

    /// Normalizes `payload` and upserts each row on the configured unique
    /// keys. Returns the number of rows appended.
    pub async fn store(&self, payload: Value) -> Result<usize, PollError> {
        let rows = normalize_payload(payload).map_err(PollError::Shape)?;
        let total = rows.len();
        let mut inserted = 0;

        for raw in rows {
            let mut record = self.keys.record(raw);
            coerce_numbers(&mut record);
            if self.log.upsert(record, &self.config.unique_keys).await {
                inserted += 1;
            }
        }

        tracing::info!(feed = %self.config.feed, inserted, total, "feed rows upserted");
        Ok(inserted)
    }

    /// Initial fetch, retried with a fixed delay. Gives up quietly after the
    /// last attempt so that regular polling still starts.
    pub async fn startup(&self) -> bool {
        let retry = RetryConfig::fixed(
            self.config.startup_attempts,
            Duration::from_secs(self.config.retry_delay_secs),
        );
        match retry_async(&retry, &self.config.feed, || self.fetch_and_store()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(feed = %self.config.feed, error = %e, "all startup fetches failed");
                false
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                feed = %self.config.feed,
                endpoint = %self.config.endpoint,
                interval_secs = self.config.interval_secs,
                "poller started"
            );
            self.startup().await;

            let mut tick = tokio::time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tick.tick().await;
            loop {
                tick.tick().await;
                if let Err(e) = self.fetch_and_store().await {
                    tracing::error!(feed = %self.config.feed, error = %e, "poll failed");
                }
            }
        })
    }
}
