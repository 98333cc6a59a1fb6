use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use stormwatch_workers::alert::ThresholdRuleSpec;
use stormwatch_workers::poller::PollerConfig;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StormwatchConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub rules: Vec<ThresholdRuleSpec>,
    #[serde(default)]
    pub pollers: Vec<PollerConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_rest_addr")]
    pub rest_addr: SocketAddr,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rest_addr: default_rest_addr(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl ServerConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_store_attempts")]
    pub store_attempts: u32,
    #[serde(default = "default_eviction_interval_ms")]
    pub eviction_interval_ms: u64,
    #[serde(default = "default_feed_history")]
    pub feed_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backoff_ms: default_backoff_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            store_attempts: default_store_attempts(),
            eviction_interval_ms: default_eviction_interval_ms(),
            feed_history: default_feed_history(),
        }
    }
}

impl EngineConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_millis(self.eviction_interval_ms)
    }
}

fn default_rest_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_backoff_ms() -> u64 {
    5_000
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_store_attempts() -> u32 {
    1
}

fn default_eviction_interval_ms() -> u64 {
    1_000
}

fn default_feed_history() -> usize {
    10_000
}
