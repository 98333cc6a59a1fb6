use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct WorkerMetrics {
    records_processed: AtomicU64,
    rule_failures: AtomicU64,
    alerts_fired: AtomicU64,
    alerts_stored: AtomicU64,
    store_failures: AtomicU64,
    publish_failures: AtomicU64,
    feed_failures: AtomicU64,
    feed_restarts: AtomicU64,
    sessions_opened: AtomicU64,
    sessions_active: AtomicI64,
    replay_events: AtomicU64,
    live_events: AtomicU64,
    dispatch_latency_sum_us: AtomicU64,
    dispatch_latency_count: AtomicU64,
}

impl WorkerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_records_processed(&self) {
        self.records_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rule_failures(&self) {
        self.rule_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_fired(&self) {
        self.alerts_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_stored(&self) {
        self.alerts_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_publish_failures(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_feed_failures(&self) {
        self.feed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_feed_restarts(&self) {
        self.feed_restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.sessions_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_replay_events(&self) {
        self.replay_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_live_events(&self) {
        self.live_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.dispatch_latency_sum_us.fetch_add(us, Ordering::Relaxed);
        self.dispatch_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_processed_val(&self) -> u64 {
        self.records_processed.load(Ordering::Relaxed)
    }

    pub fn rule_failures_val(&self) -> u64 {
        self.rule_failures.load(Ordering::Relaxed)
    }

    pub fn alerts_fired_val(&self) -> u64 {
        self.alerts_fired.load(Ordering::Relaxed)
    }

    pub fn alerts_stored_val(&self) -> u64 {
        self.alerts_stored.load(Ordering::Relaxed)
    }

    pub fn store_failures_val(&self) -> u64 {
        self.store_failures.load(Ordering::Relaxed)
    }

    pub fn publish_failures_val(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    pub fn feed_failures_val(&self) -> u64 {
        self.feed_failures.load(Ordering::Relaxed)
    }

    pub fn feed_restarts_val(&self) -> u64 {
        self.feed_restarts.load(Ordering::Relaxed)
    }

    pub fn sessions_opened_val(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    pub fn sessions_active_val(&self) -> i64 {
        self.sessions_active.load(Ordering::Relaxed)
    }

    pub fn replay_events_val(&self) -> u64 {
        self.replay_events.load(Ordering::Relaxed)
    }

    pub fn live_events_val(&self) -> u64 {
        self.live_events.load(Ordering::Relaxed)
    }

    pub fn dispatch_latency_vals(&self) -> (u64, u64) {
        (
            self.dispatch_latency_sum_us.load(Ordering::Relaxed),
            self.dispatch_latency_count.load(Ordering::Relaxed),
        )
    }
}
