use std::sync::Arc;

use stormwatch_common::{Payload, Record};

use super::dispatcher::AlertDispatcher;
use super::registry::RuleRegistry;
use super::rule::Rule;
use crate::metrics::WorkerMetrics;

pub struct RuleEngine {
    registry: Arc<RuleRegistry>,
    dispatcher: Arc<AlertDispatcher>,
    metrics: Arc<WorkerMetrics>,
}

impl RuleEngine {
    pub fn new(
        registry: Arc<RuleRegistry>,
        dispatcher: Arc<AlertDispatcher>,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            metrics,
        }
    }

    /// Every rule of `feed` whose predicate holds on `record`, paired with
    /// its payload. All rules are tried; a rule whose predicate or payload
    /// builder fails is logged and skipped without affecting its siblings.
    pub fn matching<'a>(&'a self, feed: &str, record: &Record) -> Vec<(&'a Rule, Payload)> {
        let mut matched = Vec::new();

        for rule in self.registry.rules_for(feed) {
            match rule.matches(record) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    self.metrics.inc_rule_failures();
                    tracing::error!(%feed, code = %rule.code, error = %e, "rule predicate failed");
                    continue;
                }
            }

            match rule.build_payload(record) {
                Ok(payload) => matched.push((rule, payload)),
                Err(e) => {
                    self.metrics.inc_rule_failures();
                    tracing::error!(%feed, code = %rule.code, error = %e, "rule payload failed");
                }
            }
        }

        matched
    }

    /// Evaluates `record` against `feed`'s rules and dispatches one alert per
    /// match. Unknown feeds are a no-op. Returns the number of dispatches.
    pub async fn evaluate(&self, feed: &str, record: &Record) -> usize {
        let matched = self.matching(feed, record);
        let count = matched.len();

        for (rule, payload) in matched {
            if let Err(e) = self.dispatcher.dispatch(rule, payload).await {
                tracing::error!(%feed, code = %rule.code, error = %e, "dispatch failed");
            }
        }

        count
    }
}
