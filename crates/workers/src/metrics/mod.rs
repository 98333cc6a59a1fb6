pub mod exposition;
pub mod worker_metrics;

pub use worker_metrics::WorkerMetrics;

#[cfg(test)]
mod tests {
    use super::exposition::render_prometheus;
    use super::worker_metrics::WorkerMetrics;
    use std::time::Instant;

    #[test]
    fn counters_increment() {
        let m = WorkerMetrics::new();
        m.inc_records_processed();
        m.inc_records_processed();
        m.inc_rule_failures();
        assert_eq!(m.records_processed_val(), 2);
        assert_eq!(m.rule_failures_val(), 1);
    }

    #[test]
    fn session_gauge_goes_up_and_down() {
        let m = WorkerMetrics::new();
        m.session_opened();
        m.session_opened();
        m.session_closed();
        assert_eq!(m.sessions_active_val(), 1);
        assert_eq!(m.sessions_opened_val(), 2);
    }

    #[test]
    fn latency_recording() {
        let m = WorkerMetrics::new();
        let start = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        m.record_dispatch_latency(start);
        let (sum, count) = m.dispatch_latency_vals();
        assert!(sum > 0);
        assert_eq!(count, 1);
    }

    #[test]
    fn prometheus_output_contains_metric_names() {
        let m = WorkerMetrics::new();
        m.inc_alerts_fired();
        m.inc_feed_restarts();
        m.session_opened();
        let output = render_prometheus(&m);
        assert!(output.contains("stormwatch_alerts_fired_total 1"));
        assert!(output.contains("stormwatch_feed_restarts_total 1"));
        assert!(output.contains("# TYPE stormwatch_sessions_active gauge"));
        assert!(output.contains("stormwatch_sessions_active 1"));
        assert!(output.contains("# TYPE stormwatch_dispatch_latency_us summary"));
    }
}
