use super::worker_metrics::WorkerMetrics;
use std::sync::Arc;

pub fn render_prometheus(m: &Arc<WorkerMetrics>) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "stormwatch_records_processed_total", m.records_processed_val());
    write_counter(&mut out, "stormwatch_rule_failures_total", m.rule_failures_val());
    write_counter(&mut out, "stormwatch_alerts_fired_total", m.alerts_fired_val());
    write_counter(&mut out, "stormwatch_alerts_stored_total", m.alerts_stored_val());
    write_counter(&mut out, "stormwatch_store_failures_total", m.store_failures_val());
    write_counter(&mut out, "stormwatch_publish_failures_total", m.publish_failures_val());
    write_counter(&mut out, "stormwatch_feed_failures_total", m.feed_failures_val());
    write_counter(&mut out, "stormwatch_feed_restarts_total", m.feed_restarts_val());
    write_counter(&mut out, "stormwatch_sessions_opened_total", m.sessions_opened_val());
    write_counter(&mut out, "stormwatch_replay_events_total", m.replay_events_val());
    write_counter(&mut out, "stormwatch_live_events_total", m.live_events_val());
    write_gauge(&mut out, "stormwatch_sessions_active", m.sessions_active_val());

    let (sum, count) = m.dispatch_latency_vals();
    write_summary(&mut out, "stormwatch_dispatch_latency_us", sum, count);

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}

fn write_gauge(out: &mut String, name: &str, val: i64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {val}");
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}
