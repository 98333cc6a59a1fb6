use chrono::{DateTime, Utc};

pub const ALERT_CHANNEL: &str = "alerts";
pub const KEY_PREFIX: &str = "alert";

/// Fixed-width ISO-8601 rendering used for alert timestamps and store keys.
///
/// Microsecond precision with an explicit `+00:00` offset keeps every
/// rendering the same length, so keys sort lexicographically in time order.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
}

pub fn key_for(code: &str, ts: &DateTime<Utc>) -> String {
    format!("{KEY_PREFIX}:{code}:{}", format_ts(ts))
}
