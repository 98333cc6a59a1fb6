//! The space-weather rule table loaded at startup.

use std::time::Duration;

use stormwatch_common::{Payload, Record, RecordError, RecordExt, Severity};

use super::error::RuleError;
use super::rule::Rule;

const MINUTES_5: Duration = Duration::from_secs(300);
const MINUTES_10: Duration = Duration::from_secs(600);
const MINUTES_15: Duration = Duration::from_secs(900);

/// Feed name and ordered rule list for every built-in feed.
pub fn builtin_rules() -> Vec<(&'static str, Vec<Rule>)> {
    vec![
        ("solar_wind", vec![high_speed_stream()]),
        ("rtsw_mag", vec![bz_strong_south()]),
        (
            "planetary_k_index",
            vec![
                kp_band("KP_G1", Severity::Warning, 5.0, Some(6.0)),
                kp_band("KP_G2", Severity::Warning, 6.0, Some(7.0)),
                kp_band("KP_G3", Severity::Critical, 7.0, Some(8.0)),
                kp_band("KP_G4", Severity::Critical, 8.0, Some(9.0)),
                kp_band("KP_G5", Severity::Critical, 9.0, None),
            ],
        ),
        ("xray_flares", vec![xray_flare_m1(), xray_flare_x1()]),
    ]
}

fn high_speed_stream() -> Rule {
    Rule::new(
        "HIGH_SPEED_STREAM",
        Severity::Info,
        MINUTES_5,
        |r| Ok(r.number_or("speed", 0.0)? >= 600.0),
        |r| Ok(pick(r, &[("speed", "speed")])),
    )
}

fn bz_strong_south() -> Rule {
    Rule::new(
        "BZ_STRONG_SOUTH",
        Severity::Warning,
        MINUTES_10,
        |r| Ok(r.number_or("bz_gsm", 0.0)? <= -8.0),
        |r| Ok(pick(r, &[("bz", "bz_gsm")])),
    )
}

/// Geomagnetic storm scale band `[lo, hi)` on the planetary K index.
fn kp_band(code: &'static str, severity: Severity, lo: f64, hi: Option<f64>) -> Rule {
    Rule::new(
        code,
        severity,
        MINUTES_5,
        move |r| {
            let kp = r.number_or("kp_index", 0.0)?;
            Ok(kp >= lo && hi.map_or(true, |hi| kp < hi))
        },
        |r| Ok(pick(r, &[("kp", "kp_index")])),
    )
}

fn xray_flare_m1() -> Rule {
    Rule::new(
        "XRAY_FLARE_M1",
        Severity::Warning,
        MINUTES_10,
        |r| flare_at_least(r, 'M', 1.0),
        |r| {
            Ok(pick(
                r,
                &[
                    ("max_class", "max_class"),
                    ("max_time", "max_time"),
                    ("begin_class", "begin_class"),
                    ("satellite", "satellite"),
                ],
            ))
        },
    )
}

fn xray_flare_x1() -> Rule {
    Rule::new(
        "XRAY_FLARE_X1",
        Severity::Critical,
        MINUTES_15,
        |r| flare_at_least(r, 'X', 1.0),
        |r| {
            Ok(pick(
                r,
                &[
                    ("max_class", "max_class"),
                    ("max_time", "max_time"),
                    ("satellite", "satellite"),
                ],
            ))
        },
    )
}

/// True when `max_class` (e.g. "M2.5") is in class `letter` with at least
/// `magnitude`. A non-string class never matches; an empty class, or one of
/// the right letter with an unreadable magnitude, is an error.
fn flare_at_least(record: &Record, letter: char, magnitude: f64) -> Result<bool, RuleError> {
    let Some(class) = record.text_opt("max_class") else {
        return Ok(false);
    };
    let mut chars = class.chars();
    match chars.next() {
        None => {
            return Err(RecordError::Malformed {
                field: "max_class".into(),
                reason: "empty class".into(),
            }
            .into())
        }
        Some(c) if c != letter => return Ok(false),
        Some(_) => {}
    }
    let value: f64 = chars
        .as_str()
        .trim()
        .parse()
        .map_err(|_| RecordError::Malformed {
            field: "max_class".into(),
            reason: format!("unreadable magnitude in `{class}`"),
        })?;
    Ok(value >= magnitude)
}

/// Copies `(out, field)` pairs into a payload; missing fields become null.
fn pick(record: &Record, fields: &[(&str, &str)]) -> Payload {
    fields
        .iter()
        .map(|(out, field)| (out.to_string(), record.field_or_null(field)))
        .collect()
}
