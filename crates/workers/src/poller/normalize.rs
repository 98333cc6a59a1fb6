//! Reshapes upstream JSON documents into flat feed records.

use regex::Regex;
use serde_json::{Number, Value};
use stormwatch_common::Record;

/// Lowercases field names and collapses every run of non-alphanumeric
/// characters into a single underscore, trimming underscores at the ends.
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    separators: Regex,
}

impl KeyNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            separators: Regex::new(r"[^0-9a-zA-Z]+")?,
        })
    }

    pub fn key(&self, raw: &str) -> String {
        self.separators
            .replace_all(raw, "_")
            .trim_matches('_')
            .to_lowercase()
    }

    pub fn record(&self, raw: Record) -> Record {
        raw.into_iter().map(|(k, v)| (self.key(&k), v)).collect()
    }
}

/// Turns an upstream payload into rows. Accepted shapes are a single object,
/// a list of objects, or a table whose first row holds the column names.
/// Anything else is rejected with a description of what was found.
pub fn normalize_payload(payload: Value) -> Result<Vec<Record>, String> {
    match payload {
        Value::Object(row) => Ok(vec![row]),
        Value::Array(rows) => match rows.first() {
            Some(Value::Array(_)) => Ok(from_table(rows)),
            Some(Value::Object(_)) => Ok(rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect()),
            Some(other) => Err(format!("unexpected row type: {}", kind(other))),
            None => Err("empty list".to_string()),
        },
        other => Err(format!("unexpected payload type: {}", kind(&other))),
    }
}

fn from_table(rows: Vec<Value>) -> Vec<Record> {
    let mut rows = rows.into_iter();
    let header: Vec<String> = match rows.next() {
        Some(Value::Array(cells)) => cells
            .into_iter()
            .map(|c| match c {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => return Vec::new(),
    };

    rows.filter_map(|row| match row {
        Value::Array(cells) => Some(header.iter().cloned().zip(cells).collect()),
        _ => None,
    })
    .collect()
}

/// Replaces numeric strings, and integers, with floats.
pub fn coerce_numbers(record: &mut Record) {
    for value in record.values_mut() {
        let parsed = match value {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        if let Some(n) = parsed.and_then(Number::from_f64) {
            *value = Value::Number(n);
        }
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_snake_cased() {
        let n = KeyNormalizer::new().unwrap();
        assert_eq!(n.key("Bz GSM (nT)"), "bz_gsm_nt");
        assert_eq!(n.key("time_tag"), "time_tag");
        assert_eq!(n.key("--Kp.Index--"), "kp_index");
    }

    #[test]
    fn header_table_becomes_rows() {
        let rows = normalize_payload(json!([
            ["time_tag", "speed", "density"],
            ["2024-05-10 12:00:00.000", "650.2", "4.1"],
            ["2024-05-10 12:01:00.000", "648.9"],
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["speed"], json!("650.2"));
        assert!(!rows[1].contains_key("density"));
    }

    #[test]
    fn object_and_object_list() {
        assert_eq!(normalize_payload(json!({"kp": 3})).unwrap().len(), 1);
        assert_eq!(normalize_payload(json!([{"a": 1}, {"a": 2}])).unwrap().len(), 2);
    }

    #[test]
    fn other_shapes_are_rejected() {
        assert!(normalize_payload(json!([])).is_err());
        assert!(normalize_payload(json!([1, 2])).is_err());
        assert!(normalize_payload(json!("text")).is_err());
    }

    #[test]
    fn numeric_strings_become_floats() {
        let mut r = json!({"speed": "650.2", "bt": 7, "time_tag": "2024-05-10", "flag": true, "gap": null})
            .as_object()
            .cloned()
            .unwrap();
        coerce_numbers(&mut r);
        assert_eq!(r["speed"], json!(650.2));
        assert_eq!(r["bt"], json!(7.0));
        assert_eq!(r["time_tag"], json!("2024-05-10"));
        assert_eq!(r["flag"], json!(true));
        assert_eq!(r["gap"], Value::Null);
    }

    #[test]
    fn nan_string_is_left_alone() {
        let mut r = json!({"v": "NaN"}).as_object().cloned().unwrap();
        coerce_numbers(&mut r);
        assert_eq!(r["v"], json!("NaN"));
    }
}
