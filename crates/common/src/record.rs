use serde_json::Value;

/// A feed record: an untyped mapping of field name to scalar value.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("field `{field}` is not a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("field `{field}`: {reason}")]
    Malformed { field: String, reason: String },
}

/// Typed accessors for rule predicates and payload builders.
pub trait RecordExt {
    fn number(&self, field: &str) -> Result<f64, RecordError>;

    /// Like [`RecordExt::number`] but a missing field reads as `default`.
    /// A present field of the wrong type is still an error.
    fn number_or(&self, field: &str, default: f64) -> Result<f64, RecordError>;

    fn text(&self, field: &str) -> Result<&str, RecordError>;

    fn text_opt(&self, field: &str) -> Option<&str>;

    fn field_or_null(&self, field: &str) -> Value;
}

impl RecordExt for Record {
    fn number(&self, field: &str) -> Result<f64, RecordError> {
        match self.get(field) {
            Some(v) => as_number(field, v),
            None => Err(RecordError::MissingField(field.to_string())),
        }
    }

    fn number_or(&self, field: &str, default: f64) -> Result<f64, RecordError> {
        match self.get(field) {
            Some(v) => as_number(field, v),
            None => Ok(default),
        }
    }

    fn text(&self, field: &str) -> Result<&str, RecordError> {
        match self.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(RecordError::WrongType {
                field: field.to_string(),
                expected: "string",
            }),
            None => Err(RecordError::MissingField(field.to_string())),
        }
    }

    fn text_opt(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn field_or_null(&self, field: &str) -> Value {
        self.get(field).cloned().unwrap_or(Value::Null)
    }
}

fn as_number(field: &str, v: &Value) -> Result<f64, RecordError> {
    v.as_f64().ok_or_else(|| RecordError::WrongType {
        field: field.to_string(),
        expected: "number",
    })
}
