use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stormwatch_common::{Payload, Record, Severity};

use super::error::RuleError;

pub type Predicate = Arc<dyn Fn(&Record) -> Result<bool, RuleError> + Send + Sync>;
pub type PayloadBuilder = Arc<dyn Fn(&Record) -> Result<Payload, RuleError> + Send + Sync>;

/// A named condition over one feed's records and the alert it raises.
#[derive(Clone)]
pub struct Rule {
    pub code: String,
    pub severity: Severity,
    pub retention: Duration,
    predicate: Predicate,
    payload: PayloadBuilder,
}

impl Rule {
    pub fn new<P, B>(code: impl Into<String>, severity: Severity, retention: Duration, predicate: P, payload: B) -> Self
    where
        P: Fn(&Record) -> Result<bool, RuleError> + Send + Sync + 'static,
        B: Fn(&Record) -> Result<Payload, RuleError> + Send + Sync + 'static,
    {
        Self {
            code: code.into(),
            severity,
            retention,
            predicate: Arc::new(predicate),
            payload: Arc::new(payload),
        }
    }

    /// Runs the predicate. A panic inside it comes back as
    /// [`RuleError::Panicked`] instead of unwinding into the caller.
    pub fn matches(&self, record: &Record) -> Result<bool, RuleError> {
        guarded(|| (self.predicate)(record))
    }

    pub fn build_payload(&self, record: &Record) -> Result<Payload, RuleError> {
        guarded(|| (self.payload)(record))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("code", &self.code)
            .field("severity", &self.severity)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

fn guarded<T>(f: impl FnOnce() -> Result<T, RuleError>) -> Result<T, RuleError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());
            Err(RuleError::Panicked(msg))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Condition {
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
}

impl Condition {
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::GreaterOrEqual => value >= threshold,
            Self::LessOrEqual => value <= threshold,
            Self::Equal => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stormwatch_common::RecordExt;

    fn speed_rule() -> Rule {
        Rule::new(
            "HIGH_SPEED_STREAM",
            Severity::Info,
            Duration::from_secs(300),
            |r| Ok(r.number_or("speed", 0.0)? >= 600.0),
            |r| {
                let mut p = Payload::new();
                p.insert("speed".into(), r.field_or_null("speed"));
                Ok(p)
            },
        )
    }

    fn record(v: serde_json::Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn predicate_and_payload() {
        let rule = speed_rule();
        let r = record(json!({"speed": 640}));
        assert!(rule.matches(&r).unwrap());
        assert_eq!(rule.build_payload(&r).unwrap()["speed"], json!(640));
        assert!(!rule.matches(&record(json!({"speed": 420}))).unwrap());
    }

    #[test]
    fn predicate_error_surfaces() {
        let rule = speed_rule();
        assert!(matches!(
            rule.matches(&record(json!({"speed": "fast"}))),
            Err(RuleError::Record(_))
        ));
    }

    #[test]
    fn panics_are_contained() {
        let rule = Rule::new(
            "BROKEN",
            Severity::Warning,
            Duration::from_secs(60),
            |_| panic!("boom"),
            |_| Ok(Payload::new()),
        );
        match rule.matches(&Record::new()) {
            Err(RuleError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[test]
    fn debug_omits_closures() {
        let text = format!("{:?}", speed_rule());
        assert!(text.contains("HIGH_SPEED_STREAM"));
    }

    #[test]
    fn condition_greater_than() {
        assert!(Condition::GreaterThan.evaluate(10.0, 5.0));
        assert!(!Condition::GreaterThan.evaluate(5.0, 10.0));
    }

    #[test]
    fn condition_less_than() {
        assert!(Condition::LessThan.evaluate(1.0, 5.0));
        assert!(!Condition::LessThan.evaluate(10.0, 5.0));
    }

    #[test]
    fn condition_boundaries() {
        assert!(Condition::GreaterOrEqual.evaluate(5.0, 5.0));
        assert!(Condition::LessOrEqual.evaluate(5.0, 5.0));
        assert!(Condition::Equal.evaluate(5.0, 5.0));
    }
}
