use std::time::Duration;

use serde::Deserialize;
use stormwatch_common::{Payload, Record, RecordExt, Severity};

use super::error::{ConfigError, RuleError};
use super::rule::{Condition, Rule};

/// A declarative numeric threshold rule, as written in the config file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThresholdRuleSpec {
    pub feed: String,
    pub code: String,
    pub level: Severity,
    pub ttl_secs: u64,
    pub field: String,
    pub condition: Condition,
    pub threshold: f64,
    #[serde(default)]
    pub payload_fields: Vec<String>,
}

impl ThresholdRuleSpec {
    pub fn compile(&self) -> Result<Rule, ConfigError> {
        if self.field.is_empty() {
            return Err(ConfigError::InvalidRule {
                code: self.code.clone(),
                reason: "field must not be empty".into(),
            });
        }
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidRule {
                code: self.code.clone(),
                reason: "threshold must be finite".into(),
            });
        }

        let field = self.field.clone();
        let condition = self.condition;
        let threshold = self.threshold;
        // a record without the field never fires
        let predicate = move |r: &Record| -> Result<bool, RuleError> {
            match r.get(&field) {
                None => Ok(false),
                Some(_) => Ok(condition.evaluate(r.number(&field)?, threshold)),
            }
        };

        let mut fields = vec![self.field.clone()];
        fields.extend(self.payload_fields.iter().filter(|f| **f != self.field).cloned());
        let payload = move |r: &Record| -> Result<Payload, RuleError> {
            Ok(fields
                .iter()
                .map(|f| (f.clone(), r.field_or_null(f)))
                .collect::<Payload>())
        };

        Ok(Rule::new(
            self.code.clone(),
            self.level,
            Duration::from_secs(self.ttl_secs),
            predicate,
            payload,
        ))
    }
}
