use std::collections::HashMap;
use std::collections::HashSet;

use super::builtin::builtin_rules;
use super::error::ConfigError;
use super::rule::Rule;
use super::threshold::ThresholdRuleSpec;

/// Immutable feed → ordered rules table, built once at startup.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    feeds: Vec<String>,
    rules: HashMap<String, Vec<Rule>>,
}

impl RuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in space-weather table plus any configured threshold rules.
    pub fn standard(extra: &[ThresholdRuleSpec]) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        for (feed, rules) in builtin_rules() {
            builder = builder.rules(feed, rules);
        }
        for spec in extra {
            builder = builder.rule(&spec.feed, spec.compile()?);
        }
        builder.build()
    }

    /// Rules for `feed` in registration order; empty for unknown feeds.
    pub fn rules_for(&self, feed: &str) -> &[Rule] {
        self.rules.get(feed).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn feeds(&self) -> impl Iterator<Item = &str> {
        self.feeds.iter().map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, Rule)>,
}

impl RegistryBuilder {
    pub fn rule(mut self, feed: &str, rule: Rule) -> Self {
        self.entries.push((feed.to_string(), rule));
        self
    }

    pub fn rules(mut self, feed: &str, rules: impl IntoIterator<Item = Rule>) -> Self {
        for rule in rules {
            self.entries.push((feed.to_string(), rule));
        }
        self
    }

    pub fn build(self) -> Result<RuleRegistry, ConfigError> {
        let mut registry = RuleRegistry::default();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (feed, rule) in self.entries {
            if feed.is_empty() {
                return Err(ConfigError::EmptyFeed);
            }
            if rule.code.is_empty() {
                return Err(ConfigError::EmptyCode { feed });
            }
            if rule.retention.is_zero() {
                return Err(ConfigError::ZeroRetention { code: rule.code });
            }
            if !seen.insert((feed.clone(), rule.code.clone())) {
                return Err(ConfigError::DuplicateCode {
                    feed,
                    code: rule.code,
                });
            }
            if !registry.rules.contains_key(&feed) {
                registry.feeds.push(feed.clone());
            }
            registry.rules.entry(feed).or_default().push(rule);
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use stormwatch_common::{Payload, Severity};

    fn rule(code: &str, secs: u64) -> Rule {
        Rule::new(
            code,
            Severity::Info,
            Duration::from_secs(secs),
            |_| Ok(true),
            |_| Ok(Payload::new()),
        )
    }

    #[test]
    fn standard_registry_has_builtin_feeds() {
        let reg = RuleRegistry::standard(&[]).unwrap();
        let feeds: Vec<&str> = reg.feeds().collect();
        assert_eq!(
            feeds,
            vec!["solar_wind", "rtsw_mag", "planetary_k_index", "xray_flares"]
        );
        assert_eq!(reg.rules_for("planetary_k_index").len(), 5);
        assert_eq!(reg.rule_count(), 10);
    }

    #[test]
    fn unknown_feed_has_no_rules() {
        let reg = RuleRegistry::standard(&[]).unwrap();
        assert!(reg.rules_for("aurora_oval").is_empty());
    }

    #[test]
    fn preserves_rule_order() {
        let reg = RuleRegistry::builder()
            .rule("f", rule("B", 1))
            .rule("f", rule("A", 1))
            .build()
            .unwrap();
        let codes: Vec<&str> = reg.rules_for("f").iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[test]
    fn duplicate_code_rejected() {
        let err = RuleRegistry::builder()
            .rule("f", rule("A", 1))
            .rule("f", rule("A", 1))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateCode {
                feed: "f".into(),
                code: "A".into()
            }
        );
    }

    #[test]
    fn same_code_on_different_feeds_allowed() {
        assert!(RuleRegistry::builder()
            .rule("f", rule("A", 1))
            .rule("g", rule("A", 1))
            .build()
            .is_ok());
    }

    #[test]
    fn zero_retention_and_empty_names_rejected() {
        assert!(matches!(
            RuleRegistry::builder().rule("f", rule("A", 0)).build(),
            Err(ConfigError::ZeroRetention { .. })
        ));
        assert_eq!(
            RuleRegistry::builder().rule("", rule("A", 1)).build().unwrap_err(),
            ConfigError::EmptyFeed
        );
        assert!(matches!(
            RuleRegistry::builder().rule("f", rule("", 1)).build(),
            Err(ConfigError::EmptyCode { .. })
        ));
    }

    #[test]
    fn configured_rule_colliding_with_builtin_rejected() {
        let spec: ThresholdRuleSpec = serde_yaml::from_str(
            "feed: planetary_k_index\ncode: KP_G1\nlevel: info\nttl_secs: 60\nfield: kp_index\ncondition: GreaterThan\nthreshold: 1\n",
        )
        .unwrap();
        assert!(matches!(
            RuleRegistry::standard(&[spec]),
            Err(ConfigError::DuplicateCode { .. })
        ));
    }
}
