mod builtin;
mod dispatcher;
mod error;
mod evaluator;
mod registry;
mod rule;
pub mod test_harness;
mod threshold;

pub use builtin::builtin_rules;
pub use dispatcher::{AlertDispatcher, DispatchError, DispatchOutcome};
pub use error::{ConfigError, RuleError};
pub use evaluator::RuleEngine;
pub use registry::{RegistryBuilder, RuleRegistry};
pub use rule::{Condition, Rule};
pub use stormwatch_common::Severity;
pub use threshold::ThresholdRuleSpec;
