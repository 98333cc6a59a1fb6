use stormwatch_common::RecordError;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("rule panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("feed name must not be empty")]
    EmptyFeed,
    #[error("rule in feed `{feed}` has an empty code")]
    EmptyCode { feed: String },
    #[error("duplicate rule code `{code}` in feed `{feed}`")]
    DuplicateCode { feed: String, code: String },
    #[error("rule `{code}` has zero retention")]
    ZeroRetention { code: String },
    #[error("rule `{code}`: {reason}")]
    InvalidRule { code: String, reason: String },
}
