use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TailerState {
    Listening,
    Erroring,
    Backoff,
}

impl TailerState {
    /// The next state in the restart cycle. There is no terminal state.
    pub fn advance(self) -> Self {
        match self {
            Self::Listening => Self::Erroring,
            Self::Erroring => Self::Backoff,
            Self::Backoff => Self::Listening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listening => "listening",
            Self::Erroring => "erroring",
            Self::Backoff => "backoff",
        }
    }
}

impl Default for TailerState {
    fn default() -> Self {
        Self::Listening
    }
}

impl fmt::Display for TailerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
