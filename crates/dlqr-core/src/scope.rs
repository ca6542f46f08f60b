//! Rule set addressing

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Global,
    Topic,
    Pattern,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Topic => "topic",
            Scope::Pattern => "pattern",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Scope::Global),
            "topic" => Ok(Scope::Topic),
            "pattern" => Ok(Scope::Pattern),
            other => Err(CoreError::Other(anyhow::anyhow!(
                "Unknown rule scope: {} (expected global, topic or pattern)",
                other
            ))),
        }
    }
}

/// Identifies one stored rule set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleSetKey {
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl RuleSetKey {
    pub fn new(scope: Scope, key: Option<String>) -> Self {
        let key = key.filter(|k| !k.is_empty());
        Self { scope, key }
    }

    pub fn global() -> Self {
        Self::new(Scope::Global, None)
    }

    pub fn topic(topic: impl Into<String>) -> Self {
        Self::new(Scope::Topic, Some(topic.into()))
    }

    /// Flat index form, `<scope>:<key>` with `_` for a missing key
    pub fn index(&self) -> String {
        format!("{}:{}", self.scope, self.key.as_deref().unwrap_or("_"))
    }
}

impl std::fmt::Display for RuleSetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.index())
    }
}
