pub mod completions;
pub mod preview;
pub mod rules;
pub mod sample;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dlqr_config::Config;
use dlqr_core::{Rule, RuleSetKey, Scope};
use dlqr_storage::SqliteRuleStore;
use tokio::io::AsyncReadExt;

/// Open the rule database; `--db` wins over the config
pub async fn open_store(db: Option<PathBuf>, config: &Config) -> Result<SqliteRuleStore> {
    let path = db.or_else(|| config.storage.database_path.clone());
    Ok(SqliteRuleStore::new(path).await?)
}

pub fn rule_set_key(scope: Option<Scope>, key: Option<String>, config: &Config) -> RuleSetKey {
    RuleSetKey::new(scope.unwrap_or(config.preview.default_scope), key)
}

/// Read a file argument, or stdin for `-`
pub async fn read_text(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read {}", source))
}

/// A rules file is a JSON array of rules
pub async fn read_rules(path: &Path) -> Result<Vec<Rule>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&text).with_context(|| format!("Invalid rules file {}", path.display()))
}
