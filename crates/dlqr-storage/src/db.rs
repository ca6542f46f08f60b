//! SQLite rule store

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use dlqr_core::{Rule, RuleSetKey, Scope};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use time::OffsetDateTime;
use tracing::debug;

use crate::models::{RuleSetRecord, fingerprint};
use crate::{Result, RuleStore, StorageError, check_rules};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS rule_sets (\
    scope TEXT NOT NULL,\
    set_key TEXT NOT NULL,\
    rules_json TEXT NOT NULL,\
    rules_hash TEXT NOT NULL,\
    updated_at INTEGER NOT NULL,\
    PRIMARY KEY (scope, set_key)\
);";

pub struct SqliteRuleStore {
    pool: SqlitePool,
}

impl SqliteRuleStore {
    /// Open (or create) the database, defaulting to the user data directory
    pub async fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        debug!(path = %path.display(), "Opened rule store");
        Self::with_pool(pool).await
    }

    /// A private database that lives as long as the store
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "dlqr", "dlqr")
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("rules.db"))
    }

    /// The stored row for `key`, with its fingerprint and last update time
    pub async fn record(&self, key: &RuleSetKey) -> Result<Option<RuleSetRecord>> {
        let row = sqlx::query(
            "SELECT scope, set_key, rules_json, rules_hash, updated_at \
             FROM rule_sets WHERE scope = ?1 AND set_key = ?2",
        )
        .bind(key.scope.as_str())
        .bind(stored_key(key))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_record(&row)).transpose()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn stored_key(key: &RuleSetKey) -> &str {
    key.key.as_deref().unwrap_or("")
}

fn decode_key(row: &SqliteRow) -> Result<RuleSetKey> {
    let scope: String = row.try_get("scope")?;
    let set_key: String = row.try_get("set_key")?;

    let scope = Scope::from_str(&scope).map_err(|e| StorageError::Corrupt {
        key: format!("{}:{}", scope, set_key),
        reason: e.to_string(),
    })?;
    Ok(RuleSetKey::new(scope, Some(set_key)))
}

fn decode_record(row: &SqliteRow) -> Result<RuleSetRecord> {
    let key = decode_key(row)?;
    let rules_json: String = row.try_get("rules_json")?;
    let rules_hash: String = row.try_get("rules_hash")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    if fingerprint(&rules_json) != rules_hash {
        return Err(StorageError::Corrupt {
            key: key.index(),
            reason: "rules do not match their fingerprint".to_string(),
        });
    }

    let updated_at =
        OffsetDateTime::from_unix_timestamp(updated_at).map_err(|e| StorageError::Corrupt {
            key: key.index(),
            reason: e.to_string(),
        })?;

    Ok(RuleSetRecord {
        rules: serde_json::from_str(&rules_json)?,
        key,
        rules_hash,
        updated_at,
    })
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn load(&self, key: &RuleSetKey) -> Result<Vec<Rule>> {
        Ok(self
            .record(key)
            .await?
            .map(|record| record.rules)
            .unwrap_or_default())
    }

    async fn save(&self, key: &RuleSetKey, rules: &[Rule]) -> Result<()> {
        check_rules(rules)?;

        let rules_json = serde_json::to_string(rules)?;
        let rules_hash = fingerprint(&rules_json);
        let updated_at = OffsetDateTime::now_utc().unix_timestamp();

        sqlx::query(
            "INSERT INTO rule_sets (scope, set_key, rules_json, rules_hash, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(scope, set_key) DO UPDATE SET \
             rules_json = excluded.rules_json, \
             rules_hash = excluded.rules_hash, \
             updated_at = excluded.updated_at",
        )
        .bind(key.scope.as_str())
        .bind(stored_key(key))
        .bind(&rules_json)
        .bind(&rules_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, rules = rules.len(), hash = %rules_hash, "Stored rule set");
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<RuleSetKey>> {
        let rows = sqlx::query("SELECT scope, set_key FROM rule_sets")
            .fetch_all(&self.pool)
            .await?;

        let mut keys = rows
            .iter()
            .map(decode_key)
            .collect::<Result<Vec<_>>>()?;
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlqr_core::{HashOptions, MaskOptions};
    use tempfile::TempDir;

    fn sample_rules() -> Vec<Rule> {
        vec![
            Rule::mask("$.customer.email", MaskOptions::keep_last(3)).with_note("mask email"),
            Rule::hash(
                "$.payment.card.number",
                HashOptions {
                    secret_label: Some("REDACTION_KEY".to_string()),
                    short_form: true,
                },
            ),
            Rule::remove("$.payment.card.cvv").disabled(),
        ]
    }

    #[tokio::test]
    async fn test_round_trip_in_memory() {
        let store = SqliteRuleStore::in_memory().await.unwrap();
        let key = RuleSetKey::topic("orders-DLQ");
        let rules = sample_rules();

        assert!(store.load(&key).await.unwrap().is_empty());

        store.save(&key, &rules).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap(), rules);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_refingerprints() {
        let store = SqliteRuleStore::in_memory().await.unwrap();
        let key = RuleSetKey::global();

        store.save(&key, &sample_rules()).await.unwrap();
        let first = store.record(&key).await.unwrap().unwrap();

        store.save(&key, &[Rule::remove("$.secret")]).await.unwrap();
        let second = store.record(&key).await.unwrap().unwrap();

        assert_eq!(second.rules.len(), 1);
        assert_ne!(first.rules_hash, second.rules_hash);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.list_keys().await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn test_invalid_rules_not_written() {
        let store = SqliteRuleStore::in_memory().await.unwrap();
        let key = RuleSetKey::global();

        let result = store.save(&key, &[Rule::remove("")]).await;
        assert!(matches!(result, Err(StorageError::InvalidRules(_))));
        assert!(store.record(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tampered_row_is_corrupt() {
        let store = SqliteRuleStore::in_memory().await.unwrap();
        let key = RuleSetKey::topic("orders-DLQ");
        store.save(&key, &sample_rules()).await.unwrap();

        sqlx::query("UPDATE rule_sets SET rules_json = '[]'")
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.load(&key).await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("rules.db");
        let key = RuleSetKey::topic("payments-DLQ");

        let store = SqliteRuleStore::new(Some(path.clone())).await.unwrap();
        store.save(&key, &sample_rules()).await.unwrap();
        store.close().await;

        let reopened = SqliteRuleStore::new(Some(path)).await.unwrap();
        assert_eq!(reopened.load(&key).await.unwrap().len(), 3);
    }
}
