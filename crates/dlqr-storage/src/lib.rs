//! Rule set persistence for dlqr
//!
//! This crate provides:
//! - The `RuleStore` trait the editor and CLI save through
//! - An in-memory store for tests and one-off sessions
//! - A SQLite store keyed by scope and key

pub mod db;
pub mod error;
pub mod memory;
pub mod models;

pub use db::SqliteRuleStore;
pub use error::{Result, StorageError};
pub use memory::MemoryRuleStore;
pub use models::RuleSetRecord;

use async_trait::async_trait;
use dlqr_core::{Rule, RuleSetKey};

/// Keyed rule set persistence
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// An unknown key loads as an empty list
    async fn load(&self, key: &RuleSetKey) -> Result<Vec<Rule>>;

    /// Replace the whole list stored under `key`
    async fn save(&self, key: &RuleSetKey, rules: &[Rule]) -> Result<()>;

    async fn list_keys(&self) -> Result<Vec<RuleSetKey>>;
}

/// Every rule must be valid before anything is written
pub(crate) fn check_rules(rules: &[Rule]) -> Result<()> {
    for rule in rules {
        rule.validate()?;
    }
    Ok(())
}
