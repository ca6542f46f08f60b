//! In-memory rule store

use std::collections::HashMap;

use async_trait::async_trait;
use dlqr_core::{Rule, RuleSetKey};
use tokio::sync::RwLock;

use crate::{Result, RuleStore, check_rules};

#[derive(Default)]
pub struct MemoryRuleStore {
    sets: RwLock<HashMap<RuleSetKey, Vec<Rule>>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn load(&self, key: &RuleSetKey) -> Result<Vec<Rule>> {
        let sets = self.sets.read().await;
        Ok(sets.get(key).cloned().unwrap_or_default())
    }

    async fn save(&self, key: &RuleSetKey, rules: &[Rule]) -> Result<()> {
        check_rules(rules)?;
        let mut sets = self.sets.write().await;
        sets.insert(key.clone(), rules.to_vec());
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<RuleSetKey>> {
        let sets = self.sets.read().await;
        let mut keys: Vec<RuleSetKey> = sets.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlqr_core::{MaskOptions, Scope};

    #[tokio::test]
    async fn test_unknown_key_is_empty() {
        let store = MemoryRuleStore::new();
        assert!(store.load(&RuleSetKey::global()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_list() {
        let store = MemoryRuleStore::new();
        let key = RuleSetKey::topic("orders-DLQ");

        store
            .save(&key, &[Rule::remove("$.a"), Rule::remove("$.b")])
            .await
            .unwrap();
        store
            .save(&key, &[Rule::mask("$.c", MaskOptions::keep_last(2))])
            .await
            .unwrap();

        let rules = store.load(&key).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].path, "$.c");
    }

    #[tokio::test]
    async fn test_invalid_rules_rejected() {
        let store = MemoryRuleStore::new();
        let key = RuleSetKey::global();

        store.save(&key, &[Rule::remove("$.a")]).await.unwrap();
        assert!(store.save(&key, &[Rule::remove("  ")]).await.is_err());

        // The previous set survives a rejected save
        assert_eq!(store.load(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_keys_sorted() {
        let store = MemoryRuleStore::new();
        store.save(&RuleSetKey::topic("b"), &[]).await.unwrap();
        store.save(&RuleSetKey::global(), &[]).await.unwrap();
        store
            .save(&RuleSetKey::new(Scope::Pattern, Some("*-DLQ".into())), &[])
            .await
            .unwrap();

        let keys = store.list_keys().await.unwrap();
        let indexes: Vec<String> = keys.iter().map(RuleSetKey::index).collect();
        assert_eq!(indexes, vec!["global:_", "topic:b", "pattern:*-DLQ"]);
    }
}
