//! Both backends behave the same through the trait object

use dlqr_core::{MaskOptions, Rule, RuleSetKey, Scope};
use dlqr_storage::{MemoryRuleStore, RuleStore, SqliteRuleStore};
use tempfile::TempDir;

async fn exercise(store: &dyn RuleStore) {
    let topic = RuleSetKey::topic("orders-DLQ");
    let pattern = RuleSetKey::new(Scope::Pattern, Some("*-DLQ".to_string()));

    assert!(store.load(&topic).await.unwrap().is_empty());

    let rules = vec![
        Rule::mask("$.customer.email", MaskOptions::keep_last(3)),
        Rule::remove("$.payment.card.cvv"),
    ];
    store.save(&topic, &rules).await.unwrap();
    store.save(&pattern, &rules[1..]).await.unwrap();

    assert_eq!(store.load(&topic).await.unwrap(), rules);
    assert_eq!(store.load(&pattern).await.unwrap().len(), 1);
    assert_eq!(store.list_keys().await.unwrap(), vec![topic.clone(), pattern]);

    assert!(store.save(&topic, &[Rule::remove("")]).await.is_err());
    assert_eq!(store.load(&topic).await.unwrap(), rules);
}

#[tokio::test]
async fn test_memory_store_contract() {
    exercise(&MemoryRuleStore::new()).await;
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    let temp = TempDir::new().unwrap();
    let store = SqliteRuleStore::new(Some(temp.path().join("rules.db")))
        .await
        .unwrap();
    exercise(&store).await;
}
