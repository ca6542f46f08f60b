use std::path::PathBuf;

use anyhow::{Result, bail};
use dlqr_config::Config;
use dlqr_core::RuleSetKey;
use dlqr_engine::RuleSetEditor;
use dlqr_storage::{RuleStore, SqliteRuleStore};

use super::preview::print_entry;
use super::{read_rules, read_text, rule_set_key};
use crate::cli::RulesCommands;

pub async fn handle(cmd: RulesCommands, store: &SqliteRuleStore, config: &Config) -> Result<()> {
    match cmd {
        RulesCommands::Show { scope, key } => show(store, rule_set_key(scope, key, config)).await,
        RulesCommands::Save {
            scope,
            key,
            file,
            sample,
        } => save(store, rule_set_key(scope, key, config), file, sample).await,
        RulesCommands::List => list(store).await,
    }
}

async fn show(store: &SqliteRuleStore, key: RuleSetKey) -> Result<()> {
    let Some(record) = store.record(&key).await? else {
        println!("No rules stored for {}.", key);
        return Ok(());
    };

    println!("Rule set: {}", record.key);
    println!(
        "  Fingerprint: {}",
        record.rules_hash.get(..16).unwrap_or(&record.rules_hash)
    );
    println!("  Updated: {}", record.updated_at);

    if record.rules.is_empty() {
        println!("\nNo rules.");
        return Ok(());
    }

    println!("\nRules ({}):", record.rules.len());
    for rule in &record.rules {
        let state = if rule.enabled { "" } else { " (disabled)" };
        println!("  [{}] {} {}{}", rule.id, rule.action, rule.path, state);
        if let Some(note) = &rule.note {
            println!("    {}", note);
        }
    }

    Ok(())
}

async fn save(
    store: &SqliteRuleStore,
    key: RuleSetKey,
    file: PathBuf,
    sample: Option<String>,
) -> Result<()> {
    let rules = read_rules(&file).await?;
    let count = rules.len();

    let Some(sample) = sample else {
        store.save(&key, &rules).await?;
        println!("✓ Saved {} rules to {}", count, key);
        return Ok(());
    };

    let mut editor = RuleSetEditor::new(rules, read_text(&sample).await?);
    editor.preview();
    let Some(result) = editor.last_preview() else {
        bail!("{}", editor.error().unwrap_or("Preview failed"));
    };

    println!("Preview:");
    for entry in &result.audit {
        print_entry(entry);
    }
    let matches = result.total_matches();

    editor.save(store, &key).await?;
    println!("✓ Saved {} rules to {}", count, key);
    println!("  Matches in sample: {}", matches);

    Ok(())
}

async fn list(store: &SqliteRuleStore) -> Result<()> {
    let keys = store.list_keys().await?;

    if keys.is_empty() {
        println!("No rule sets found.");
        return Ok(());
    }

    println!("Rule sets:");
    for key in keys {
        let rules = store.load(&key).await?;
        println!("  {} ({} rules)", key, rules.len());
    }

    Ok(())
}
