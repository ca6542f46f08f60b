use std::path::PathBuf;

use anyhow::{Result, bail};
use dlqr_config::Config;
use dlqr_core::{ApplyResult, AuditEntry, Scope};
use dlqr_engine::RuleSetEditor;
use dlqr_storage::RuleStore;
use serde_json::Value;

use super::{open_store, read_rules, read_text, rule_set_key};

pub struct PreviewArgs {
    pub sample: String,
    pub rules: Option<PathBuf>,
    pub scope: Option<Scope>,
    pub key: Option<String>,
    pub diff: bool,
    pub json: bool,
}

pub async fn handle(args: PreviewArgs, db: Option<PathBuf>, config: &Config) -> Result<()> {
    let sample_text = read_text(&args.sample).await?;

    let rules = match &args.rules {
        Some(path) => read_rules(path).await?,
        None => {
            let key = rule_set_key(args.scope, args.key.clone(), config);
            let store = open_store(db, config).await?;
            let rules = store.load(&key).await?;
            if rules.is_empty() {
                bail!("No rules stored for {}", key);
            }
            rules
        }
    };

    let mut editor = RuleSetEditor::new(rules, sample_text);
    editor.preview();
    let Some(result) = editor.last_preview() else {
        bail!("{}", editor.error().unwrap_or("Preview failed"));
    };

    let delta = if args.diff { editor.diff() } else { None };

    if args.json {
        let mut output = serde_json::to_value(result)?;
        if args.diff {
            output["delta"] = delta.map(|delta| delta.to_json()).unwrap_or(Value::Null);
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_result(result)?;

    if args.diff {
        println!();
        match delta {
            Some(delta) => {
                println!("Changes:");
                for change in delta.changes() {
                    println!("  {}", change);
                }
            }
            None => println!("No changes."),
        }
    }

    Ok(())
}

fn print_result(result: &ApplyResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&result.redacted_document)?);
    println!();
    println!("Audit:");
    for entry in &result.audit {
        print_entry(entry);
    }

    let failed = result.errors().count();
    if failed > 0 {
        println!();
        println!(
            "{} of {} rules failed; the rest were applied.",
            failed,
            result.audit.len()
        );
    }

    if result.preview_hashed {
        println!();
        println!("Note: hashed values are preview-only and must not be persisted.");
    }
    Ok(())
}

pub fn print_entry(entry: &AuditEntry) {
    match &entry.error {
        Some(error) => println!("  ✗ {} {}: {}", entry.action, entry.path, error),
        None => println!(
            "  ✓ {} {} ({} {})",
            entry.action,
            entry.path,
            entry.match_count,
            if entry.match_count == 1 { "match" } else { "matches" }
        ),
    }
    if let Some(note) = &entry.note {
        println!("    {}", note);
    }
}
