//! Rule apply engine for dlqr
//!
//! This crate provides:
//! - `RuleEngine`: applies an ordered rule list to a document copy
//! - `diff`: structural delta between the original and redacted documents
//! - `session`: the rule set editor that drives previews and saves
//! - `validate`: optional, debounced path validation

pub mod diff;
pub mod session;
pub mod validate;

use std::sync::Arc;

use dlqr_core::{ApplyResult, AuditEntry, RedactionAction, Result, Rule};
use dlqr_security::{FieldHasher, JsonPointer, PreviewHasher, path, pointer, transform};
use serde_json::Value;
use tracing::{debug, warn};

pub use diff::{Change, ChangeKind, Delta, diff};
pub use session::{RuleSetEditor, SampleState};
pub use validate::{LocalPathValidator, PathValidator, ValidationDebouncer, ValidationOutcome};

/// Applies redaction rules. Holds no per-call state, so one engine can
/// serve concurrent previews.
#[derive(Clone)]
pub struct RuleEngine {
    hasher: Arc<dyn FieldHasher>,
}

impl RuleEngine {
    /// Engine for previews, hashing with [`PreviewHasher`]
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(PreviewHasher))
    }

    pub fn with_hasher(hasher: Arc<dyn FieldHasher>) -> Self {
        Self { hasher }
    }

    /// Apply `rules` in order to a copy of `document`.
    ///
    /// Each rule resolves against the copy as left by the rules before it.
    /// Per-rule and per-location failures end up in the audit trail; the
    /// only error is an enabled rule with an empty path.
    pub fn apply(&self, document: &Value, rules: &[Rule]) -> Result<ApplyResult> {
        for rule in rules.iter().filter(|rule| rule.enabled) {
            rule.validate()?;
        }

        let mut working = document.clone();
        let mut audit = Vec::with_capacity(rules.len());
        let mut preview_hashed = false;

        for rule in rules.iter().filter(|rule| rule.enabled) {
            let entry = self.apply_rule(&mut working, rule);
            debug!(
                rule_id = %rule.id,
                action = %rule.action,
                matches = entry.match_count,
                failed = entry.is_error(),
                "Applied rule"
            );

            // Sticky: a later REMOVE of the hashed field does not clear it
            if rule.action == RedactionAction::Hash
                && entry.match_count > 0
                && self.hasher.is_preview()
            {
                preview_hashed = true;
            }
            audit.push(entry);
        }

        Ok(ApplyResult {
            redacted_document: working,
            audit,
            preview_hashed,
        })
    }

    fn apply_rule(&self, working: &mut Value, rule: &Rule) -> AuditEntry {
        let mut pointers = match path::resolve(working, &rule.path) {
            Ok(pointers) => pointers,
            Err(e) => {
                warn!(rule_id = %rule.id, error = %e, "Rule path did not resolve");
                return AuditEntry::failed(rule, e.to_string());
            }
        };

        // Deepest and highest index first, so no deletion shifts a pending pointer
        if rule.action == RedactionAction::Remove {
            pointers.sort_by(|a, b| b.cmp_location(a));
        }

        let mut matched = 0;
        let mut failures = Vec::new();

        for pointer in &pointers {
            match self.transform_at(working, pointer, rule) {
                Some(Ok(())) => matched += 1,
                Some(Err(e)) => {
                    debug!(rule_id = %rule.id, pointer = %pointer, error = %e, "Transform failed");
                    failures.push(e.to_string());
                }
                None => {}
            }
        }

        let mut entry = AuditEntry::for_rule(rule, matched);
        if matched == 0
            && let Some(first) = failures.first()
        {
            entry.error = Some(if failures.len() == 1 {
                first.clone()
            } else {
                format!("all {} matches failed; first: {}", failures.len(), first)
            });
        }
        entry
    }

    /// `None` when the location no longer exists
    fn transform_at(
        &self,
        working: &mut Value,
        pointer: &JsonPointer,
        rule: &Rule,
    ) -> Option<Result<()>> {
        let current = pointer::get(working, pointer)?;

        let replacement = match rule.action {
            RedactionAction::Mask => transform::mask(current, rule.mask_options()),
            RedactionAction::Hash => Ok(transform::hash(
                self.hasher.as_ref(),
                current,
                rule.hash_options(),
            )),
            RedactionAction::Remove => {
                return Some(transform::remove(working, pointer).map(|_| ()));
            }
        };

        Some(replacement.map(|value| pointer::set(working, pointer, value)))
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlqr_core::{CoreError, HashOptions, MaskOptions};
    use serde_json::json;

    fn apply(document: &Value, rules: &[Rule]) -> ApplyResult {
        RuleEngine::new().apply(document, rules).unwrap()
    }

    #[test]
    fn test_mask_email_scenario() {
        let doc = json!({ "customer": { "email": "alice@example.com" } });
        let rules = vec![Rule::mask("$.customer.email", MaskOptions::keep_last(3))];

        let result = apply(&doc, &rules);
        assert_eq!(
            result.redacted_document,
            json!({ "customer": { "email": "**************com" } })
        );
        assert_eq!(
            result.audit,
            vec![AuditEntry {
                path: "$.customer.email".to_string(),
                action: RedactionAction::Mask,
                match_count: 1,
                note: None,
                error: None,
            }]
        );
    }

    #[test]
    fn test_remove_card_scenario() {
        let doc = json!({ "card": { "number": "4111111111111111" } });
        let result = apply(&doc, &[Rule::remove("$.card.number")]);

        assert_eq!(result.redacted_document, json!({ "card": {} }));
        assert_eq!(result.audit[0].match_count, 1);
    }

    #[test]
    fn test_unmatched_path_scenario() {
        let doc = json!({ "a": 1 });
        let result = apply(&doc, &[Rule::remove("$.nonexistent.field")]);

        assert_eq!(result.redacted_document, doc);
        assert_eq!(result.audit[0].match_count, 0);
        assert_eq!(result.audit[0].error, None);
    }

    #[test]
    fn test_invalid_path_does_not_abort_pass() {
        let doc = json!({ "secret": "s3cr3t", "keep": 1 });
        let rules = vec![
            Rule::remove("$.["),
            Rule::mask("$.secret", MaskOptions::default()),
        ];

        let result = apply(&doc, &rules);
        assert_eq!(result.audit.len(), 2);
        assert_eq!(result.audit[0].match_count, 0);
        assert!(!result.audit[0].error.as_deref().unwrap_or_default().is_empty());
        assert_eq!(result.audit[1].match_count, 1);
        assert_eq!(result.redacted_document["secret"], json!("******"));
    }

    #[test]
    fn test_wildcard_match_count() {
        let doc = json!({ "items": [{ "secret": "x" }, { "secret": "y" }, { "other": 1 }] });
        let result = apply(&doc, &[Rule::mask("$.items[*].secret", MaskOptions::default())]);

        assert_eq!(result.audit[0].match_count, 2);
        assert_eq!(
            result.redacted_document,
            json!({ "items": [{ "secret": "*" }, { "secret": "*" }, { "other": 1 }] })
        );
    }

    #[test]
    fn test_order_sensitivity() {
        let doc = json!({ "a": { "b": "value" } });
        let rules = vec![
            Rule::remove("$.a"),
            Rule::mask("$.a.b", MaskOptions::default()),
        ];

        let result = apply(&doc, &rules);
        assert_eq!(result.audit[0].match_count, 1);
        assert_eq!(result.audit[1].match_count, 0);
        assert_eq!(result.audit[1].error, None);
        assert_eq!(result.redacted_document, json!({}));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let doc = json!({ "card": { "number": "4111", "exp": "12/30" } });
        let rules = vec![Rule::remove("$.card.number")];

        let once = apply(&doc, &rules);
        let twice = apply(&once.redacted_document, &rules);

        assert_eq!(once.redacted_document, twice.redacted_document);
        assert_eq!(twice.audit[0].match_count, 0);
    }

    #[test]
    fn test_remove_every_array_element() {
        let doc = json!({ "items": ["a", "b", "c"], "keep": true });
        let result = apply(&doc, &[Rule::remove("$.items[*]")]);

        assert_eq!(result.audit[0].match_count, 3);
        assert_eq!(result.redacted_document, json!({ "items": [], "keep": true }));
    }

    #[test]
    fn test_remove_nested_matches() {
        let doc = json!({ "a": { "token": "t1", "b": { "token": "t2" } } });
        let result = apply(&doc, &[Rule::remove("$..token")]);

        assert_eq!(result.audit[0].match_count, 2);
        assert_eq!(result.redacted_document, json!({ "a": { "b": {} } }));
    }

    #[test]
    fn test_disabled_rules_are_skipped_without_audit() {
        let doc = json!({ "a": "x" });
        let rules = vec![
            Rule::remove("$.a").disabled(),
            Rule::mask("$.a", MaskOptions::fixed("[REDACTED]")).with_note("fixed"),
        ];

        let result = apply(&doc, &rules);
        assert_eq!(result.audit.len(), 1);
        assert_eq!(result.audit[0].action, RedactionAction::Mask);
        assert_eq!(result.audit[0].note.as_deref(), Some("fixed"));
        assert_eq!(result.redacted_document, json!({ "a": "[REDACTED]" }));
    }

    #[test]
    fn test_transformer_failures_are_contained() {
        let doc = json!({ "a": { "nested": true }, "b": "text" });

        let all_fail = apply(&doc, &[Rule::mask("$.a", MaskOptions::default())]);
        assert_eq!(all_fail.audit[0].match_count, 0);
        assert!(all_fail.audit[0].error.is_some());
        assert_eq!(all_fail.redacted_document, doc);

        let partial = apply(&doc, &[Rule::mask("$.*", MaskOptions::default())]);
        assert_eq!(partial.audit[0].match_count, 1);
        assert_eq!(partial.audit[0].error, None);
        assert_eq!(partial.redacted_document["b"], json!("****"));
    }

    #[test]
    fn test_remove_root_is_reported() {
        let doc = json!({ "a": 1 });
        let result = apply(&doc, &[Rule::remove("$")]);

        assert_eq!(result.audit[0].match_count, 0);
        assert!(result.audit[0].error.is_some());
        assert_eq!(result.redacted_document, doc);
    }

    #[test]
    fn test_hash_marks_preview() {
        let doc = json!({ "card": "4111111111111111" });
        let short = HashOptions {
            secret_label: Some("REDACTION_KEY".to_string()),
            short_form: true,
        };
        let result = apply(&doc, &[Rule::hash("$.card", short)]);

        let hashed = result.redacted_document["card"].as_str().unwrap();
        assert!(hashed.starts_with("h:"));
        assert_eq!(hashed.len(), 10);
        assert!(result.preview_hashed);
        assert!(result.ensure_durable().is_err());
    }

    #[test]
    fn test_hash_with_keyed_hasher_is_durable() {
        struct Keyed;
        impl FieldHasher for Keyed {
            fn hash(&self, input: &str, _options: &HashOptions) -> String {
                format!("k:{}", input.len())
            }
        }

        let engine = RuleEngine::with_hasher(Arc::new(Keyed));
        let doc = json!({ "card": "4111" });
        let result = engine
            .apply(&doc, &[Rule::hash("$.card", HashOptions::default())])
            .unwrap();

        assert_eq!(result.redacted_document["card"], json!("k:4"));
        assert!(!result.preview_hashed);
        assert!(result.ensure_durable().is_ok());
    }

    #[test]
    fn test_mask_preserves_null() {
        let doc = json!({ "a": null });
        let result = apply(&doc, &[Rule::mask("$.a", MaskOptions::default())]);

        assert_eq!(result.audit[0].match_count, 1);
        assert_eq!(result.redacted_document, doc);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let doc = json!({});
        let err = RuleEngine::new()
            .apply(&doc, &[Rule::remove("  ")])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRule { .. }));
    }

    #[test]
    fn test_input_is_not_modified() {
        let doc = json!({ "a": [1, 2, 3], "b": { "c": "d" } });
        let before = doc.clone();
        let rules = vec![
            Rule::remove("$.a[0]"),
            Rule::mask("$.b.c", MaskOptions::default()),
        ];

        let _ = apply(&doc, &rules);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_audit_follows_rule_order() {
        let doc = json!({ "z": "1", "a": "2" });
        let rules = vec![
            Rule::mask("$.z", MaskOptions::default()),
            Rule::mask("$.a", MaskOptions::default()),
        ];

        let result = apply(&doc, &rules);
        let paths: Vec<_> = result.audit.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["$.z", "$.a"]);
    }

    #[test]
    fn test_remove_union_in_any_written_order() {
        let result = apply(&json!({ "xs": ["a", "b", "c"] }), &[Rule::remove("$.xs[2,0]")]);
        assert_eq!(result.audit[0].match_count, 2);
        assert_eq!(result.redacted_document, json!({ "xs": ["b"] }));

        let result = apply(
            &json!({ "xs": ["a", "b", "c", "d"] }),
            &[Rule::remove("$.xs[-1,1]")],
        );
        assert_eq!(result.audit[0].match_count, 2);
        assert_eq!(result.redacted_document, json!({ "xs": ["a", "c"] }));
    }

    #[test]
    fn test_remove_orders_indices_numerically() {
        let xs: Vec<i32> = (0..12).collect();
        let result = apply(&json!({ "xs": xs }), &[Rule::remove("$.xs[9,10,2]")]);

        assert_eq!(result.audit[0].match_count, 3);
        assert_eq!(
            result.redacted_document,
            json!({ "xs": [0, 1, 3, 4, 5, 6, 7, 8, 11] })
        );
    }

    #[test]
    fn test_disabled_rule_with_empty_path_is_ignored() {
        let doc = json!({ "a": "x" });
        let rules = vec![Rule::remove("").disabled(), Rule::remove("$.a")];

        let result = RuleEngine::new().apply(&doc, &rules).unwrap();
        assert_eq!(result.audit.len(), 1);
        assert_eq!(result.redacted_document, json!({}));
    }

    #[test]
    fn test_preview_flag_survives_removal_of_hashed_value() {
        let doc = json!({ "card": "4111111111111111" });
        let rules = vec![
            Rule::hash("$.card", HashOptions::default()),
            Rule::remove("$.card"),
        ];

        let result = apply(&doc, &rules);
        assert_eq!(result.redacted_document, json!({}));
        assert!(result.preview_hashed);
    }
}
