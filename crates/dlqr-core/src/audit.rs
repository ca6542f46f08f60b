//! Apply results and the per-rule audit trail

use serde::{Deserialize, Serialize};

use crate::rule::{RedactionAction, Rule};
use crate::{CoreError, Result};

/// How one enabled rule fared during an apply pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub path: String,
    pub action: RedactionAction,
    #[serde(alias = "count")]
    pub match_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn for_rule(rule: &Rule, match_count: usize) -> Self {
        Self {
            path: rule.path.clone(),
            action: rule.action,
            match_count,
            note: rule.note.clone(),
            error: None,
        }
    }

    pub fn failed(rule: &Rule, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::for_rule(rule, 0)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub redacted_document: serde_json::Value,
    pub audit: Vec<AuditEntry>,
    /// Set when any HASH value in `redacted_document` came from a preview hasher
    #[serde(default)]
    pub preview_hashed: bool,
}

impl ApplyResult {
    pub fn total_matches(&self) -> usize {
        self.audit.iter().map(|entry| entry.match_count).sum()
    }

    pub fn errors(&self) -> impl Iterator<Item = &AuditEntry> {
        self.audit.iter().filter(|entry| entry.is_error())
    }

    /// Gate for any path that writes or replays the redacted document.
    /// Preview hashes are deterministic and unkeyed, so they must never leave the preview.
    pub fn ensure_durable(&self) -> Result<()> {
        if self.preview_hashed {
            Err(CoreError::PreviewHashNotDurable)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_entry_serialization() {
        let rule = Rule::remove("$.card.number").with_note("pci");
        let entry = AuditEntry::for_rule(&rule, 1);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({ "path": "$.card.number", "action": "REMOVE", "matchCount": 1, "note": "pci" })
        );
    }

    #[test]
    fn test_failed_entry_has_zero_matches() {
        let rule = Rule::remove("$.[");
        let entry = AuditEntry::failed(&rule, "boom");
        assert_eq!(entry.match_count, 0);
        assert!(entry.is_error());
    }

    #[test]
    fn test_errors_lists_failed_entries_only() {
        let ok = Rule::remove("$.a");
        let bad = Rule::remove("$.[");
        let result = ApplyResult {
            redacted_document: json!({}),
            audit: vec![AuditEntry::for_rule(&ok, 1), AuditEntry::failed(&bad, "boom")],
            preview_hashed: false,
        };

        let failed: Vec<_> = result.errors().map(|entry| entry.path.as_str()).collect();
        assert_eq!(failed, vec!["$.["]);
        assert_eq!(result.total_matches(), 1);
    }

    #[test]
    fn test_ensure_durable() {
        let mut result = ApplyResult {
            redacted_document: json!({}),
            audit: Vec::new(),
            preview_hashed: false,
        };
        assert!(result.ensure_durable().is_ok());

        result.preview_hashed = true;
        assert!(matches!(
            result.ensure_durable(),
            Err(CoreError::PreviewHashNotDurable)
        ));
    }
}
