//! Redaction rule domain model

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedactionAction {
    Mask,
    Remove,
    Hash,
}

impl RedactionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionAction::Mask => "MASK",
            RedactionAction::Remove => "REMOVE",
            RedactionAction::Hash => "HASH",
        }
    }
}

impl std::fmt::Display for RedactionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RedactionAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MASK" => Ok(RedactionAction::Mask),
            "REMOVE" => Ok(RedactionAction::Remove),
            "HASH" => Ok(RedactionAction::Hash),
            other => Err(CoreError::Other(anyhow::anyhow!(
                "Unknown redaction action: {}",
                other
            ))),
        }
    }
}

/// Options for the MASK action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_first: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_last: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad: Option<String>,

    /// Replaces the whole value when set and non-empty
    #[serde(
        default,
        rename = "fixed",
        alias = "fixedReplacement",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_replacement: Option<String>,
}

impl MaskOptions {
    pub fn keep_last(n: usize) -> Self {
        Self {
            keep_last: Some(n),
            pad: Some("*".to_string()),
            ..Default::default()
        }
    }

    pub fn fixed(replacement: impl Into<String>) -> Self {
        Self {
            fixed_replacement: Some(replacement.into()),
            ..Default::default()
        }
    }
}

/// Options for the HASH action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashOptions {
    /// Label of the secret a production hasher resolves; never the secret itself
    #[serde(
        default,
        rename = "secretRef",
        alias = "secretLabel",
        skip_serializing_if = "Option::is_none"
    )]
    pub secret_label: Option<String>,

    #[serde(default, rename = "short", alias = "shortForm")]
    pub short_form: bool,
}

/// A single path-based redaction rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default = "new_rule_id")]
    pub id: String,

    pub path: String,

    pub action: RedactionAction,

    #[serde(default, alias = "maskOptions", skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskOptions>,

    #[serde(default, alias = "hashOptions", skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashOptions>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn new_rule_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn new(path: impl Into<String>, action: RedactionAction) -> Self {
        Self {
            id: new_rule_id(),
            path: path.into(),
            action,
            mask: None,
            hash: None,
            enabled: true,
            note: None,
        }
    }

    pub fn mask(path: impl Into<String>, options: MaskOptions) -> Self {
        Self::new(path, RedactionAction::Mask).with_mask(options)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::new(path, RedactionAction::Remove)
    }

    pub fn hash(path: impl Into<String>, options: HashOptions) -> Self {
        Self::new(path, RedactionAction::Hash).with_hash(options)
    }

    pub fn with_mask(mut self, options: MaskOptions) -> Self {
        self.mask = Some(options);
        self
    }

    pub fn with_hash(mut self, options: HashOptions) -> Self {
        self.hash = Some(options);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.path.trim().is_empty()
    }

    /// Precondition check used by the apply engine and the rule store
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CoreError::InvalidRule {
                id: self.id.clone(),
                reason: "path must not be empty".to_string(),
            })
        }
    }

    /// Mask options, only when this rule masks
    pub fn mask_options(&self) -> Option<&MaskOptions> {
        match self.action {
            RedactionAction::Mask => self.mask.as_ref(),
            _ => None,
        }
    }

    /// Hash options, only when this rule hashes
    pub fn hash_options(&self) -> Option<&HashOptions> {
        match self.action {
            RedactionAction::Hash => self.hash.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_deserialize_wire_names() {
        let json = r#"{
            "id": "r1",
            "path": "$.customer.email",
            "action": "MASK",
            "mask": { "keepLast": 3, "pad": "*" },
            "note": "mask email"
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, "r1");
        assert_eq!(rule.action, RedactionAction::Mask);
        assert!(rule.enabled);
        assert_eq!(rule.mask_options().unwrap().keep_last, Some(3));
        assert_eq!(rule.note.as_deref(), Some("mask email"));
    }

    #[test]
    fn test_rule_deserialize_aliases() {
        let json = r#"{
            "path": "$.card",
            "action": "HASH",
            "hashOptions": { "secretLabel": "REDACTION_KEY", "shortForm": true },
            "enabled": false
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert!(!rule.id.is_empty());
        assert!(!rule.enabled);
        let hash = rule.hash_options().unwrap();
        assert_eq!(hash.secret_label.as_deref(), Some("REDACTION_KEY"));
        assert!(hash.short_form);
    }

    #[test]
    fn test_options_ignored_for_other_action() {
        let rule = Rule::remove("$.a").with_mask(MaskOptions::keep_last(2));
        assert!(rule.mask_options().is_none());
        assert!(rule.hash_options().is_none());
    }

    #[test]
    fn test_rule_validity() {
        assert!(Rule::remove("$.a").is_valid());
        assert!(!Rule::remove("   ").is_valid());
        assert!(matches!(
            Rule::remove("").validate(),
            Err(CoreError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let rule = Rule::mask("$.x", MaskOptions::fixed("[REDACTED]"));
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["action"], "MASK");
        assert_eq!(value["mask"]["fixed"], "[REDACTED]");
        assert!(value.get("hash").is_none());
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("hash".parse::<RedactionAction>().unwrap(), RedactionAction::Hash);
        assert!("blur".parse::<RedactionAction>().is_err());
    }
}
