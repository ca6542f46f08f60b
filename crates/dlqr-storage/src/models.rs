use dlqr_core::{Rule, RuleSetKey};
use serde::Serialize;
use time::OffsetDateTime;

/// A stored rule set with its bookkeeping columns
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetRecord {
    pub key: RuleSetKey,
    pub rules: Vec<Rule>,
    /// blake3 of the serialized rules
    pub rules_hash: String,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

pub(crate) fn fingerprint(rules_json: &str) -> String {
    blake3::hash(rules_json.as_bytes()).to_hex().to_string()
}
