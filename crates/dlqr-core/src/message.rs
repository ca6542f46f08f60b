//! Dead-letter message model

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// Addresses a sample in a DLQ topic. Partition and offset narrow the pick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicKey {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl TopicKey {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            offset: None,
        }
    }

    pub fn at(mut self, partition: i32, offset: i64) -> Self {
        self.partition = Some(partition);
        self.offset = Some(offset);
        self
    }

    pub fn matches(&self, message: &DlqMessage) -> bool {
        self.partition.is_none_or(|p| p == message.partition)
            && self.offset.is_none_or(|o| o == message.offset)
    }
}

impl std::fmt::Display for TopicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.topic)?;
        if let Some(partition) = self.partition {
            write!(f, "[{}]", partition)?;
        }
        if let Some(offset) = self.offset {
            write!(f, "@{}", offset)?;
        }
        Ok(())
    }
}

/// A message parked in a dead-letter queue, as shown to operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub partition: i32,
    pub offset: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_utf8: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_utf8: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_base64: Option<String>,
    /// Header values, base64 encoded
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl DlqMessage {
    /// Parse the value as a JSON sample document.
    ///
    /// Falls back to the base64 value when there is no UTF-8 rendering,
    /// as long as the decoded bytes read as text.
    pub fn payload(&self) -> Result<serde_json::Value> {
        if let Some(text) = self.value_utf8.as_deref() {
            return parse_document(text);
        }

        let text = self
            .value_base64
            .as_deref()
            .and_then(|encoded| B64.decode(encoded).ok())
            .and_then(|bytes| decode_utf8(&bytes))
            .ok_or_else(|| {
                CoreError::MalformedDocument(format!(
                    "message {}:{} has no text payload",
                    self.partition, self.offset
                ))
            })?;

        parse_document(&text)
    }
}

/// Parse operator-supplied text into a document
pub fn parse_document(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| CoreError::MalformedDocument(e.to_string()))
}

/// Decode bytes as text unless they look binary.
/// More than two control characters outside `\t`..`\r` counts as binary.
pub fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let controls = text
        .chars()
        .filter(|&c| c < '\u{09}' || ('\u{0D}' < c && c < '\u{20}'))
        .count();

    (controls <= 2).then(|| text.into_owned())
}
