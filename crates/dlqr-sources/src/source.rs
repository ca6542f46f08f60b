//! Message source trait

use async_trait::async_trait;
use dlqr_core::{Result, TopicKey};
use serde_json::Value;

/// Supplies sample documents from dead-letter topics
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// The payload of the message `key` selects, or `None` if the topic has
    /// no matching message
    async fn fetch_sample(&self, key: &TopicKey) -> Result<Option<Value>>;
}
