use std::collections::HashMap;

use async_trait::async_trait;
use dlqr_core::{Result, TopicKey};
use serde_json::Value;

use crate::source::MessageSource;

/// Serves one fixed document per topic; partition and offset are ignored
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    samples: HashMap<String, Value>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample(mut self, topic: impl Into<String>, document: Value) -> Self {
        self.insert(topic, document);
        self
    }

    pub fn insert(&mut self, topic: impl Into<String>, document: Value) {
        self.samples.insert(topic.into(), document);
    }
}

#[async_trait]
impl MessageSource for StaticSource {
    async fn fetch_sample(&self, key: &TopicKey) -> Result<Option<Value>> {
        Ok(self.samples.get(&key.topic).cloned())
    }
}
