//! DLQ dumps on disk
//!
//! Each topic is a `<topic>.jsonl` file holding one message per line, in
//! the same shape the DLQ browser returns.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dlqr_core::{CoreError, DlqMessage, Result, TopicKey};
use serde_json::Value;
use tracing::debug;

use crate::source::MessageSource;

pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn topic_file(&self, topic: &str) -> Result<PathBuf> {
        if topic.is_empty() || topic.contains(['/', '\\']) || topic.contains("..") {
            return Err(CoreError::Other(anyhow::anyhow!(
                "Invalid topic name: {:?}",
                topic
            )));
        }
        Ok(self.root.join(format!("{}.jsonl", topic)))
    }

    /// All messages dumped for `topic`, in file order. A missing dump is empty.
    pub async fn messages(&self, topic: &str) -> Result<Vec<DlqMessage>> {
        let path = self.topic_file(topic)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No dump for topic");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<DlqMessage>(line).map_err(|e| {
                    CoreError::MalformedDocument(format!(
                        "{}:{}: {}",
                        path.display(),
                        n + 1,
                        e
                    ))
                })
            })
            .collect()
    }
}

#[async_trait]
impl MessageSource for DirectorySource {
    async fn fetch_sample(&self, key: &TopicKey) -> Result<Option<Value>> {
        let messages = self.messages(&key.topic).await?;

        let Some(message) = messages
            .iter()
            .filter(|message| key.matches(message))
            .max_by_key(|message| message.offset)
        else {
            return Ok(None);
        };

        debug!(
            topic = %key.topic,
            partition = message.partition,
            offset = message.offset,
            "Picked sample message"
        );
        message.payload().map(Some)
    }
}
