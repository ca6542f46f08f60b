use std::path::PathBuf;

use anyhow::{Result, bail};
use dlqr_config::Config;
use dlqr_core::TopicKey;
use dlqr_sources::{DirectorySource, MessageSource};

pub async fn handle(
    topic: String,
    partition: Option<i32>,
    offset: Option<i64>,
    dir: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let Some(dir) = dir.or_else(|| config.sources.sample_dir.clone()) else {
        bail!(
            "No dump directory: pass --dir or set sources.sample_dir in {}",
            Config::config_path().display()
        );
    };

    let source = DirectorySource::new(dir);
    let key = TopicKey {
        topic,
        partition,
        offset,
    };

    match source.fetch_sample(&key).await? {
        Some(document) => println!("{}", serde_json::to_string_pretty(&document)?),
        None => println!("No message found for {}.", key),
    }

    Ok(())
}
