use std::sync::Arc;

use anyhow::{Result, bail};
use dlqr_config::Config;
use dlqr_core::parse_document;
use dlqr_engine::{LocalPathValidator, PathValidator, ValidationDebouncer, ValidationOutcome};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::read_text;

pub async fn handle(expression: String, sample: Option<String>, config: &Config) -> Result<()> {
    let sample = match sample {
        Some(source) => parse_document(&read_text(&source).await?)?,
        None => json!({}),
    };

    if expression == "-" {
        return validate_stream(sample, config).await;
    }

    let outcome = LocalPathValidator.validate(&expression, &sample).await?;
    if !outcome.ok {
        bail!(
            "{}: {}",
            expression,
            outcome.message.unwrap_or_else(|| "invalid".to_string())
        );
    }
    report(&expression, &outcome);
    Ok(())
}

/// Validate expressions as they arrive on stdin, reporting only the ones
/// still current after the quiet period
async fn validate_stream(sample: Value, config: &Config) -> Result<()> {
    let debouncer = ValidationDebouncer::new(
        Some(Arc::new(LocalPathValidator)),
        config.preview.validate_debounce(),
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<String> = None;

    loop {
        let next = match pending.clone() {
            Some(expression) => {
                tokio::select! {
                    line = lines.next_line() => line?,
                    outcome = debouncer.submit(expression.clone(), sample.clone()) => {
                        if let Some(outcome) = outcome {
                            report(&expression, &outcome);
                        }
                        pending = None;
                        continue;
                    }
                }
            }
            None => lines.next_line().await?,
        };

        match next {
            Some(line) if !line.trim().is_empty() => pending = Some(line.trim().to_string()),
            Some(_) => {}
            None => break,
        }
    }

    if let Some(expression) = pending
        && let Some(outcome) = debouncer.submit(expression.clone(), sample).await
    {
        report(&expression, &outcome);
    }

    Ok(())
}

fn report(expression: &str, outcome: &ValidationOutcome) {
    let mark = if outcome.ok { "✓" } else { "✗" };
    match &outcome.message {
        Some(message) => println!("{} {}: {}", mark, expression, message),
        None => println!("{} {}", mark, expression),
    }
}
