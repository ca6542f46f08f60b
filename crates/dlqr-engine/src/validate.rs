//! Optional path validation
//!
//! Validation is advisory and runs apart from previews. Requests are
//! debounced, and a result is dropped if a newer request was issued while
//! it was waiting or in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dlqr_security::PathExpr;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: Some(message.into()),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }
}

/// Checks a path expression, possibly against a remote service
#[async_trait]
pub trait PathValidator: Send + Sync {
    async fn validate(&self, expression: &str, sample: &Value) -> anyhow::Result<ValidationOutcome>;
}

/// Validates with the engine's own parser and reports the match count
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPathValidator;

#[async_trait]
impl PathValidator for LocalPathValidator {
    async fn validate(&self, expression: &str, sample: &Value) -> anyhow::Result<ValidationOutcome> {
        Ok(match PathExpr::parse(expression) {
            Ok(expr) => {
                let matches = expr.resolve(sample).len();
                ValidationOutcome::ok(format!("matches {} location(s) in the sample", matches))
            }
            Err(e) => ValidationOutcome::invalid(e.to_string()),
        })
    }
}

/// Debounces validation requests. Clones share the request counter.
#[derive(Clone)]
pub struct ValidationDebouncer {
    validator: Option<Arc<dyn PathValidator>>,
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl ValidationDebouncer {
    pub fn new(validator: Option<Arc<dyn PathValidator>>, delay: Duration) -> Self {
        Self {
            validator,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Without a validator every request resolves to `None`
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn is_available(&self) -> bool {
        self.validator.is_some()
    }

    /// Supersede any pending or in-flight request
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Wait out the quiet period, then validate.
    ///
    /// `None` when validation is unavailable, the request was superseded,
    /// or the validator itself failed.
    pub async fn submit(&self, expression: String, sample: Value) -> Option<ValidationOutcome> {
        let validator = self.validator.as_ref()?;
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.delay).await;
        if !self.is_current(ticket) {
            debug!(ticket, "Validation superseded before dispatch");
            return None;
        }

        let outcome = match validator.validate(&expression, &sample).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(ticket, error = %e, "Validator failed");
                return None;
            }
        };

        if !self.is_current(ticket) {
            debug!(ticket, "Discarding stale validation result");
            return None;
        }
        Some(outcome)
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}
