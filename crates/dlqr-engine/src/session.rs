//! Rule set editing session
//!
//! Holds the working rules and sample, runs previews on demand and gates
//! saving on a successful preview.

use anyhow::Result;
use dlqr_core::{ApplyResult, MaskOptions, Rule, RuleSetKey, TopicKey, parse_document};
use dlqr_sources::MessageSource;
use dlqr_storage::RuleStore;
use serde_json::{Value, json};
use tracing::info;

use crate::RuleEngine;
use crate::diff::{Delta, diff};

#[derive(Debug, Clone, PartialEq)]
pub enum SampleState {
    Valid(Value),
    /// The sample text is not JSON; previews are refused until it is fixed
    Invalid(String),
}

pub struct RuleSetEditor {
    engine: RuleEngine,
    rules: Vec<Rule>,
    sample_text: String,
    sample: SampleState,
    preview: Option<ApplyResult>,
    error: Option<String>,
}

impl RuleSetEditor {
    pub fn new(rules: Vec<Rule>, sample_text: impl Into<String>) -> Self {
        let sample_text = sample_text.into();
        Self {
            engine: RuleEngine::new(),
            sample: parse_sample(&sample_text),
            sample_text,
            rules,
            preview: None,
            error: None,
        }
    }

    /// Starter rules and an order payload to experiment with
    pub fn with_defaults() -> Self {
        let rules = vec![
            Rule::mask("$.customer.email", MaskOptions::keep_last(3)).with_note("mask email"),
            Rule::hash(
                "$.payment.card.number",
                dlqr_core::HashOptions {
                    secret_label: Some("REDACTION_KEY".to_string()),
                    short_form: true,
                },
            ),
            Rule::mask("$.payment.card.cvv", MaskOptions::fixed("[REDACTED]")),
        ];

        let sample = json!({
            "customer": {
                "name": "Alice Martin",
                "email": "alice.martin@example.com",
                "phone": "+33612345678"
            },
            "payment": { "card": { "number": "4111111111111111", "cvv": "123" }, "amount": 129.9 },
            "meta": { "ts": 1724693034000u64, "source": "dlq/orders-DLQ" }
        });
        let sample_text = serde_json::to_string_pretty(&sample).unwrap_or_default();

        Self::new(rules, sample_text)
    }

    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn sample_text(&self) -> &str {
        &self.sample_text
    }

    pub fn sample_state(&self) -> &SampleState {
        &self.sample
    }

    pub fn sample(&self) -> Option<&Value> {
        match &self.sample {
            SampleState::Valid(value) => Some(value),
            SampleState::Invalid(_) => None,
        }
    }

    pub fn last_preview(&self) -> Option<&ApplyResult> {
        self.preview.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_previewed(&self) -> bool {
        self.preview.is_some()
    }

    /// Append a placeholder rule and return its id
    pub fn add_rule(&mut self) -> String {
        let rule = Rule::mask("$.path.to.field", MaskOptions::keep_last(4));
        let id = rule.id.clone();
        self.rules.push(rule);
        id
    }

    pub fn remove_rule(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.id != id);
        self.rules.len() != before
    }

    pub fn update_rule(&mut self, id: &str, edit: impl FnOnce(&mut Rule)) -> bool {
        match self.rules.iter_mut().find(|rule| rule.id == id) {
            Some(rule) => {
                edit(rule);
                true
            }
            None => false,
        }
    }

    pub fn set_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    pub fn set_sample_text(&mut self, text: impl Into<String>) {
        self.sample_text = text.into();
        self.sample = parse_sample(&self.sample_text);
    }

    /// Seed the sample from a DLQ. Returns whether a sample was available.
    pub async fn pick_sample(&mut self, source: &dyn MessageSource, key: &TopicKey) -> Result<bool> {
        match source.fetch_sample(key).await? {
            Some(document) => {
                self.set_sample_text(serde_json::to_string_pretty(&document)?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the engine over the current sample.
    ///
    /// With an invalid sample the engine is not called and the error slot
    /// is set instead.
    pub fn preview(&mut self) -> Option<&ApplyResult> {
        self.error = None;

        let SampleState::Valid(sample) = &self.sample else {
            self.error = Some("Invalid sample JSON.".to_string());
            return None;
        };

        match self.engine.apply(sample, &self.rules) {
            Ok(result) => {
                self.preview = Some(result);
                self.preview.as_ref()
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    pub fn reset_preview(&mut self) {
        self.preview = None;
    }

    /// Delta between the sample and the last preview
    pub fn diff(&self) -> Option<Delta> {
        let sample = self.sample()?;
        let preview = self.preview.as_ref()?;
        diff(sample, &preview.redacted_document)
    }

    pub fn rules_invalid(&self) -> bool {
        self.rules.iter().any(|rule| !rule.is_valid())
    }

    pub fn can_save(&self) -> bool {
        self.has_previewed() && !self.rules_invalid()
    }

    /// Replace the stored rule set with the working rules
    pub async fn save(&mut self, store: &dyn RuleStore, key: &RuleSetKey) -> Result<()> {
        if !self.can_save() {
            anyhow::bail!("Preview the rules and fix any empty paths before saving");
        }

        self.error = None;
        if let Err(e) = store.save(key, &self.rules).await {
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        info!(key = %key, rules = self.rules.len(), "Saved rule set");
        Ok(())
    }

    pub async fn load(&mut self, store: &dyn RuleStore, key: &RuleSetKey) -> Result<()> {
        self.rules = store.load(key).await?;
        self.preview = None;
        Ok(())
    }

    /// Expression and sample for validating the most recently added rule
    pub fn validation_request(&self) -> Option<(String, Value)> {
        let rule = self.rules.last()?;
        let sample = self.sample().cloned().unwrap_or_else(|| json!({}));
        Some((rule.path.clone(), sample))
    }
}

impl Default for RuleSetEditor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn parse_sample(text: &str) -> SampleState {
    match parse_document(text) {
        Ok(value) => SampleState::Valid(value),
        Err(e) => SampleState::Invalid(e.to_string()),
    }
}
