//! Core domain models for dlqr
//!
//! This crate contains:
//! - Redaction rules and their options
//! - Apply results and the audit trail
//! - Rule set scopes and DLQ message addressing
//! - The shared error taxonomy

pub mod audit;
pub mod error;
pub mod message;
pub mod rule;
pub mod scope;

pub use audit::{ApplyResult, AuditEntry};
pub use error::{CoreError, Result};
pub use message::{DlqMessage, TopicKey, decode_utf8, parse_document};
pub use rule::{HashOptions, MaskOptions, RedactionAction, Rule};
pub use scope::{RuleSetKey, Scope};
