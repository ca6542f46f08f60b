//! Field hashing
//!
//! The engine only ships [`PreviewHasher`]: a fast, unkeyed FNV-1a
//! fingerprint that gives operators a deterministic stand-in while they
//! author rules. It has no access to secrets. Writers and replayers must
//! inject a keyed implementation and check
//! [`ApplyResult::ensure_durable`](dlqr_core::ApplyResult::ensure_durable).

use std::hash::Hasher;

use dlqr_core::HashOptions;
use fnv::FnvHasher;

/// Label mixed into preview hashes when a rule names no secret
pub const PREVIEW_MARKER: &str = "preview";

/// Tag that makes hashed values stand out from real data
pub const HASH_TAG: &str = "h:";

pub trait FieldHasher: Send + Sync {
    /// Hash the string form of a matched value
    fn hash(&self, input: &str, options: &HashOptions) -> String;

    /// Whether values from this hasher may only ever be shown, never stored
    fn is_preview(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewHasher;

impl FieldHasher for PreviewHasher {
    fn hash(&self, input: &str, options: &HashOptions) -> String {
        let label = options.secret_label.as_deref().unwrap_or(PREVIEW_MARKER);

        let mut hasher = FnvHasher::default();
        hasher.write(input.as_bytes());
        hasher.write(b"|");
        hasher.write(label.as_bytes());

        let digest = format!("{:016x}", hasher.finish());
        if options.short_form {
            format!("{}{}", HASH_TAG, &digest[..8])
        } else {
            format!("{}{}", HASH_TAG, digest)
        }
    }

    fn is_preview(&self) -> bool {
        true
    }
}
