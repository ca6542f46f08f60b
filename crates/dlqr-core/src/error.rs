use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed path expression. Scoped to a single rule.
    #[error("Invalid path expression '{expression}': {reason}")]
    PathSyntax { expression: String, reason: String },

    /// A transformer could not process a matched value. Scoped to a single pointer.
    #[error("Transform failed: {0}")]
    Transformer(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid rule {id}: {reason}")]
    InvalidRule { id: String, reason: String },

    #[error(
        "Redacted document contains preview hashes; substitute a keyed hasher before persisting or replaying"
    )]
    PreviewHashNotDurable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn path_syntax(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathSyntax {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
