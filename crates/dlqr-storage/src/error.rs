//! Error types for dlqr-storage

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rejected rule set: {0}")]
    InvalidRules(#[from] dlqr_core::CoreError),

    #[error("Corrupt rule set record for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
