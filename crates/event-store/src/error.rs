use common::ErrorKind;
use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the journal.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// A unique key is already held by another stream.
    #[error("Unique key {key:?} in scope {scope} is already claimed")]
    UniqueClaimTaken { scope: String, key: String },

    /// The batch handed to `append` is malformed.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventStoreError::ConcurrencyConflict { .. }
            | EventStoreError::UniqueClaimTaken { .. } => ErrorKind::Conflict,
            EventStoreError::InvalidAppend(_)
            | EventStoreError::Database(_)
            | EventStoreError::Migration(_)
            | EventStoreError::Serialization(_) => ErrorKind::Dependency,
        }
    }
}

/// Result type for journal operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
