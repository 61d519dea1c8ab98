use std::time::Duration;

use common::ErrorKind;
use thiserror::Error;

/// Errors raised by catalog clients.
///
/// Every variant is a dependency failure from the core's point of view.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Catalog transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog {operation} returned HTTP {status}")]
    Status { operation: &'static str, status: u16 },

    #[error("Catalog base URL is not usable: {0}")]
    InvalidBaseUrl(String),

    #[error("Catalog returned an invalid record: {0}")]
    InvalidRecord(String),

    #[error("Catalog seed could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog seed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Dependency
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
