//! Domain error types.

use catalog::{CatalogError, ComponentId};
use common::{AggregateId, ErrorKind};
use event_store::EventStoreError;
use thiserror::Error;

use crate::vehicle::VehicleError;

/// Errors that can occur during repair-order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the journal.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// The vehicle aggregate rejected the command.
    #[error("{0}")]
    Vehicle(#[from] VehicleError),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(AggregateId),

    #[error("A vehicle with VIN {0} is already registered")]
    DuplicateVin(String),

    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EventStore(e) => e.kind(),
            DomainError::Vehicle(e) => e.kind(),
            DomainError::VehicleNotFound(_) => ErrorKind::NotFound,
            DomainError::DuplicateVin(_) => ErrorKind::Conflict,
            DomainError::UnknownComponent(_) => ErrorKind::Validation,
            DomainError::Catalog(e) => e.kind(),
            DomainError::Serialization(_) => ErrorKind::Dependency,
        }
    }
}
