//! Workflow error types.

use catalog::{CatalogError, ServiceId};
use common::{AggregateId, ErrorKind, Money};
use domain::DomainError;
use thiserror::Error;

/// Errors raised while quoting or confirming payment.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The repair order store rejected the request.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("At least one service must be selected")]
    EmptyServiceSelection,

    #[error("Service {0} was selected more than once")]
    DuplicateService(ServiceId),

    #[error("Service not found: {0}")]
    UnknownService(ServiceId),

    #[error("Service {0} matches several catalog entries")]
    AmbiguousService(ServiceId),

    #[error("Catalog reports a negative charge of {charge} for service {service_id}")]
    NegativeCharge { service_id: ServiceId, charge: Money },

    #[error("Quote total is too large")]
    TotalOverflow,

    #[error("Quote was issued for vehicle {quoted}, not {requested}")]
    QuoteVehicleMismatch {
        quoted: AggregateId,
        requested: AggregateId,
    },

    #[error("Quote is out of date: quoted {quoted}, current price {current}")]
    StaleQuote { quoted: Money, current: Money },

    #[error("Quote is out of date: service {0} is no longer offered as quoted")]
    ServiceWithdrawn(ServiceId),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Domain(e) => e.kind(),
            WorkflowError::Catalog(e) => e.kind(),
            WorkflowError::EmptyServiceSelection
            | WorkflowError::DuplicateService(_)
            | WorkflowError::TotalOverflow
            | WorkflowError::QuoteVehicleMismatch { .. }
            | WorkflowError::StaleQuote { .. }
            | WorkflowError::ServiceWithdrawn(_) => ErrorKind::Validation,
            WorkflowError::UnknownService(_) => ErrorKind::NotFound,
            WorkflowError::AmbiguousService(_) => ErrorKind::Conflict,
            WorkflowError::NegativeCharge { .. } => ErrorKind::Dependency,
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
