//! Vehicle aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod state;
mod store;
mod value_objects;

pub use aggregate::Vehicle;
pub use commands::{RecordPayment, RegisterVehicle, ReportIssue};
pub use events::{IssueReportedData, PaymentConfirmedData, VehicleEvent, VehicleRegisteredData};
pub use state::{AvailableActions, RepairStatus, RepairTransition};
pub use store::{RepairOrderStore, VIN_CLAIM_SCOPE};
pub use value_objects::{
    ComponentChoice, EARLIEST_MODEL_YEAR, Issue, IssueDraft, IssueId, LATEST_MODEL_YEAR, Payment,
    PaymentId, Vin, parse_model_year,
};

use common::{ErrorKind, Money};
use thiserror::Error;

/// Rule violations raised by the vehicle aggregate.
#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("VIN is required")]
    EmptyVin,

    #[error("Model is required")]
    EmptyModel,

    #[error("Year is required")]
    EmptyYear,

    #[error("Invalid year: {0}")]
    InvalidYear(String),

    #[error("Issue description is required")]
    EmptyDescription,

    #[error("Invalid component choice {0:?}: expected \"repair\" or \"new\"")]
    InvalidComponentChoice(String),

    #[error("A component is required when a new one is fitted")]
    ComponentRequired,

    #[error("Payment amount cannot be negative: {0}")]
    NegativeAmount(Money),

    #[error("Issues cannot be reported on a paid vehicle")]
    IssuesLocked,

    #[error("No issues have been reported for this vehicle")]
    NoIssuesReported,

    #[error("Vehicle is already paid")]
    AlreadyPaid,

    #[error("Vehicle is not registered")]
    NotRegistered,

    #[error("Vehicle already registered")]
    AlreadyRegistered,
}

impl VehicleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VehicleError::EmptyVin
            | VehicleError::EmptyModel
            | VehicleError::EmptyYear
            | VehicleError::InvalidYear(_)
            | VehicleError::EmptyDescription
            | VehicleError::InvalidComponentChoice(_)
            | VehicleError::ComponentRequired
            | VehicleError::NegativeAmount(_) => ErrorKind::Validation,
            VehicleError::IssuesLocked
            | VehicleError::NoIssuesReported
            | VehicleError::AlreadyPaid => ErrorKind::State,
            VehicleError::NotRegistered => ErrorKind::NotFound,
            VehicleError::AlreadyRegistered => ErrorKind::Conflict,
        }
    }
}
