//! Repair-order domain for the workshop.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - CommandHandler, which serializes commands per aggregate
//! - The Vehicle aggregate with its repair lifecycle
//! - RepairOrderStore, the persistence-facing service for vehicles

pub mod aggregate;
pub mod command;
pub mod error;
pub mod locks;
pub mod vehicle;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use locks::{KeyedGuard, KeyedLocks};
pub use vehicle::{
    AvailableActions, ComponentChoice, Issue, IssueDraft, IssueId, Payment, PaymentId,
    RecordPayment, RegisterVehicle, RepairOrderStore, RepairStatus, RepairTransition, ReportIssue,
    VIN_CLAIM_SCOPE, Vehicle, VehicleError, VehicleEvent, Vin,
};
