//! Vehicle domain events.

use catalog::{ComponentId, ServiceId};
use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{ComponentChoice, IssueDraft, IssueId, PaymentId, Vin};

/// Everything that can happen to a vehicle's repair order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum VehicleEvent {
    /// The vehicle was checked in.
    VehicleRegistered(VehicleRegisteredData),

    /// A problem was reported against the vehicle.
    IssueReported(IssueReportedData),

    /// The quoted services were paid for.
    PaymentConfirmed(PaymentConfirmedData),
}

impl DomainEvent for VehicleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VehicleEvent::VehicleRegistered(_) => "VehicleRegistered",
            VehicleEvent::IssueReported(_) => "IssueReported",
            VehicleEvent::PaymentConfirmed(_) => "PaymentConfirmed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRegisteredData {
    pub vehicle_id: AggregateId,
    pub vin: Vin,
    pub model: String,
    pub year: u16,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueReportedData {
    pub issue_id: IssueId,
    pub description: String,
    pub component_choice: ComponentChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedData {
    pub payment_id: PaymentId,
    /// Total of the quote the customer accepted.
    pub amount: Money,
    pub service_ids: Vec<ServiceId>,
    pub paid_at: DateTime<Utc>,
}

impl VehicleEvent {
    pub fn vehicle_registered(vehicle_id: AggregateId, vin: Vin, model: String, year: u16) -> Self {
        VehicleEvent::VehicleRegistered(VehicleRegisteredData {
            vehicle_id,
            vin,
            model,
            year,
            registered_at: Utc::now(),
        })
    }

    pub fn issue_reported(issue_id: IssueId, draft: IssueDraft) -> Self {
        VehicleEvent::IssueReported(IssueReportedData {
            issue_id,
            description: draft.description,
            component_choice: draft.component_choice,
            component: draft.component,
            reported_at: Utc::now(),
        })
    }

    pub fn payment_confirmed(payment_id: PaymentId, amount: Money, service_ids: Vec<ServiceId>) -> Self {
        VehicleEvent::PaymentConfirmed(PaymentConfirmedData {
            payment_id,
            amount,
            service_ids,
            paid_at: Utc::now(),
        })
    }
}
