//! Vehicle aggregate implementation.

use catalog::ServiceId;
use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    AvailableActions, Issue, IssueDraft, IssueId, Payment, PaymentId, RepairStatus,
    RepairTransition, VehicleError, VehicleEvent, Vin,
    events::{IssueReportedData, PaymentConfirmedData, VehicleRegisteredData},
    parse_model_year,
};

/// A vehicle checked in to the workshop together with its repair order.
///
/// Issues keep the order in which they were reported. The payment, once
/// present, covers every issue recorded before it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vehicle {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    vin: Vin,
    model: String,
    year: u16,
    issues: Vec<Issue>,
    status: RepairStatus,
    payment: Option<Payment>,
    registered_at: Option<DateTime<Utc>>,
}

impl Aggregate for Vehicle {
    type Event = VehicleEvent;
    type Error = VehicleError;

    fn aggregate_type() -> &'static str {
        "Vehicle"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            VehicleEvent::VehicleRegistered(data) => self.apply_registered(data),
            VehicleEvent::IssueReported(data) => self.apply_issue_reported(data),
            VehicleEvent::PaymentConfirmed(data) => self.apply_payment_confirmed(data),
        }
    }
}

// Query methods
impl Vehicle {
    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    /// Issues in report order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue(&self, id: IssueId) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub fn status(&self) -> RepairStatus {
        self.status
    }

    pub fn payment_status(&self) -> bool {
        self.status.is_paid()
    }

    pub fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    pub fn available_actions(&self) -> AvailableActions {
        self.status.available_actions()
    }

    fn require_registered(&self) -> Result<AggregateId, VehicleError> {
        self.id.ok_or(VehicleError::NotRegistered)
    }
}

// Command methods (return events)
impl Vehicle {
    /// Registers a new vehicle from raw form input.
    pub fn register(
        &self,
        vehicle_id: AggregateId,
        vin: &str,
        model: &str,
        year: &str,
    ) -> Result<Vec<VehicleEvent>, VehicleError> {
        if self.id.is_some() {
            return Err(VehicleError::AlreadyRegistered);
        }

        let vin = Vin::parse(vin)?;
        let model = model.trim();
        if model.is_empty() {
            return Err(VehicleError::EmptyModel);
        }
        let year = parse_model_year(year)?;

        Ok(vec![VehicleEvent::vehicle_registered(
            vehicle_id,
            vin,
            model.to_string(),
            year,
        )])
    }

    /// Records an already validated issue.
    ///
    /// The lifecycle is checked first so a paid vehicle rejects every report
    /// the same way whatever its content.
    pub fn report_issue(
        &self,
        issue_id: IssueId,
        draft: IssueDraft,
    ) -> Result<Vec<VehicleEvent>, VehicleError> {
        self.require_registered()?;
        self.status.transition(RepairTransition::IssueReported)?;

        Ok(vec![VehicleEvent::issue_reported(issue_id, draft)])
    }

    /// Records the payment of a quote.
    pub fn confirm_payment(
        &self,
        payment_id: PaymentId,
        amount: Money,
        service_ids: Vec<ServiceId>,
    ) -> Result<Vec<VehicleEvent>, VehicleError> {
        self.require_registered()?;
        self.status.transition(RepairTransition::PaymentConfirmed)?;

        if amount.is_negative() {
            return Err(VehicleError::NegativeAmount(amount));
        }

        Ok(vec![VehicleEvent::payment_confirmed(
            payment_id,
            amount,
            service_ids,
        )])
    }
}

// Event application
impl Vehicle {
    fn apply_registered(&mut self, data: VehicleRegisteredData) {
        self.id = Some(data.vehicle_id);
        self.vin = data.vin;
        self.model = data.model;
        self.year = data.year;
        self.registered_at = Some(data.registered_at);
        self.status = RepairStatus::NoIssues;
    }

    fn apply_issue_reported(&mut self, data: IssueReportedData) {
        if let Ok(next) = self.status.transition(RepairTransition::IssueReported) {
            self.status = next;
        }
        self.issues.push(Issue {
            id: data.issue_id,
            vehicle_id: self.id.unwrap_or_default(),
            description: data.description,
            component_choice: data.component_choice,
            component: data.component,
            reported_at: data.reported_at,
        });
    }

    fn apply_payment_confirmed(&mut self, data: PaymentConfirmedData) {
        if let Ok(next) = self.status.transition(RepairTransition::PaymentConfirmed) {
            self.status = next;
        }
        self.payment = Some(Payment {
            payment_id: data.payment_id,
            vehicle_id: self.id.unwrap_or_default(),
            amount: data.amount,
            service_ids: data.service_ids,
            paid_at: data.paid_at,
        });
    }
}
