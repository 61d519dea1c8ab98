//! Repair order store: the authoritative record of vehicles, issues and payments.

use catalog::CatalogClient;
use common::AggregateId;
use event_store::{EventEnvelope, EventStore, EventStoreError, UniqueClaim};

use crate::command::{Command, CommandHandler};
use crate::error::DomainError;

use super::{
    Issue, IssueDraft, IssueId, PaymentId, RecordPayment, RegisterVehicle, ReportIssue,
    RepairTransition, Vehicle, Vin,
};

/// Claim scope that keeps VINs unique across vehicles.
pub const VIN_CLAIM_SCOPE: &str = "vehicle_vin";

const REGISTERED_EVENT: &str = "VehicleRegistered";

/// Owns vehicle persistence and the rules checked at write time.
///
/// Cloning is cheap and clones share the per-vehicle locks.
#[derive(Clone)]
pub struct RepairOrderStore<S: EventStore, C: CatalogClient> {
    handler: CommandHandler<S, Vehicle>,
    catalog: C,
}

impl<S: EventStore, C: CatalogClient> RepairOrderStore<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            handler: CommandHandler::new(store),
            catalog,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn event_store(&self) -> &S {
        self.handler.store()
    }

    /// Checks a vehicle in.
    ///
    /// The VIN claim is written in the same append as the registration, so
    /// two concurrent registrations of one VIN cannot both succeed.
    #[tracing::instrument(skip(self), fields(vin = %cmd.vin))]
    pub async fn register_vehicle(&self, cmd: RegisterVehicle) -> Result<Vehicle, DomainError> {
        let vehicle_id = cmd.aggregate_id();
        let vin = Vin::parse(&cmd.vin)?;
        let claim = UniqueClaim::new(VIN_CLAIM_SCOPE, vin.claim_key());

        let result = self
            .handler
            .execute_claiming(vehicle_id, vec![claim], |vehicle| {
                vehicle.register(vehicle_id, &cmd.vin, &cmd.model, &cmd.year)
            })
            .await
            .map_err(|e| match e {
                DomainError::EventStore(EventStoreError::UniqueClaimTaken { .. }) => {
                    DomainError::DuplicateVin(vin.to_string())
                }
                other => other,
            })
            .inspect_err(|e| tracing::warn!(error = %e, "vehicle registration rejected"))?;

        metrics::counter!("vehicles_registered_total").increment(1);
        tracing::info!(%vehicle_id, "vehicle registered");
        Ok(result.aggregate)
    }

    /// All vehicles in registration order, with their issues.
    #[tracing::instrument(skip(self))]
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, DomainError> {
        let registrations = self
            .handler
            .store()
            .get_events_by_type(REGISTERED_EVENT)
            .await?;

        let mut vehicles = Vec::with_capacity(registrations.len());
        for envelope in registrations {
            if let Some(vehicle) = self.handler.load_existing(envelope.aggregate_id).await? {
                vehicles.push(vehicle);
            }
        }
        Ok(vehicles)
    }

    pub async fn get_vehicle(&self, vehicle_id: AggregateId) -> Result<Option<Vehicle>, DomainError> {
        self.handler.load_existing(vehicle_id).await
    }

    pub async fn require_vehicle(&self, vehicle_id: AggregateId) -> Result<Vehicle, DomainError> {
        self.get_vehicle(vehicle_id)
            .await?
            .ok_or(DomainError::VehicleNotFound(vehicle_id))
    }

    /// The vehicle's journal, oldest first.
    pub async fn history(&self, vehicle_id: AggregateId) -> Result<Vec<EventEnvelope>, DomainError> {
        let events = self
            .handler
            .store()
            .get_events_for_aggregate(vehicle_id)
            .await?;
        if events.is_empty() {
            return Err(DomainError::VehicleNotFound(vehicle_id));
        }
        Ok(events)
    }

    /// Records an issue against a vehicle.
    ///
    /// Rejections come in a fixed order: unknown vehicle, paid vehicle,
    /// malformed report, unresolvable component, catalog failure.
    #[tracing::instrument(skip(self), fields(vehicle_id = %cmd.vehicle_id))]
    pub async fn report_issue(&self, cmd: ReportIssue) -> Result<Issue, DomainError> {
        let vehicle_id = cmd.aggregate_id();
        let outcome = self.try_report_issue(vehicle_id, &cmd).await;

        match &outcome {
            Ok(issue) => {
                metrics::counter!(
                    "issues_reported_total",
                    "component_choice" => issue.component_choice.as_str()
                )
                .increment(1);
                tracing::info!(issue_id = %issue.id, "issue reported");
            }
            Err(e) => tracing::warn!(error = %e, kind = %e.kind(), "issue report rejected"),
        }
        outcome
    }

    async fn try_report_issue(
        &self,
        vehicle_id: AggregateId,
        cmd: &ReportIssue,
    ) -> Result<Issue, DomainError> {
        let vehicle = self.require_vehicle(vehicle_id).await?;
        vehicle
            .status()
            .transition(RepairTransition::IssueReported)?;

        let draft = IssueDraft::parse(
            &cmd.description,
            &cmd.component_choice,
            cmd.component.as_deref(),
        )?;

        if let Some(component_id) = &draft.component
            && self.catalog.get_component(component_id).await?.is_none()
        {
            return Err(DomainError::UnknownComponent(component_id.clone()));
        }

        let issue_id = IssueId::new();
        let result = self
            .handler
            .execute(vehicle_id, |vehicle| vehicle.report_issue(issue_id, draft))
            .await?;

        result
            .aggregate
            .issue(issue_id)
            .cloned()
            .ok_or(DomainError::VehicleNotFound(vehicle_id))
    }

    /// Persists a payment and moves the vehicle to paid.
    ///
    /// The lifecycle is rechecked under the vehicle's lock, so of two
    /// concurrent confirmations exactly one is recorded.
    #[tracing::instrument(skip(self), fields(vehicle_id = %cmd.vehicle_id, amount = %cmd.amount))]
    pub async fn record_payment(&self, cmd: RecordPayment) -> Result<Vehicle, DomainError> {
        let vehicle_id = cmd.aggregate_id();
        self.require_vehicle(vehicle_id).await?;

        let payment_id = PaymentId::new();
        let RecordPayment {
            amount,
            service_ids,
            ..
        } = cmd;

        let result = self
            .handler
            .execute(vehicle_id, |vehicle| {
                vehicle.confirm_payment(payment_id, amount, service_ids)
            })
            .await?;

        tracing::info!(%payment_id, "payment recorded");
        Ok(result.aggregate)
    }
}
