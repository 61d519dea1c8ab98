//! The entry point used by the presentation layer.

use catalog::{CatalogClient, Component, Service, ServiceId};
use common::AggregateId;
use domain::{
    AvailableActions, Issue, Payment, RegisterVehicle, RepairOrderStore, RepairStatus,
    ReportIssue, Vehicle,
};
use event_store::{EventEnvelope, EventStore};
use serde::Serialize;

use crate::error::Result;
use crate::payment::PaymentProcessor;
use crate::pricing::{PricingEngine, Quote};
use crate::selection::ServiceSelection;

/// A vehicle together with what can be done with it next.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleOverview {
    pub vehicle: Vehicle,
    pub status: RepairStatus,
    pub payment_status: bool,
    pub actions: AvailableActions,
    pub prompt: &'static str,
}

impl From<Vehicle> for VehicleOverview {
    fn from(vehicle: Vehicle) -> Self {
        let status = vehicle.status();
        Self {
            status,
            payment_status: status.is_paid(),
            actions: status.available_actions(),
            prompt: status.prompt(),
            vehicle,
        }
    }
}

/// Routes workshop requests to the store, pricing and payment components.
///
/// Holds no per-user state: selections and quotes live with the caller.
#[derive(Clone)]
pub struct WorkflowController<S: EventStore, C: CatalogClient> {
    store: RepairOrderStore<S, C>,
    pricing: PricingEngine<S, C>,
    payments: PaymentProcessor<S, C>,
}

impl<S, C> WorkflowController<S, C>
where
    S: EventStore + Clone,
    C: CatalogClient + Clone,
{
    pub fn new(store: RepairOrderStore<S, C>) -> Self {
        Self {
            pricing: PricingEngine::new(store.clone()),
            payments: PaymentProcessor::new(store.clone()),
            store,
        }
    }

    /// Convenience constructor over a journal and a catalog.
    pub fn from_parts(event_store: S, catalog: C) -> Self {
        Self::new(RepairOrderStore::new(event_store, catalog))
    }

    pub fn store(&self) -> &RepairOrderStore<S, C> {
        &self.store
    }

    pub async fn register_vehicle(
        &self,
        vin: &str,
        model: &str,
        year: &str,
    ) -> Result<VehicleOverview> {
        let vehicle = self
            .store
            .register_vehicle(RegisterVehicle::new(vin, model, year))
            .await?;
        Ok(vehicle.into())
    }

    pub async fn list_vehicles(&self) -> Result<Vec<VehicleOverview>> {
        let vehicles = self.store.list_vehicles().await?;
        Ok(vehicles.into_iter().map(VehicleOverview::from).collect())
    }

    pub async fn vehicle(&self, vehicle_id: AggregateId) -> Result<VehicleOverview> {
        Ok(self.store.require_vehicle(vehicle_id).await?.into())
    }

    /// The vehicle's recorded events, oldest first.
    pub async fn history(&self, vehicle_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        Ok(self.store.history(vehicle_id).await?)
    }

    pub async fn report_issue(
        &self,
        vehicle_id: AggregateId,
        description: &str,
        component_choice: &str,
        component: Option<&str>,
    ) -> Result<Issue> {
        let cmd = ReportIssue::new(
            vehicle_id,
            description,
            component_choice,
            component.map(str::to_string),
        );
        Ok(self.store.report_issue(cmd).await?)
    }

    pub async fn request_quote(
        &self,
        vehicle_id: AggregateId,
        service_ids: &[ServiceId],
    ) -> Result<Quote> {
        self.pricing.quote(vehicle_id, service_ids).await
    }

    /// Starts an empty selection for a vehicle.
    pub fn select_services(&self, vehicle_id: AggregateId) -> ServiceSelection {
        ServiceSelection::new(vehicle_id)
    }

    pub async fn quote_selection(&self, selection: &ServiceSelection) -> Result<Quote> {
        self.pricing
            .quote(selection.vehicle_id(), selection.services())
            .await
    }

    pub async fn confirm_payment(&self, vehicle_id: AggregateId, quote: &Quote) -> Result<Payment> {
        self.payments.confirm_payment(vehicle_id, quote).await
    }

    /// Services offered in the payment dialog.
    pub async fn available_services(&self) -> Result<Vec<Service>> {
        Ok(self.store.catalog().list_services().await?)
    }

    /// Components offered in the issue dialog.
    pub async fn available_components(&self) -> Result<Vec<Component>> {
        Ok(self.store.catalog().list_components().await?)
    }
}
