//! Payment confirmation.

use catalog::CatalogClient;
use common::AggregateId;
use domain::{DomainError, Payment, RecordPayment, RepairOrderStore, RepairTransition};
use event_store::EventStore;

use crate::error::{Result, WorkflowError};
use crate::pricing::{PricingEngine, Quote};

/// Turns an accepted quote into a recorded payment.
#[derive(Clone)]
pub struct PaymentProcessor<S: EventStore, C: CatalogClient> {
    store: RepairOrderStore<S, C>,
    pricing: PricingEngine<S, C>,
}

impl<S, C> PaymentProcessor<S, C>
where
    S: EventStore + Clone,
    C: CatalogClient + Clone,
{
    pub fn new(store: RepairOrderStore<S, C>) -> Self {
        let pricing = PricingEngine::new(store.clone());
        Self { store, pricing }
    }

    /// Confirms payment of `quote` for a vehicle.
    ///
    /// Checks run in order: the vehicle exists, it has open issues and is
    /// unpaid, the quote is for this vehicle, and the quote still matches the
    /// catalog. The lifecycle is checked again when the payment is written.
    #[tracing::instrument(skip(self, quote), fields(total = %quote.total))]
    pub async fn confirm_payment(&self, vehicle_id: AggregateId, quote: &Quote) -> Result<Payment> {
        match self.try_confirm(vehicle_id, quote).await {
            Ok(payment) => {
                metrics::counter!("payments_confirmed_total").increment(1);
                tracing::info!(payment_id = %payment.payment_id, amount = %payment.amount, "payment confirmed");
                Ok(payment)
            }
            Err(e) => {
                metrics::counter!("payments_rejected_total", "reason" => e.kind().as_str())
                    .increment(1);
                tracing::warn!(error = %e, kind = %e.kind(), "payment rejected");
                Err(e)
            }
        }
    }

    async fn try_confirm(&self, vehicle_id: AggregateId, quote: &Quote) -> Result<Payment> {
        let vehicle = self.store.require_vehicle(vehicle_id).await?;
        vehicle
            .status()
            .transition(RepairTransition::PaymentConfirmed)
            .map_err(DomainError::from)?;

        if quote.vehicle_id != vehicle_id {
            return Err(WorkflowError::QuoteVehicleMismatch {
                quoted: quote.vehicle_id,
                requested: vehicle_id,
            });
        }

        let current = match self.pricing.price(&quote.service_ids).await {
            Ok(priced) => priced.total,
            Err(WorkflowError::UnknownService(id) | WorkflowError::AmbiguousService(id)) => {
                return Err(WorkflowError::ServiceWithdrawn(id));
            }
            Err(e) => return Err(e),
        };
        if current != quote.total {
            return Err(WorkflowError::StaleQuote {
                quoted: quote.total,
                current,
            });
        }

        let vehicle = self
            .store
            .record_payment(RecordPayment::new(
                vehicle_id,
                quote.total,
                quote.service_ids.clone(),
            ))
            .await?;

        vehicle
            .payment()
            .cloned()
            .ok_or(WorkflowError::Domain(DomainError::VehicleNotFound(vehicle_id)))
    }
}
