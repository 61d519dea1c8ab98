//! Quote computation from the service catalog.

use std::collections::HashSet;

use catalog::{CatalogClient, Service, ServiceId};
use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use domain::RepairOrderStore;
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// One priced service on a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub service_id: ServiceId,
    pub name: String,
    pub charge: Money,
}

/// Price offered for a set of services on one vehicle.
///
/// A quote is not persisted. The caller keeps it and hands it back to
/// confirm payment; it is re-priced then, so an edited total is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub vehicle_id: AggregateId,
    /// Selected services in selection order.
    pub service_ids: Vec<ServiceId>,
    pub lines: Vec<QuoteLine>,
    pub total: Money,
    pub quoted_at: DateTime<Utc>,
}

/// Catalog lines and their exact sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedServices {
    pub lines: Vec<QuoteLine>,
    pub total: Money,
}

/// Computes quotes. Never writes to the store.
#[derive(Clone)]
pub struct PricingEngine<S: EventStore, C: CatalogClient> {
    store: RepairOrderStore<S, C>,
}

impl<S: EventStore, C: CatalogClient> PricingEngine<S, C> {
    pub fn new(store: RepairOrderStore<S, C>) -> Self {
        Self { store }
    }

    /// Quotes the selected services for a vehicle.
    #[tracing::instrument(skip(self))]
    pub async fn quote(&self, vehicle_id: AggregateId, service_ids: &[ServiceId]) -> Result<Quote> {
        self.store.require_vehicle(vehicle_id).await?;

        let priced = self
            .price(service_ids)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "quote rejected"))?;

        metrics::counter!("quotes_computed_total").increment(1);
        metrics::histogram!("quote_total_cents").record(priced.total.cents() as f64);
        tracing::info!(total = %priced.total, lines = priced.lines.len(), "quote computed");

        Ok(Quote {
            vehicle_id,
            service_ids: service_ids.to_vec(),
            lines: priced.lines,
            total: priced.total,
            quoted_at: Utc::now(),
        })
    }

    /// Resolves services against the current catalog and sums their charges.
    ///
    /// Rejections come in a fixed order across the whole selection: empty or
    /// repeated ids, ids the catalog lacks, ids it lists twice, negative
    /// charges, then an overflowing total.
    pub async fn price(&self, service_ids: &[ServiceId]) -> Result<PricedServices> {
        if service_ids.is_empty() {
            return Err(WorkflowError::EmptyServiceSelection);
        }
        let mut seen = HashSet::with_capacity(service_ids.len());
        for id in service_ids {
            if !seen.insert(id) {
                return Err(WorkflowError::DuplicateService(id.clone()));
            }
        }

        let catalog = self.store.catalog().list_services().await?;
        let matches: Vec<Vec<&Service>> = service_ids
            .iter()
            .map(|id| catalog.iter().filter(|s| &s.id == id).collect())
            .collect();

        if let Some((id, _)) = service_ids.iter().zip(&matches).find(|(_, m)| m.is_empty()) {
            return Err(WorkflowError::UnknownService(id.clone()));
        }
        if let Some((id, _)) = service_ids.iter().zip(&matches).find(|(_, m)| m.len() > 1) {
            return Err(WorkflowError::AmbiguousService(id.clone()));
        }

        let lines: Vec<QuoteLine> = matches
            .iter()
            .map(|m| QuoteLine {
                service_id: m[0].id.clone(),
                name: m[0].name.clone(),
                charge: m[0].approx_charge,
            })
            .collect();

        if let Some(line) = lines.iter().find(|l| l.charge.is_negative()) {
            return Err(WorkflowError::NegativeCharge {
                service_id: line.service_id.clone(),
                charge: line.charge,
            });
        }

        let total = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.charge))
            .ok_or(WorkflowError::TotalOverflow)?;

        Ok(PricedServices { lines, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{CatalogSeed, InMemoryCatalog};
    use common::ErrorKind;
    use domain::{Aggregate, RegisterVehicle};
    use event_store::InMemoryEventStore;

    fn ids(raw: &[&str]) -> Vec<ServiceId> {
        raw.iter().map(|s| ServiceId::from(*s)).collect()
    }

    async fn engine_with(
        services: Vec<Service>,
    ) -> (PricingEngine<InMemoryEventStore, InMemoryCatalog>, AggregateId) {
        let catalog = InMemoryCatalog::with_seed(CatalogSeed {
            components: vec![],
            services,
        });
        let store = RepairOrderStore::new(InMemoryEventStore::new(), catalog);
        let vehicle = store
            .register_vehicle(RegisterVehicle::new("PRICE1", "Sedan", "2020"))
            .await
            .unwrap();
        (PricingEngine::new(store), vehicle.id().unwrap())
    }

    #[tokio::test]
    async fn total_is_exact_sum_in_selection_order() {
        let (engine, vehicle_id) = engine_with(CatalogSeed::workshop().services).await;

        let quote = engine
            .quote(vehicle_id, &ids(&["s3", "s1", "s2"]))
            .await
            .unwrap();

        assert_eq!(quote.vehicle_id, vehicle_id);
        assert_eq!(quote.service_ids, ids(&["s3", "s1", "s2"]));
        let line_ids: Vec<_> = quote.lines.iter().map(|l| l.service_id.as_str()).collect();
        assert_eq!(line_ids, vec!["s3", "s1", "s2"]);
        assert_eq!(quote.total, Money::from_cents(59_950 + 80_000 + 45_000));
    }

    #[tokio::test]
    async fn selection_errors() {
        let (engine, vehicle_id) = engine_with(CatalogSeed::workshop().services).await;

        let err = engine.quote(vehicle_id, &[]).await.unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyServiceSelection));

        let err = engine.quote(vehicle_id, &ids(&["s1", "s1"])).await.unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateService(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = engine.quote(vehicle_id, &ids(&["s1", "s404"])).await.unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownService(ref id) if id.as_str() == "s404"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unknown_vehicle_is_checked_before_selection() {
        let (engine, _) = engine_with(CatalogSeed::workshop().services).await;
        let err = engine.quote(AggregateId::new(), &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn catalog_listing_a_service_twice_is_a_conflict() {
        let (engine, vehicle_id) = engine_with(vec![
            Service::new("s1", "Brake service", Money::from_units(800)),
            Service::new("s1", "Brake service (old)", Money::from_units(700)),
        ])
        .await;

        let err = engine.quote(vehicle_id, &ids(&["s1"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn negative_charge_is_a_dependency_error() {
        let (engine, vehicle_id) = engine_with(vec![Service::new(
            "s1",
            "Refund",
            Money::from_cents(-100),
        )])
        .await;

        let err = engine.quote(vehicle_id, &ids(&["s1"])).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NegativeCharge { .. }));
        assert_eq!(err.kind(), ErrorKind::Dependency);
    }

    #[tokio::test]
    async fn overflowing_total_is_rejected() {
        let (engine, vehicle_id) = engine_with(vec![
            Service::new("a", "A", Money::from_cents(i64::MAX)),
            Service::new("b", "B", Money::from_cents(1)),
        ])
        .await;

        let err = engine.quote(vehicle_id, &ids(&["a", "b"])).await.unwrap_err();
        assert!(matches!(err, WorkflowError::TotalOverflow));
    }

    #[tokio::test]
    async fn zero_charge_services_are_allowed() {
        let (engine, vehicle_id) =
            engine_with(vec![Service::new("free", "Inspection", Money::zero())]).await;

        let quote = engine.quote(vehicle_id, &ids(&["free"])).await.unwrap();
        assert!(quote.total.is_zero());
    }
}
