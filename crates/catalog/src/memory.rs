use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{CatalogClient, Component, ComponentId, Result, Service, ServiceId};

/// Contents of an in-memory catalog, loadable from JSON.
///
/// Money fields are integer minor units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl CatalogSeed {
    /// A small workshop price list used when no catalog is configured.
    pub fn workshop() -> Self {
        Self {
            components: vec![
                Component::new(
                    "brakes",
                    "Brake pads",
                    Money::from_units(2500),
                    Money::from_units(800),
                    12,
                ),
                Component::new(
                    "battery",
                    "Battery",
                    Money::from_units(6000),
                    Money::from_units(1200),
                    4,
                ),
                Component::new(
                    "clutch",
                    "Clutch plate",
                    Money::from_units(4500),
                    Money::from_units(1500),
                    3,
                ),
            ],
            services: vec![
                Service::new("s1", "Brake service", Money::from_units(800)),
                Service::new("s2", "Oil change", Money::from_units(450)),
                Service::new("s3", "Wheel alignment", Money::from_cents(59_950)),
            ],
        }
    }
}

/// Catalog held in process memory.
///
/// Cloning shares the same underlying data, so a test can keep a handle and
/// change prices while the system under test reads them.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<CatalogSeed>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: CatalogSeed) -> Self {
        Self {
            inner: Arc::new(RwLock::new(seed)),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::with_seed(serde_json::from_str(json)?))
    }

    /// Loads a seed file in the [`CatalogSeed`] format.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    pub async fn add_component(&self, component: Component) {
        self.inner.write().await.components.push(component);
    }

    pub async fn add_service(&self, service: Service) {
        self.inner.write().await.services.push(service);
    }

    /// Changes the charge of every entry with `id`. Returns false if none matched.
    pub async fn set_service_charge(&self, id: &ServiceId, charge: Money) -> bool {
        let mut seed = self.inner.write().await;
        let mut found = false;
        for service in seed.services.iter_mut().filter(|s| &s.id == id) {
            service.approx_charge = charge;
            found = true;
        }
        found
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>> {
        let seed = self.inner.read().await;
        Ok(seed.components.iter().find(|c| &c.id == id).cloned())
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        Ok(self.inner.read().await.components.clone())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self.inner.read().await.services.clone())
    }
}
