use std::sync::Arc;

use async_trait::async_trait;

use crate::{Component, ComponentId, Result, Service};

/// Read-only access to the component and service catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Looks up one component. `Ok(None)` means the catalog has no such id.
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>>;

    /// Lists every component.
    async fn list_components(&self) -> Result<Vec<Component>>;

    /// Lists every service with its current approximate charge.
    async fn list_services(&self) -> Result<Vec<Service>>;
}

#[async_trait]
impl<T: CatalogClient + ?Sized> CatalogClient for Arc<T> {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>> {
        (**self).get_component(id).await
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        (**self).list_components().await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        (**self).list_services().await
    }
}
