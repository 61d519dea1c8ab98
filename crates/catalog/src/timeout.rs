use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::{CatalogClient, CatalogError, Component, ComponentId, Result, Service};

/// Default bound on a single catalog call.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounds every call of the wrapped client and records call metrics.
///
/// A call that exceeds the bound fails with [`CatalogError::Timeout`]; it is
/// not retried.
#[derive(Clone)]
pub struct TimeoutCatalog<C> {
    inner: C,
    timeout: Duration,
}

impl<C: CatalogClient> TimeoutCatalog<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn with_default_timeout(inner: C) -> Self {
        Self::new(inner, DEFAULT_CATALOG_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        metrics::counter!("catalog_requests_total", "operation" => operation).increment(1);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => {
                if let Err(e) = &result {
                    tracing::warn!(operation, error = %e, "catalog call failed");
                }
                result
            }
            Err(_) => {
                metrics::counter!("catalog_timeouts_total").increment(1);
                tracing::warn!(operation, timeout = ?self.timeout, "catalog call timed out");
                Err(CatalogError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<C: CatalogClient> CatalogClient for TimeoutCatalog<C> {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>> {
        self.bounded("get_component", self.inner.get_component(id))
            .await
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        self.bounded("list_components", self.inner.list_components())
            .await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.bounded("list_services", self.inner.list_services())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogSeed, InMemoryCatalog};

    struct StalledCatalog;

    #[async_trait]
    impl CatalogClient for StalledCatalog {
        async fn get_component(&self, _id: &ComponentId) -> Result<Option<Component>> {
            std::future::pending().await
        }

        async fn list_components(&self) -> Result<Vec<Component>> {
            std::future::pending().await
        }

        async fn list_services(&self) -> Result<Vec<Service>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out() {
        let catalog = TimeoutCatalog::new(StalledCatalog, Duration::from_millis(50));

        let err = catalog.list_services().await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Timeout {
                operation: "list_services",
                ..
            }
        ));
        assert_eq!(err.kind(), common::ErrorKind::Dependency);
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let catalog = TimeoutCatalog::with_default_timeout(InMemoryCatalog::with_seed(
            CatalogSeed::workshop(),
        ));
        assert_eq!(catalog.timeout(), DEFAULT_CATALOG_TIMEOUT);
        assert_eq!(catalog.list_components().await.unwrap().len(), 3);
    }
}
