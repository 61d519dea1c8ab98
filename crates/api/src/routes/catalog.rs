//! Read-only views of the parts and services catalog.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use catalog::{CatalogClient, Component, Service};
use event_store::EventStore;

use crate::AppState;
use crate::error::ApiError;

/// GET /catalog/services
#[tracing::instrument(skip(state))]
pub async fn services<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<Vec<Service>>, ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    Ok(Json(state.controller.available_services().await?))
}

/// GET /catalog/components
#[tracing::instrument(skip(state))]
pub async fn components<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<Vec<Component>>, ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    Ok(Json(state.controller.available_components().await?))
}
