//! HTTP API server for the workshop repair-order system.
//!
//! Exposes vehicle registration, issue reports, quotes and payments over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use catalog::{CatalogClient, CatalogSeed, InMemoryCatalog};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use workflow::WorkflowController;

use error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore, C: CatalogClient> {
    pub controller: WorkflowController<S, C>,
}

impl<S, C> AppState<S, C>
where
    S: EventStore + Clone,
    C: CatalogClient + Clone,
{
    pub fn new(event_store: S, catalog: C) -> Self {
        Self {
            controller: WorkflowController::from_parts(event_store, catalog),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C>(state: Arc<AppState<S, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    use routes::vehicles;

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/vehicles",
            post(vehicles::register::<S, C>).get(vehicles::list::<S, C>),
        )
        .route("/vehicles/{id}", get(vehicles::get::<S, C>))
        .route("/vehicles/{id}/events", get(vehicles::events::<S, C>))
        .route("/vehicles/{id}/issues", post(vehicles::report_issue::<S, C>))
        .route("/vehicles/{id}/quote", post(vehicles::quote::<S, C>))
        .route("/vehicles/{id}/payment", post(vehicles::pay::<S, C>))
        .route("/catalog/services", get(routes::catalog::services::<S, C>))
        .route("/catalog/components", get(routes::catalog::components::<S, C>))
        .with_state(state)
        .merge(metrics_router)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// State over the given journal and the built-in workshop catalog.
pub fn create_default_state<S>(event_store: S) -> Arc<AppState<S, InMemoryCatalog>>
where
    S: EventStore + Clone + 'static,
{
    let catalog = InMemoryCatalog::with_seed(CatalogSeed::workshop());
    Arc::new(AppState::new(event_store, catalog))
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal("internal server error".to_string()).into_response()
}
