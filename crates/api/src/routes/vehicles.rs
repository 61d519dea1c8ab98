//! Vehicle registration, issue reports, quotes and payments.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{CatalogClient, ServiceId};
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{AvailableActions, Issue, Payment, RepairStatus};
use event_store::EventStore;
use serde::{Deserialize, Serialize};
use workflow::{Quote, VehicleOverview};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

/// Model year as sent by a form (`"2020"`) or a JSON client (`2020`).
#[derive(Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    Text(String),
}

impl YearInput {
    fn into_text(self) -> String {
        match self {
            YearInput::Number(n) => n.to_string(),
            YearInput::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterVehicleRequest {
    #[serde(default)]
    pub vin: String,
    #[serde(default)]
    pub model: String,
    pub year: Option<YearInput>,
}

#[derive(Deserialize)]
pub struct ReportIssueRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub component_choice: String,
    pub component: Option<String>,
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub services: Vec<ServiceId>,
}

// -- Response types --

#[derive(Serialize)]
pub struct VehicleResponse {
    pub id: Option<AggregateId>,
    pub vin: String,
    pub model: String,
    pub year: u16,
    pub status: RepairStatus,
    pub payment_status: bool,
    pub issues: Vec<Issue>,
    pub payment: Option<Payment>,
    pub actions: AvailableActions,
    pub prompt: &'static str,
    pub registered_at: Option<DateTime<Utc>>,
}

impl From<VehicleOverview> for VehicleResponse {
    fn from(overview: VehicleOverview) -> Self {
        use domain::Aggregate;

        let vehicle = overview.vehicle;
        Self {
            id: vehicle.id(),
            vin: vehicle.vin().as_str().to_string(),
            model: vehicle.model().to_string(),
            year: vehicle.year(),
            status: overview.status,
            payment_status: overview.payment_status,
            issues: vehicle.issues().to_vec(),
            payment: vehicle.payment().cloned(),
            actions: overview.actions,
            prompt: overview.prompt,
            registered_at: vehicle.registered_at(),
        }
    }
}

/// Response type for event envelope data.
#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub aggregate_id: String,
    pub version: i64,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

// -- Handlers --

/// POST /vehicles
#[tracing::instrument(skip(state, body))]
pub async fn register<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    body: Result<Json<RegisterVehicleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VehicleResponse>), ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let Json(req) = body?;
    let year = req.year.map(YearInput::into_text).unwrap_or_default();

    let overview = state
        .controller
        .register_vehicle(&req.vin, &req.model, &year)
        .await?;

    Ok((StatusCode::CREATED, Json(overview.into())))
}

/// GET /vehicles
#[tracing::instrument(skip(state))]
pub async fn list<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<Vec<VehicleResponse>>, ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let vehicles = state.controller.list_vehicles().await?;
    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

/// GET /vehicles/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<VehicleResponse>, ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let vehicle_id = parse_vehicle_id(&id)?;
    let overview = state.controller.vehicle(vehicle_id).await?;
    Ok(Json(overview.into()))
}

/// GET /vehicles/{id}/events
#[tracing::instrument(skip(state))]
pub async fn events<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let vehicle_id = parse_vehicle_id(&id)?;
    let envelopes = state.controller.history(vehicle_id).await?;

    Ok(Json(
        envelopes
            .into_iter()
            .map(|e| EventEnvelopeResponse {
                event_id: e.event_id.to_string(),
                event_type: e.event_type,
                aggregate_id: e.aggregate_id.to_string(),
                version: e.version.as_i64(),
                timestamp: e.timestamp,
                payload: e.payload,
            })
            .collect(),
    ))
}

/// POST /vehicles/{id}/issues
#[tracing::instrument(skip(state, body))]
pub async fn report_issue<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    body: Result<Json<ReportIssueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Issue>), ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let vehicle_id = parse_vehicle_id(&id)?;
    let Json(req) = body?;

    let issue = state
        .controller
        .report_issue(
            vehicle_id,
            &req.description,
            &req.component_choice,
            req.component.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(issue)))
}

/// POST /vehicles/{id}/quote
#[tracing::instrument(skip(state, body))]
pub async fn quote<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    body: Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<Quote>, ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let vehicle_id = parse_vehicle_id(&id)?;
    let Json(req) = body?;

    let quote = state
        .controller
        .request_quote(vehicle_id, &req.services)
        .await?;
    Ok(Json(quote))
}

/// POST /vehicles/{id}/payment
///
/// The body is a quote previously returned by the quote endpoint.
#[tracing::instrument(skip(state, body))]
pub async fn pay<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    body: Result<Json<Quote>, JsonRejection>,
) -> Result<(StatusCode, Json<Payment>), ApiError>
where
    S: EventStore + Clone + 'static,
    C: CatalogClient + Clone + 'static,
{
    let vehicle_id = parse_vehicle_id(&id)?;
    let Json(quote) = body?;

    let payment = state.controller.confirm_payment(vehicle_id, &quote).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

fn parse_vehicle_id(id: &str) -> Result<AggregateId, ApiError> {
    Ok(id.parse()?)
}
