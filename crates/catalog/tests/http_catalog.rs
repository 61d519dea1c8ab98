//! HttpCatalogClient against a local stand-in for the back office.

use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing::get};
use catalog::{CatalogClient, CatalogError, ComponentId, HttpCatalogClient, TimeoutCatalog};
use common::Money;
use serde_json::{Value, json};

async fn spawn_back_office() -> String {
    let app = Router::new()
        .route(
            "/api/components/",
            get(|| async {
                Json(json!([
                    {"id": 1, "name": "Brake pads", "purchase_price": "2500.00", "repair_price": "800.00", "stock_quantity": 12},
                    {"id": 2, "name": "Battery", "purchase_price": 6000, "repair_price": 1200.5, "stock_quantity": 4}
                ]))
            }),
        )
        .route(
            "/api/components/{id}/",
            get(|axum::extract::Path(id): axum::extract::Path<String>| async move {
                if id == "1" {
                    Ok(Json(json!({
                        "id": 1, "name": "Brake pads",
                        "purchase_price": "2500.00", "repair_price": "800.00",
                        "stock_quantity": 12
                    })))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .route(
            "/alias/api/components/{id}/",
            get(|| async {
                Json(json!({
                    "id": 2, "name": "Battery",
                    "purchase_price": 6000, "repair_price": 1200,
                    "stock_quantity": 4
                }))
            }),
        )
        .route(
            "/pay/services/",
            get(|| async {
                Json(json!({
                    "s1": {"service": "Brake service", "approx_charges": "800.00"},
                    "s2": {"service": "Oil change", "approx_charges": 450}
                }))
            }),
        )
        .route(
            "/slow/pay/services/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(Value::Object(Default::default()))
            }),
        )
        .route(
            "/broken/pay/services/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn lists_components_with_exact_prices() {
    let base = spawn_back_office().await;
    let client = HttpCatalogClient::new(base).unwrap();

    let components = client.list_components().await.unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].id, ComponentId::from("1"));
    assert_eq!(components[0].repair_price, Money::from_units(800));
    assert_eq!(components[1].repair_price, Money::from_cents(120_050));
    assert_eq!(components[1].stock_quantity, 4);
}

#[tokio::test]
async fn unknown_component_is_none() {
    let base = spawn_back_office().await;
    let client = HttpCatalogClient::new(base).unwrap();

    let found = client.get_component(&ComponentId::from("1")).await.unwrap();
    assert_eq!(found.unwrap().name, "Brake pads");

    let missing = client.get_component(&ComponentId::from("99")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn component_id_stays_one_path_segment() {
    let base = spawn_back_office().await;
    let client = HttpCatalogClient::new(base).unwrap();

    for id in ["999/../1", "../1", "1/..", "1/", "1?x=1", "1#frag", "1%2F", "..", ".", ""] {
        let found = client.get_component(&ComponentId::from(id)).await.unwrap();
        assert!(found.is_none(), "{id:?} resolved to {found:?}");
    }
}

#[tokio::test]
async fn component_with_another_id_is_none() {
    let base = spawn_back_office().await;
    let client = HttpCatalogClient::new(format!("{base}/alias")).unwrap();

    let found = client.get_component(&ComponentId::from("1")).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn decodes_keyed_service_listing() {
    let base = spawn_back_office().await;
    let client = HttpCatalogClient::new(base).unwrap();

    let services = client.list_services().await.unwrap();
    assert_eq!(services.len(), 2);
    let s1 = services.iter().find(|s| s.id.as_str() == "s1").unwrap();
    assert_eq!(s1.name, "Brake service");
    assert_eq!(s1.approx_charge, Money::from_units(800));
}

#[tokio::test]
async fn server_errors_surface_as_status() {
    let base = spawn_back_office().await;
    let client = HttpCatalogClient::new(format!("{base}/broken")).unwrap();

    let err = client.list_services().await.unwrap_err();
    assert!(matches!(err, CatalogError::Status { status: 500, .. }));
}

#[tokio::test]
async fn slow_back_office_times_out() {
    let base = spawn_back_office().await;
    let client = TimeoutCatalog::new(
        HttpCatalogClient::new(format!("{base}/slow")).unwrap(),
        Duration::from_millis(100),
    );

    let err = client.list_services().await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout { .. }));
}
