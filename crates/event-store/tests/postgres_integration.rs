//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and run serially.
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt,
    PostgresEventStore, UniqueClaim, Version,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_events_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events, unique_claims")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(
    aggregate_id: AggregateId,
    version: Version,
    event_type: &str,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Vehicle")
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"test": true}))
        .build()
        .unwrap()
}

#[tokio::test]
#[serial]
async fn append_and_retrieve_events() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let event = create_test_event(aggregate_id, Version::first(), "VehicleRegistered");
    let version = store
        .append(vec![event], AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::first());

    let events = store.get_events_for_aggregate(aggregate_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "VehicleRegistered");
    assert_eq!(events[0].version, Version::first());
    assert!(store.aggregate_exists(aggregate_id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn append_multiple_events_atomically() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        create_test_event(aggregate_id, Version::new(1), "VehicleRegistered"),
        create_test_event(aggregate_id, Version::new(2), "IssueReported"),
        create_test_event(aggregate_id, Version::new(3), "IssueReported"),
    ];
    let version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::new(3));

    let stored = store.get_events_for_aggregate(aggregate_id).await.unwrap();
    let versions: Vec<_> = stored.iter().map(|e| e.version.as_i64()).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
#[serial]
async fn stale_expected_version_is_rejected() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(aggregate_id, Version::first(), "VehicleRegistered")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(aggregate_id, Version::first(), "VehicleRegistered")],
            AppendOptions::expect_new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn duplicate_claim_rolls_back_the_whole_append() {
    let store = get_test_store().await;
    let first = AggregateId::new();
    let second = AggregateId::new();
    let claim = UniqueClaim::new("vehicle_vin", "XYZ123");

    store
        .append(
            vec![create_test_event(first, Version::first(), "VehicleRegistered")],
            AppendOptions::expect_new().with_claim(claim.clone()),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(second, Version::first(), "VehicleRegistered")],
            AppendOptions::expect_new().with_claim(claim),
        )
        .await;

    assert!(matches!(result, Err(EventStoreError::UniqueClaimTaken { .. })));
    assert!(!store.aggregate_exists(second).await.unwrap());
}

#[tokio::test]
#[serial]
async fn concurrent_registrations_with_one_claim_have_one_winner() {
    let store = get_test_store().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let id = AggregateId::new();
            store
                .append(
                    vec![create_test_event(id, Version::first(), "VehicleRegistered")],
                    AppendOptions::expect_new().with_claim(UniqueClaim::new("vehicle_vin", "RACE1")),
                )
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let registered = store.get_events_by_type("VehicleRegistered").await.unwrap();
    assert_eq!(registered.len(), 1);
}

#[tokio::test]
#[serial]
async fn events_by_type_are_in_recording_order() {
    let store = get_test_store().await;
    let ids: Vec<_> = (0..3).map(|_| AggregateId::new()).collect();

    for id in &ids {
        store
            .append(
                vec![create_test_event(*id, Version::first(), "VehicleRegistered")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
    }

    let registered = store.get_events_by_type("VehicleRegistered").await.unwrap();
    let got: Vec<_> = registered.iter().map(|e| e.aggregate_id).collect();
    assert_eq!(got, ids);
}

#[tokio::test]
#[serial]
async fn version_tracking() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    assert_eq!(store.get_aggregate_version(aggregate_id).await.unwrap(), None);

    store
        .append(
            vec![
                create_test_event(aggregate_id, Version::new(1), "VehicleRegistered"),
                create_test_event(aggregate_id, Version::new(2), "IssueReported"),
            ],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    assert_eq!(
        store.get_aggregate_version(aggregate_id).await.unwrap(),
        Some(Version::new(2))
    );
}
