use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, UniqueClaim, validate_events_for_append},
};

#[derive(Default)]
struct JournalState {
    events: Vec<EventEnvelope>,
    claims: HashMap<UniqueClaim, AggregateId>,
}

impl JournalState {
    fn current_version(&self, aggregate_id: AggregateId) -> Version {
        self.events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial())
    }
}

/// In-memory journal used by tests and by the server when no database is configured.
///
/// Events and claims sit behind one lock so an append is atomic exactly like
/// the PostgreSQL transaction.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<JournalState>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }

    /// Returns the stream holding a claim, if any.
    pub async fn claim_holder(&self, claim: &UniqueClaim) -> Option<AggregateId> {
        self.state.read().await.claims.get(claim).copied()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first_event = &events[0];
        let aggregate_id = first_event.aggregate_id;

        let mut state = self.state.write().await;
        let current_version = state.current_version(aggregate_id);

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Mirrors the (aggregate_id, version) unique index of the SQL schema.
        if first_event.version <= current_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        for claim in &options.claims {
            if state.claims.contains_key(claim) {
                return Err(EventStoreError::UniqueClaimTaken {
                    scope: claim.scope.clone(),
                    key: claim.key.clone(),
                });
            }
        }

        for claim in options.claims {
            state.claims.insert(claim, aggregate_id);
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(current_version);
        state.events.extend(events);

        tracing::debug!(%aggregate_id, version = %last_version, "journal append");
        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = state
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        // Insertion order is recording order.
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let state = self.state.read().await;
        let version = state
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventStoreExt;

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
    async fn append_and_read_back_in_version_order() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let events = vec![
            create_test_event(id, Version::new(1), "VehicleRegistered"),
            create_test_event(id, Version::new(2), "IssueReported"),
        ];
        let version = store
            .append(events, AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::new(2));

        let stored = store.get_events_for_aggregate(id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].event_type, "VehicleRegistered");
        assert_eq!(stored[1].version, Version::new(2));
        assert!(store.aggregate_exists(id).await.unwrap());
        assert!(!store.aggregate_exists(AggregateId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_expected_version_conflicts() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        store
            .append(
                vec![create_test_event(id, Version::first(), "VehicleRegistered")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let result = store
            .append(
                vec![create_test_event(id, Version::new(2), "IssueReported")],
                AppendOptions::expect_version(Version::initial()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn reused_version_conflicts_without_expectation() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        store
            .append(
                vec![create_test_event(id, Version::first(), "VehicleRegistered")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        let result = store
            .append(
                vec![create_test_event(id, Version::first(), "VehicleRegistered")],
                AppendOptions::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn claims_are_exclusive_and_leave_no_trace_on_failure() {
        let store = InMemoryEventStore::new();
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
                AppendOptions::expect_new().with_claim(claim.clone()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::UniqueClaimTaken { ref key, .. }) if key == "XYZ123"
        ));
        assert_eq!(store.claim_holder(&claim).await, Some(first));
        assert!(store.get_events_for_aggregate(second).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_by_type_span_streams_in_recording_order() {
        let store = InMemoryEventStore::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        for id in [a, b] {
            store
                .append(
                    vec![create_test_event(id, Version::first(), "VehicleRegistered")],
                    AppendOptions::expect_new(),
                )
                .await
                .unwrap();
        }
        store
            .append(
                vec![create_test_event(a, Version::new(2), "IssueReported")],
                AppendOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();

        let registered = store.get_events_by_type("VehicleRegistered").await.unwrap();
        let ids: Vec<_> = registered.iter().map(|e| e.aggregate_id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn version_of_unknown_stream_is_none() {
        let store = InMemoryEventStore::new();
        assert_eq!(
            store.get_aggregate_version(AggregateId::new()).await.unwrap(),
            None
        );
    }
}
