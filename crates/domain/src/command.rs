//! Command handling infrastructure.

use std::marker::PhantomData;

use chrono::Utc;
use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, UniqueClaim, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;
use crate::locks::KeyedLocks;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// A request to change one aggregate.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;
}

/// Loads aggregates, runs commands against them and persists the outcome.
///
/// Each `execute` holds the aggregate's lock from load to append, so two
/// commands on one aggregate in this process never decide on the same state.
/// The journal's expected-version check covers writers in other processes.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    locks: KeyedLocks,
    _phantom: PhantomData<fn() -> A>,
}

impl<S, A> Clone for CommandHandler<S, A>
where
    S: EventStore + Clone,
    A: Aggregate,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locks: self.locks.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds an aggregate from its journal.
    ///
    /// If the aggregate doesn't exist, returns a default instance.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let events = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either a list of events to apply, or an error.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        self.execute_claiming(aggregate_id, Vec::new(), command_fn)
            .await
    }

    /// Like [`execute`](Self::execute), also claiming unique keys in the same append.
    pub async fn execute_claiming<F>(
        &self,
        aggregate_id: AggregateId,
        claims: Vec<UniqueClaim>,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guard = self.locks.lock(aggregate_id).await;

        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;

        let mut options = AppendOptions::expect_version(current_version);
        options.claims = claims;

        let new_version = self.store.append(envelopes, options).await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;
        // Events from one command share a timestamp.
        let recorded_at = Utc::now();

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .timestamp(recorded_at)
                .metadata(
                    "decided_at_version",
                    serde_json::json!(current_version.as_i64()),
                )
                .payload(event)?
                .build()?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::{EventStoreError, InMemoryEventStore};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum NoteEvent {
        Created { id: AggregateId, title: String },
        Edited { body: String },
    }

    impl DomainEvent for NoteEvent {
        fn event_type(&self) -> &'static str {
            match self {
                NoteEvent::Created { .. } => "NoteCreated",
                NoteEvent::Edited { .. } => "NoteEdited",
            }
        }
    }

    #[derive(Debug, Default)]
    struct Note {
        id: Option<AggregateId>,
        title: String,
        body: String,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("note rejected: {0}")]
    struct NoteRejected(&'static str);

    impl From<NoteRejected> for DomainError {
        fn from(_: NoteRejected) -> Self {
            DomainError::VehicleNotFound(AggregateId::from_uuid(uuid::Uuid::nil()))
        }
    }

    impl Aggregate for Note {
        type Event = NoteEvent;
        type Error = NoteRejected;

        fn aggregate_type() -> &'static str {
            "Note"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                NoteEvent::Created { id, title } => {
                    self.id = Some(id);
                    self.title = title;
                }
                NoteEvent::Edited { body } => self.body = body,
            }
        }
    }

    fn created(id: AggregateId) -> Vec<NoteEvent> {
        vec![NoteEvent::Created {
            id,
            title: "Test".to_string(),
        }]
    }

    #[tokio::test]
    async fn execute_creates_aggregate() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        let result = handler.execute(id, |_| Ok(created(id))).await.unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.aggregate.id(), Some(id));
        assert_eq!(result.aggregate.title, "Test");
    }

    #[tokio::test]
    async fn execute_updates_aggregate() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        handler.execute(id, |_| Ok(created(id))).await.unwrap();
        let result = handler
            .execute(id, |_| {
                Ok(vec![NoteEvent::Edited {
                    body: "hello".to_string(),
                }])
            })
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.aggregate.body, "hello");

        let reloaded = handler.load_existing(id).await.unwrap().unwrap();
        assert_eq!(reloaded.body, "hello");
        assert_eq!(reloaded.version(), Version::new(2));
    }

    #[tokio::test]
    async fn rejected_command_persists_nothing() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Note> = CommandHandler::new(store.clone());

        let result = handler
            .execute(AggregateId::new(), |_| Err(NoteRejected("no")))
            .await;

        assert!(matches!(result, Err(DomainError::VehicleNotFound(_))));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn load_existing_returns_none_for_new() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        assert!(handler.load_existing(AggregateId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_events_returns_without_persisting() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Note> = CommandHandler::new(store.clone());

        let result = handler
            .execute(AggregateId::new(), |_| Ok(vec![]))
            .await
            .unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::initial());
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn claims_travel_with_the_append() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let claim = UniqueClaim::new("note_title", "TEST");

        let first = AggregateId::new();
        handler
            .execute_claiming(first, vec![claim.clone()], |_| Ok(created(first)))
            .await
            .unwrap();

        let second = AggregateId::new();
        let result = handler
            .execute_claiming(second, vec![claim], |_| Ok(created(second)))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::EventStore(EventStoreError::UniqueClaimTaken { .. }))
        ));
        assert!(handler.load_existing(second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn envelopes_of_one_command_share_time_and_origin() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Note> = CommandHandler::new(store.clone());
        let id = AggregateId::new();

        handler
            .execute(id, |_| {
                let mut events = created(id);
                events.push(NoteEvent::Edited {
                    body: "draft".to_string(),
                });
                Ok(events)
            })
            .await
            .unwrap();

        let envelopes = store.get_events_for_aggregate(id).await.unwrap();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].timestamp, envelopes[1].timestamp);
        for envelope in &envelopes {
            assert_eq!(
                envelope.metadata.get("decided_at_version"),
                Some(&serde_json::json!(0))
            );
        }
    }

    #[tokio::test]
    async fn concurrent_commands_on_one_aggregate_serialize() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();
        handler.execute(id, |_| Ok(created(id))).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let handler = handler.clone();
            handles.push(tokio::spawn(async move {
                handler
                    .execute(id, move |_| {
                        Ok(vec![NoteEvent::Edited {
                            body: i.to_string(),
                        }])
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let note = handler.load_existing(id).await.unwrap().unwrap();
        assert_eq!(note.version(), Version::new(11));
    }
}
