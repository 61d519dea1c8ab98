//! Append-only journal for the repair-order system.
//!
//! Each vehicle is one stream of events. Appends are atomic, guarded by
//! optimistic concurrency, and may claim unique keys (such as a VIN) in the
//! same unit of work.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt, UniqueClaim};
