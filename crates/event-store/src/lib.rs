//! Append-only event store.
//!
//! Streams are keyed by [`AggregateId`] and versioned for optimistic
//! concurrency. Besides single-stream appends, stores support an atomic
//! multi-stream [`commit`](EventStore::commit) used by the domain's unit of work.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream, StreamAppend};
