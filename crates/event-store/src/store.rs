use std::collections::HashSet;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Snapshot, Version};

/// Options for appending events to a single stream.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected version of the stream for optimistic concurrency control.
    /// If None, no version check is performed.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the stream to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Events destined for one stream inside an atomic multi-stream commit.
#[derive(Debug, Clone)]
pub struct StreamAppend {
    /// The stream the events belong to.
    pub aggregate_id: AggregateId,

    /// The version the stream was read at. The commit fails if it moved.
    pub expected_version: Version,

    /// Events to append, with versions following `expected_version`.
    pub events: Vec<EventEnvelope>,
}

impl StreamAppend {
    /// Returns the version of the stream once these events are written.
    pub fn resulting_version(&self) -> Version {
        self.events
            .last()
            .map(|e| e.version)
            .unwrap_or(self.expected_version)
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to a single stream.
    ///
    /// Events are appended atomically. If `options.expected_version` is set,
    /// the operation fails with `ConcurrencyConflict` when the stream moved.
    ///
    /// Returns the new version of the stream after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Appends events to several streams as one atomic unit.
    ///
    /// Every stream's expected version is checked before anything is written.
    /// If any check fails, nothing is written and `ConcurrencyConflict` is
    /// returned for the first stream that moved.
    ///
    /// Returns the resulting version of each stream, in input order.
    async fn commit(&self, batch: Vec<StreamAppend>) -> Result<Vec<Version>>;

    /// Retrieves all events for a stream in version order.
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves the events of a stream starting from a specific version.
    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Streams all events in the store in commit order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the current version of a stream, or None if it has no events.
    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;

    /// Saves a snapshot, replacing any previous one for the stream.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for a stream.
    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Checks if a stream has any events.
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.get_aggregate_version(aggregate_id).await?.is_some())
    }

    /// Loads a stream's events, starting from its snapshot when one exists.
    async fn load_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.get_snapshot(aggregate_id).await? {
            let events = self
                .get_events_for_aggregate_from_version(aggregate_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.get_events_for_aggregate(aggregate_id).await?;
            Ok((None, events))
        }
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates the events of a single-stream append.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some((first, rest)) = events.split_first() else {
        return Err(EventStoreError::InvalidAppend(
            "cannot append an empty event list".to_string(),
        ));
    };

    let mut expected_version = first.version;
    for event in rest {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "all events must belong to the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "all events must have the same aggregate type".to_string(),
            ));
        }
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}

/// Validates a multi-stream commit before any store state is inspected.
pub fn validate_commit(batch: &[StreamAppend]) -> Result<()> {
    if batch.is_empty() {
        return Err(EventStoreError::InvalidAppend(
            "cannot commit an empty batch".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(batch.len());
    for stream in batch {
        if !seen.insert(stream.aggregate_id) {
            return Err(EventStoreError::InvalidAppend(format!(
                "aggregate {} appears more than once in the commit",
                stream.aggregate_id
            )));
        }

        validate_events_for_append(&stream.events)?;

        let first = stream.events.first().map(|e| (e.aggregate_id, e.version));
        match first {
            Some((id, version))
                if id == stream.aggregate_id && version == stream.expected_version.next() => {}
            _ => {
                return Err(EventStoreError::InvalidAppend(format!(
                    "events for aggregate {} do not follow version {}",
                    stream.aggregate_id, stream.expected_version
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Cart")
            .event_type("CartCleared")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_append_is_rejected() {
        assert!(matches!(
            validate_events_for_append(&[]),
            Err(EventStoreError::InvalidAppend(_))
        ));
    }

    #[test]
    fn gaps_in_versions_are_rejected() {
        let id = AggregateId::new();
        let events = vec![event(id, 1), event(id, 3)];
        assert!(validate_events_for_append(&events).is_err());
    }

    #[test]
    fn commit_rejects_duplicate_streams() {
        let id = AggregateId::new();
        let batch = vec![
            StreamAppend {
                aggregate_id: id,
                expected_version: Version::initial(),
                events: vec![event(id, 1)],
            },
            StreamAppend {
                aggregate_id: id,
                expected_version: Version::first(),
                events: vec![event(id, 2)],
            },
        ];
        assert!(validate_commit(&batch).is_err());
    }

    #[test]
    fn commit_rejects_versions_not_following_expected() {
        let id = AggregateId::new();
        let batch = vec![StreamAppend {
            aggregate_id: id,
            expected_version: Version::new(4),
            events: vec![event(id, 1)],
        }];
        assert!(validate_commit(&batch).is_err());
    }

    #[test]
    fn resulting_version_is_last_event_version() {
        let id = AggregateId::new();
        let stream = StreamAppend {
            aggregate_id: id,
            expected_version: Version::new(2),
            events: vec![event(id, 3), event(id, 4)],
        };
        assert!(validate_commit(std::slice::from_ref(&stream)).is_ok());
        assert_eq!(stream.resulting_version(), Version::new(4));
    }
}
