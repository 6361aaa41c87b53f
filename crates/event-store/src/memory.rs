use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Snapshot, Version,
    store::{
        AppendOptions, EventStore, EventStream, StreamAppend, validate_commit,
        validate_events_for_append,
    },
};

#[derive(Default)]
struct Log {
    /// Every event in commit order.
    events: Vec<EventEnvelope>,
    /// Current version per stream.
    versions: HashMap<AggregateId, Version>,
}

impl Log {
    fn version_of(&self, aggregate_id: AggregateId) -> Version {
        self.versions
            .get(&aggregate_id)
            .copied()
            .unwrap_or(Version::initial())
    }

    fn check(&self, aggregate_id: AggregateId, expected: Version) -> Result<()> {
        let actual = self.version_of(aggregate_id);
        if actual != expected {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn write(&mut self, events: Vec<EventEnvelope>) -> Version {
        let mut last = Version::initial();
        for event in events {
            last = event.version;
            self.versions.insert(event.aggregate_id, event.version);
            self.events.push(event);
        }
        last
    }
}

/// In-memory event store.
///
/// Used by the test suites and by the server when no database is configured.
/// A single lock guards the log, so a multi-stream commit is observed either
/// completely or not at all.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let mut log = self.log.write().await;

        let Some(first) = events.first() else {
            return Ok(Version::initial());
        };
        let aggregate_id = first.aggregate_id;
        let current = log.version_of(aggregate_id);

        if let Some(expected) = options.expected_version {
            log.check(aggregate_id, expected)?;
        }

        // Unique (aggregate_id, version) constraint
        if first.version <= current {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        Ok(log.write(events))
    }

    async fn commit(&self, batch: Vec<StreamAppend>) -> Result<Vec<Version>> {
        validate_commit(&batch)?;

        let mut log = self.log.write().await;

        for stream in &batch {
            log.check(stream.aggregate_id, stream.expected_version)?;
        }

        let versions = batch
            .into_iter()
            .map(|stream| log.write(stream.events))
            .collect();

        Ok(versions)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        self.get_events_for_aggregate_from_version(aggregate_id, Version::initial())
            .await
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.log.read().await.events.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let log = self.log.read().await;
        Ok(log.versions.get(&aggregate_id).copied())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}
