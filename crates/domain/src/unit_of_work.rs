//! Multi-aggregate transactions.
//!
//! A [`UnitOfWork`] collects events for several aggregates and writes them
//! with one [`EventStore::commit`]. Every stream carries the version it was
//! read at, so the commit either lands in full against an unchanged
//! precondition snapshot or writes nothing.

use common::AggregateId;
use event_store::{EventStore, Snapshot, StreamAppend, Version};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::command::{build_envelopes, load_aggregate};
use crate::error::DomainError;

/// A pending atomic write across several aggregates.
///
/// Dropping a unit of work without committing discards it.
pub struct UnitOfWork<'a, S: EventStore + ?Sized> {
    store: &'a S,
    commit_id: Uuid,
    streams: Vec<StreamAppend>,
    snapshots: Vec<Snapshot>,
}

impl<'a, S: EventStore + ?Sized> UnitOfWork<'a, S> {
    /// Begins a unit of work against `store`.
    pub fn begin(store: &'a S) -> Self {
        let commit_id = Uuid::new_v4();
        tracing::trace!(%commit_id, "unit of work started");
        Self {
            store,
            commit_id,
            streams: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Returns the id stamped on every event of this unit.
    pub fn commit_id(&self) -> Uuid {
        self.commit_id
    }

    /// Reads an aggregate at its current version.
    pub async fn load<A>(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A: Aggregate + DeserializeOwned,
    {
        load_aggregate(self.store, aggregate_id).await
    }

    /// Stages `events` for an aggregate and applies them to it.
    ///
    /// The aggregate must be in the state it was loaded in, plus whatever
    /// this unit already recorded for it. Empty event lists stage nothing.
    pub fn record<A: Aggregate>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate: &mut A,
        events: Vec<A::Event>,
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let current = aggregate.version();
        let envelopes =
            build_envelopes::<A>(aggregate_id, current, &events, Some(self.commit_id))?;
        let new_version = envelopes.last().map(|e| e.version).unwrap_or(current);

        match self
            .streams
            .iter_mut()
            .find(|s| s.aggregate_id == aggregate_id)
        {
            Some(stream) => stream.events.extend(envelopes),
            None => self.streams.push(StreamAppend {
                aggregate_id,
                expected_version: current,
                events: envelopes,
            }),
        }

        aggregate.apply_events(events);
        aggregate.set_version(new_version);
        Ok(())
    }

    /// Runs a command against an aggregate and stages its events.
    pub fn execute<A, F>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate: &mut A,
        command_fn: F,
    ) -> Result<Vec<A::Event>, DomainError>
    where
        A: Aggregate,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let events = command_fn(aggregate)?;
        self.record(aggregate_id, aggregate, events.clone())?;
        Ok(events)
    }

    /// Queues a snapshot to be saved after a successful commit, if one is due.
    pub fn snapshot_if_due<A: SnapshotCapable>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate: &A,
    ) -> Result<(), DomainError> {
        let touched = self.streams.iter().any(|s| s.aggregate_id == aggregate_id);
        if touched && aggregate.should_snapshot() {
            self.snapshots.push(Snapshot::from_state(
                aggregate_id,
                A::aggregate_type(),
                aggregate.version(),
                aggregate,
            )?);
        }
        Ok(())
    }

    /// Returns true if nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Returns the number of streams staged so far.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Writes every staged stream atomically.
    ///
    /// Returns the resulting version of each stream, in staging order. A
    /// concurrency conflict on any stream fails the whole commit with
    /// nothing written; callers may retry from a fresh read.
    pub async fn commit(self) -> Result<Vec<Version>, DomainError> {
        if self.streams.is_empty() {
            return Ok(Vec::new());
        }

        let commit_id = self.commit_id;
        let stream_count = self.streams.len();

        let versions = match self.store.commit(self.streams).await {
            Ok(versions) => versions,
            Err(e) => {
                if e.is_conflict() {
                    metrics::counter!("unit_of_work_conflicts_total").increment(1);
                    tracing::debug!(%commit_id, error = %e, "unit of work conflicted");
                }
                return Err(e.into());
            }
        };

        metrics::counter!("unit_of_work_commits_total").increment(1);
        tracing::debug!(%commit_id, streams = stream_count, "unit of work committed");

        for snapshot in self.snapshots {
            let aggregate_id = snapshot.aggregate_id;
            if let Err(e) = self.store.save_snapshot(snapshot).await {
                tracing::warn!(%aggregate_id, error = %e, "failed to save snapshot");
            }
        }

        Ok(versions)
    }

    /// Discards everything staged.
    pub fn abort(self) {
        tracing::debug!(
            commit_id = %self.commit_id,
            streams = self.streams.len(),
            "unit of work aborted"
        );
    }
}
