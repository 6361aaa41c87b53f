//! Projection error types.

use common::AggregateId;
use thiserror::Error;

/// Errors raised while feeding events into read models.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An update arrived for a row the view never saw created.
    #[error("{projection} has no row for aggregate {aggregate_id}")]
    UnknownAggregate {
        projection: &'static str,
        aggregate_id: AggregateId,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
