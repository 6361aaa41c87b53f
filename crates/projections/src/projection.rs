//! The projection trait and its position in the global event log.

use async_trait::async_trait;
use event_store::EventEnvelope;

use crate::Result;

/// How far into the global event log a projection has read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Log entries consumed so far, whether or not they changed the view.
    pub events_processed: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// The position after consuming one more entry.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }

    /// Returns true if the entry at 1-based `index` has already been consumed.
    pub fn has_seen(&self, index: u64) -> bool {
        index <= self.events_processed
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} events", self.events_processed)
    }
}

/// Folds the global event log into a read model.
///
/// Every event in the log is offered to every projection, in log order.
/// A projection advances its position for each event it is offered, even
/// ones belonging to aggregates it does not track, so the position always
/// equals the number of log entries consumed.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Applies one log entry to the read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Drops everything the projection has built, ahead of a rebuild.
    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_tracks_consumed_entries() {
        let pos = ProjectionPosition::zero().advance().advance();
        assert_eq!(pos.events_processed, 2);
        assert!(pos.has_seen(1));
        assert!(pos.has_seen(2));
        assert!(!pos.has_seen(3));
        assert!(!ProjectionPosition::zero().has_seen(1));
    }

    #[test]
    fn test_position_display() {
        let pos = ProjectionPosition {
            events_processed: 42,
        };
        assert_eq!(pos.to_string(), "42 events");
    }
}
