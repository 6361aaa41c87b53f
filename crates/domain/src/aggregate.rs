//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events are facts, named in the past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name stored alongside the payload.
    fn event_type(&self) -> &'static str;
}

/// Trait for event-sourced aggregates.
///
/// Aggregates decide which events a command produces (command methods take
/// `&self` and return events) and fold events into state (`apply`). State
/// never changes except through `apply`.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors its command methods return.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier, or None if no event created it yet.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the stream version this state reflects.
    fn version(&self) -> Version;

    /// Sets the stream version.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate.
    ///
    /// Must be deterministic and infallible: events have already happened.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Returns true once the creating event has been applied.
    fn exists(&self) -> bool {
        self.id().is_some()
    }
}

/// Trait for aggregates whose state is periodically snapshotted.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Number of events between snapshots.
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot is due at the current version.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum ShelfEvent {
        Stocked { id: AggregateId, units: u32 },
        Picked { units: u32 },
    }

    impl DomainEvent for ShelfEvent {
        fn event_type(&self) -> &'static str {
            match self {
                ShelfEvent::Stocked { .. } => "ShelfStocked",
                ShelfEvent::Picked { .. } => "ShelfPicked",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Shelf {
        id: Option<AggregateId>,
        units: u32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("shelf error")]
    struct ShelfError;

    impl Aggregate for Shelf {
        type Event = ShelfEvent;
        type Error = ShelfError;

        fn aggregate_type() -> &'static str {
            "Shelf"
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
                ShelfEvent::Stocked { id, units } => {
                    self.id = Some(id);
                    self.units = units;
                }
                ShelfEvent::Picked { units } => self.units -= units,
            }
        }
    }

    impl SnapshotCapable for Shelf {
        fn snapshot_interval() -> usize {
            10
        }
    }

    #[test]
    fn test_apply_events_folds_state() {
        let mut shelf = Shelf::default();
        assert!(!shelf.exists());

        shelf.apply_events(vec![
            ShelfEvent::Stocked {
                id: AggregateId::new(),
                units: 5,
            },
            ShelfEvent::Picked { units: 2 },
        ]);

        assert!(shelf.exists());
        assert_eq!(shelf.units, 3);
    }

    #[test]
    fn test_domain_event_type() {
        assert_eq!(ShelfEvent::Picked { units: 1 }.event_type(), "ShelfPicked");
    }

    #[test]
    fn test_snapshot_interval() {
        let mut shelf = Shelf::default();
        assert!(!shelf.should_snapshot());

        shelf.set_version(Version::new(10));
        assert!(shelf.should_snapshot());

        shelf.set_version(Version::new(11));
        assert!(!shelf.should_snapshot());
    }
}
