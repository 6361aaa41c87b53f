//! Shipments registered for paid orders.

mod aggregate;
mod events;

pub use aggregate::{Shipment, ShipmentStatus};
pub use events::{ShipmentCreatedData, ShipmentEvent};

use thiserror::Error;

/// Errors that can occur during shipment operations.
#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("Carrier is required")]
    MissingCarrier,

    #[error("Tracking number is required")]
    MissingTrackingNumber,

    /// Tracking numbers are unique across shipments.
    #[error("Tracking number {tracking_number} is already in use")]
    TrackingNumberTaken { tracking_number: String },
}
