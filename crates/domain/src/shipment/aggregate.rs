//! Shipment aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{ShipmentError, ShipmentEvent, events::ShipmentCreatedData};

/// Carrier-side status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    #[default]
    Shipped,
    InTransit,
    Delivered,
    Returned,
}

/// A parcel handed to a carrier for one order.
///
/// The stream id is derived from the tracking number, so a tracking number
/// can back at most one shipment. One shipment per order is enforced by the
/// order itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipment {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    order_id: Option<AggregateId>,
    carrier: String,
    tracking_number: String,
    status: ShipmentStatus,
    shipped_at: Option<DateTime<Utc>>,
}

impl Aggregate for Shipment {
    type Event = ShipmentEvent;
    type Error = ShipmentError;

    fn aggregate_type() -> &'static str {
        "Shipment"
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
            ShipmentEvent::ShipmentCreated(data) => self.apply_created(data),
        }
    }
}

// Query methods
impl Shipment {
    /// Returns the stream id for a tracking number.
    pub fn id_for(tracking_number: &str) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), tracking_number.trim())
    }

    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }
}

// Command methods (return events)
impl Shipment {
    /// Registers the shipment.
    pub fn create(
        &self,
        order_id: AggregateId,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        let carrier = carrier.trim();
        let tracking_number = tracking_number.trim();

        if carrier.is_empty() {
            return Err(ShipmentError::MissingCarrier);
        }
        if tracking_number.is_empty() {
            return Err(ShipmentError::MissingTrackingNumber);
        }
        if self.exists() {
            return Err(ShipmentError::TrackingNumberTaken {
                tracking_number: tracking_number.to_string(),
            });
        }

        Ok(vec![ShipmentEvent::created(
            Self::id_for(tracking_number),
            order_id,
            carrier,
            tracking_number,
        )])
    }
}

impl Shipment {
    fn apply_created(&mut self, data: ShipmentCreatedData) {
        self.id = Some(data.shipment_id);
        self.order_id = Some(data.order_id);
        self.carrier = data.carrier;
        self.tracking_number = data.tracking_number;
        self.status = ShipmentStatus::Shipped;
        self.shipped_at = Some(data.shipped_at);
    }
}
