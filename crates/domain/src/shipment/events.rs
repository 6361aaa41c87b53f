//! Shipment domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a shipment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShipmentEvent {
    ShipmentCreated(ShipmentCreatedData),
}

impl DomainEvent for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentCreated(_) => "ShipmentCreated",
        }
    }
}

/// Data for ShipmentCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCreatedData {
    pub shipment_id: AggregateId,
    pub order_id: AggregateId,
    pub carrier: String,
    pub tracking_number: String,
    pub shipped_at: DateTime<Utc>,
}

impl ShipmentEvent {
    pub fn created(
        shipment_id: AggregateId,
        order_id: AggregateId,
        carrier: impl Into<String>,
        tracking_number: impl Into<String>,
    ) -> Self {
        ShipmentEvent::ShipmentCreated(ShipmentCreatedData {
            shipment_id,
            order_id,
            carrier: carrier.into(),
            tracking_number: tracking_number.into(),
            shipped_at: Utc::now(),
        })
    }
}
