//! Payment domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::aggregate::DomainEvent;

/// Events that can occur on a payment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    PaymentInitiated(PaymentInitiatedData),
    PaymentSucceeded(PaymentSucceededData),
    PaymentDeclined(PaymentDeclinedData),
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentInitiated(_) => "PaymentInitiated",
            PaymentEvent::PaymentSucceeded(_) => "PaymentSucceeded",
            PaymentEvent::PaymentDeclined(_) => "PaymentDeclined",
        }
    }
}

/// Data for PaymentInitiated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitiatedData {
    pub payment_id: AggregateId,
    pub order_id: AggregateId,
    pub provider: String,
    pub amount: Money,
    pub initiated_at: DateTime<Utc>,
}

/// Data for PaymentSucceeded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSucceededData {
    pub provider_transaction_id: String,
    pub succeeded_at: DateTime<Utc>,
}

/// Data for PaymentDeclined event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDeclinedData {
    pub reason: String,
    pub declined_at: DateTime<Utc>,
}

impl PaymentEvent {
    pub fn initiated(
        payment_id: AggregateId,
        order_id: AggregateId,
        provider: impl Into<String>,
        amount: Money,
    ) -> Self {
        PaymentEvent::PaymentInitiated(PaymentInitiatedData {
            payment_id,
            order_id,
            provider: provider.into(),
            amount,
            initiated_at: Utc::now(),
        })
    }

    pub fn succeeded(provider_transaction_id: impl Into<String>) -> Self {
        PaymentEvent::PaymentSucceeded(PaymentSucceededData {
            provider_transaction_id: provider_transaction_id.into(),
            succeeded_at: Utc::now(),
        })
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        PaymentEvent::PaymentDeclined(PaymentDeclinedData {
            reason: reason.into(),
            declined_at: Utc::now(),
        })
    }
}
