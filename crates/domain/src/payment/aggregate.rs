//! Payment aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::aggregate::Aggregate;

use super::{PaymentError, PaymentEvent, events::PaymentInitiatedData};

/// Status of a payment transaction at the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payment attached to an order.
///
/// Settles exactly once: from `Pending` to either `Success` or `Failed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    order_id: Option<AggregateId>,
    provider: String,
    provider_transaction_id: Option<String>,
    amount: Money,
    status: TransactionStatus,
    failure_reason: Option<String>,
    created_at: Option<DateTime<Utc>>,
    settled_at: Option<DateTime<Utc>>,
}

impl Aggregate for Payment {
    type Event = PaymentEvent;
    type Error = PaymentError;

    fn aggregate_type() -> &'static str {
        "Payment"
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
            PaymentEvent::PaymentInitiated(data) => self.apply_initiated(data),
            PaymentEvent::PaymentSucceeded(data) => {
                self.status = TransactionStatus::Success;
                self.provider_transaction_id = Some(data.provider_transaction_id);
                self.settled_at = Some(data.succeeded_at);
            }
            PaymentEvent::PaymentDeclined(data) => {
                self.status = TransactionStatus::Failed;
                self.failure_reason = Some(data.reason);
                self.settled_at = Some(data.declined_at);
            }
        }
    }
}

// Query methods
impl Payment {
    /// Returns the stream id of an order's payment.
    pub fn id_for(order_id: AggregateId) -> AggregateId {
        AggregateId::derived(Self::aggregate_type(), &order_id.to_string())
    }

    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn provider_transaction_id(&self) -> Option<&str> {
        self.provider_transaction_id.as_deref()
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }
}

// Command methods (return events)
impl Payment {
    /// Opens a pending payment for an order.
    pub fn initiate(
        &self,
        order_id: AggregateId,
        provider: &str,
        amount: Money,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.exists() {
            return Err(PaymentError::AlreadyInitiated);
        }
        if amount.is_negative() {
            return Err(PaymentError::InvalidAmount {
                cents: amount.cents(),
            });
        }

        Ok(vec![PaymentEvent::initiated(
            Self::id_for(order_id),
            order_id,
            provider,
            amount,
        )])
    }

    /// Settles the payment as successful.
    pub fn succeed(
        &self,
        provider_transaction_id: impl Into<String>,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        self.ensure_pending()?;
        Ok(vec![PaymentEvent::succeeded(provider_transaction_id)])
    }

    /// Settles the payment as declined.
    pub fn decline(&self, reason: impl Into<String>) -> Result<Vec<PaymentEvent>, PaymentError> {
        self.ensure_pending()?;
        Ok(vec![PaymentEvent::declined(reason)])
    }
}

impl Payment {
    fn ensure_pending(&self) -> Result<(), PaymentError> {
        if !self.exists() {
            return Err(PaymentError::NotFound);
        }
        if self.status != TransactionStatus::Pending {
            return Err(PaymentError::AlreadySettled {
                status: self.status,
            });
        }
        Ok(())
    }

    fn apply_initiated(&mut self, data: PaymentInitiatedData) {
        self.id = Some(data.payment_id);
        self.order_id = Some(data.order_id);
        self.provider = data.provider;
        self.amount = data.amount;
        self.status = TransactionStatus::Pending;
        self.created_at = Some(data.initiated_at);
    }
}
