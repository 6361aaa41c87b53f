//! Payment record for an order.
//!
//! Each order has exactly one payment, created with it at checkout. The
//! payment's stream id is derived from the order id.

mod aggregate;
mod events;

pub use aggregate::{Payment, TransactionStatus};
pub use events::{PaymentDeclinedData, PaymentEvent, PaymentInitiatedData, PaymentSucceededData};

use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment not found")]
    NotFound,

    #[error("Payment already initiated for this order")]
    AlreadyInitiated,

    #[error("Invalid payment amount: {cents} cents")]
    InvalidAmount { cents: i64 },

    /// The payment already reached a terminal status.
    #[error("Payment already settled as {status}")]
    AlreadySettled { status: TransactionStatus },
}
