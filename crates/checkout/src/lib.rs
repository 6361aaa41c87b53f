//! Storefront checkout services.
//!
//! Each service wraps one customer- or admin-facing operation over the
//! domain aggregates:
//! - [`CartService`] edits carts
//! - [`CouponService`] creates coupons and previews them against carts
//! - [`CheckoutService`] turns a cart into an order with a pending payment
//! - [`PaymentConfirmationService`] settles payments and takes stock
//! - [`ShipmentRegistrar`] ships paid orders
//! - [`OrderService`] reads orders and applies admin status changes
//!
//! Writes that lose an optimistic-concurrency race are re-run under a
//! [`RetryPolicy`]. Emails are queued after the commit through [`Notifier`].

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod confirmation;
pub mod coupons;
pub mod error;
pub mod fulfillment;
pub mod notifications;
pub mod orders;
pub mod retry;
pub mod services;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::{CheckoutService, PAYMENT_PROVIDER};
pub use confirmation::{PaymentConfirmationService, PaymentOutcome};
pub use coupons::CouponService;
pub use error::{CheckoutError, Result};
pub use fulfillment::ShipmentRegistrar;
pub use notifications::Notifier;
pub use orders::OrderService;
pub use retry::RetryPolicy;
pub use services::{
    Address, AddressBook, Email, InMemoryAddressBook, InMemoryMailer, InMemoryUserDirectory,
    LogMailer, MailError, Mailer, NewAddress, UserDirectory,
};
