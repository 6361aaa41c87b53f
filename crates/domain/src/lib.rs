//! Storefront domain model.
//!
//! Event-sourced aggregates for the checkout and fulfillment lifecycle:
//! - [`Cart`], [`Coupon`], [`Product`], [`Order`], [`Payment`] and [`Shipment`]
//! - the coupon validator shared by cart previews and checkout
//! - [`CommandHandler`] for single-aggregate commands
//! - [`UnitOfWork`] for atomic writes spanning several aggregates

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod command;
pub mod coupon;
pub mod error;
pub mod order;
pub mod payment;
pub mod shipment;
pub mod unit_of_work;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use cart::{Cart, CartError, CartEvent};
pub use catalog::{Product, ProductError, ProductEvent};
pub use command::{CommandHandler, CommandResult, load_aggregate};
pub use coupon::{
    Coupon, CouponError, CouponEvent, CouponRejection, Discount, NewCoupon, Quote,
    normalize_code, validate as validate_coupon,
};
pub use error::DomainError;
pub use order::{
    Order, OrderError, OrderEvent, OrderStatus, PaymentStatus, PlaceOrder, UnknownStatus,
};
pub use payment::{Payment, PaymentError, PaymentEvent, TransactionStatus};
pub use shipment::{Shipment, ShipmentError, ShipmentEvent, ShipmentStatus};
pub use unit_of_work::UnitOfWork;
pub use value_objects::{AddressId, CustomerId, LineItem, Money, ProductId};
