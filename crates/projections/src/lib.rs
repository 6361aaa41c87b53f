//! Read models for the storefront query side.
//!
//! - [`Projection`] turns stored events into a read model
//! - [`ReadModel`] exposes a view for queries
//! - [`ProjectionProcessor`] feeds stored events to projections
//! - [`OrderSummariesView`] lists orders per customer and for administrators
//! - [`CouponsView`] lists coupons with their usage

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{CouponSummary, CouponsView, OrderSummariesView, OrderSummary};
