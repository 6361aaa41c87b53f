//! Shared types for the storefront workspace.

mod types;

pub use types::AggregateId;
