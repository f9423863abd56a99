//! Shared types for the order management service.

pub mod types;

pub use types::{OrderId, OrderItemId, ProductId, UserId};
