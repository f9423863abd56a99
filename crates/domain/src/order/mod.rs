//! Order aggregate and related types.

mod aggregate;
mod query;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use query::OrderFilter;
pub use service::OrderService;
pub use state::{OrderStatus, UnknownOrderStatus};
pub use value_objects::{Money, OrderItem, checked_order_total, order_total};

use common::{OrderId, ProductId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product to add does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order has no live line for the product.
    #[error("Product {product_id} is not in order {order_id}")]
    ItemNotFound {
        order_id: OrderId,
        product_id: ProductId,
    },

    /// Items cannot change once an order is closed.
    #[error("Order {0} is closed and cannot be modified")]
    OrderClosed(OrderId),

    /// An order without live items cannot be closed.
    #[error("Order {0} has no items and cannot be closed")]
    EmptyOrder(OrderId),

    /// The order was already closed.
    #[error("Order {0} is already closed")]
    AlreadyClosed(OrderId),

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The order total would no longer fit in `i64` cents.
    #[error("Order {0} total would exceed the maximum amount")]
    TotalOverflow(OrderId),
}

impl OrderError {
    /// Classifies the error for callers that map it onto a transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::OrderNotFound(_)
            | OrderError::ProductNotFound(_)
            | OrderError::ItemNotFound { .. } => ErrorKind::NotFound,
            OrderError::OrderClosed(_)
            | OrderError::EmptyOrder(_)
            | OrderError::AlreadyClosed(_) => ErrorKind::InvalidTransition,
            OrderError::InvalidQuantity { .. } | OrderError::TotalOverflow(_) => {
                ErrorKind::Validation
            }
        }
    }
}
