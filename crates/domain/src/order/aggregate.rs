//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderItem, OrderStatus, checked_order_total, order_total};
use crate::catalog::Product;

/// Order aggregate root.
///
/// Owns its lines exclusively. The total is never stored; it is derived from
/// the live lines every time it is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Current status of the order.
    status: OrderStatus,

    /// Every line ever created on this order, including soft-deleted ones.
    items: Vec<OrderItem>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    /// Set exactly once, when the order is closed.
    closed_at: Option<DateTime<Utc>>,

    /// Version for optimistic concurrency. Zero until first persisted.
    version: i64,
}

impl Order {
    /// Starts a new, empty, open order.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            status: OrderStatus::Open,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            closed_at: None,
            version: 0,
        }
    }

    /// Rebuilds an order from stored state.
    pub fn restore(
        id: OrderId,
        status: OrderStatus,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        closed_at: Option<DateTime<Utc>>,
        version: i64,
    ) -> Self {
        Self {
            id,
            status,
            items,
            created_at,
            updated_at,
            closed_at,
            version,
        }
    }

    /// Returns a copy stamped with the version and update time the store assigned.
    pub fn stamped(mut self, version: i64, updated_at: DateTime<Utc>) -> Self {
        self.version = version;
        self.updated_at = updated_at;
        self
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the live (non-deleted) items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|item| item.is_active())
    }

    /// Returns every item, soft-deleted ones included.
    pub fn all_items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the live item for a product, if any.
    pub fn get_item(&self, product_id: ProductId) -> Option<&OrderItem> {
        self.items().find(|item| item.product_id == product_id)
    }

    /// Returns the number of live items.
    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    /// Returns true if the order has live items.
    pub fn has_items(&self) -> bool {
        self.items().next().is_some()
    }

    /// Returns the sum of price * quantity over live items.
    pub fn total(&self) -> Money {
        order_total(&self.items)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods
impl Order {
    /// Fails with `OrderClosed` unless items may still change.
    pub fn ensure_open(&self) -> Result<(), OrderError> {
        if self.status.can_modify_items() {
            Ok(())
        } else {
            Err(OrderError::OrderClosed(self.id))
        }
    }

    /// Adds `quantity` units of a product.
    ///
    /// If a live line for the product exists its quantity grows, otherwise a
    /// new line snapshots the product's current name and price. A change that
    /// would push the total past `i64` cents is rejected and leaves the order as it was.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.ensure_open()?;

        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        let existing = self
            .items
            .iter()
            .position(|item| item.is_active() && item.product_id == product.id);

        match existing {
            Some(index) => {
                let item = &mut self.items[index];
                let previous = item.quantity;
                item.quantity = previous
                    .checked_add(quantity)
                    .ok_or(OrderError::InvalidQuantity { quantity })?;

                if checked_order_total(&self.items).is_none() {
                    self.items[index].quantity = previous;
                    return Err(OrderError::TotalOverflow(self.id));
                }
            }
            None => {
                self.items.push(OrderItem::new(
                    product.id,
                    product.name.clone(),
                    product.price,
                    quantity,
                    now,
                ));

                if checked_order_total(&self.items).is_none() {
                    self.items.pop();
                    return Err(OrderError::TotalOverflow(self.id));
                }
            }
        }

        Ok(())
    }

    /// Soft-deletes the live line for a product.
    pub fn remove_product(
        &mut self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.ensure_open()?;

        let order_id = self.id;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.is_active() && item.product_id == product_id)
            .ok_or(OrderError::ItemNotFound {
                order_id,
                product_id,
            })?;

        item.deleted_at = Some(now);
        Ok(())
    }

    /// Closes the order.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_close() {
            return Err(OrderError::AlreadyClosed(self.id));
        }

        if !self.has_items() {
            return Err(OrderError::EmptyOrder(self.id));
        }

        self.status = OrderStatus::Closed;
        self.closed_at = Some(now);
        Ok(())
    }
}
