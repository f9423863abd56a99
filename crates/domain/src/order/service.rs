//! Order lifecycle service.

use chrono::Utc;
use common::{OrderId, ProductId};

use super::{Order, OrderError, OrderFilter, OrderStatus};
use crate::error::DomainError;
use crate::repository::{OrderRepository, ProductRepository};

/// Service for managing orders.
///
/// Every mutation is one load, one in-memory change on the aggregate, and one
/// persist call. If the aggregate rejects the change nothing is written.
pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: OrderRepository + ProductRepository,
{
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a new open order with no items.
    #[tracing::instrument(skip(self))]
    pub async fn start_order(&self) -> Result<Order, DomainError> {
        let order = self.store.add_order(Order::start(Utc::now())).await?;
        metrics::counter!("orders_started_total").increment(1);
        tracing::info!(order_id = %order.id(), "order started");
        Ok(order)
    }

    /// Adds `quantity` units of a product to an open order.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Order, DomainError> {
        let mut order = self.load(order_id).await?;
        order.ensure_open()?;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(OrderError::ProductNotFound(product_id))?;

        order.add_product(&product, quantity, Utc::now())?;
        let order = self.store.update_order(order).await?;

        metrics::counter!("order_items_added_total").increment(1);
        tracing::info!(total = %order.total(), "product added to order");
        Ok(order)
    }

    /// Soft-deletes the line for a product on an open order.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Order, DomainError> {
        let mut order = self.load(order_id).await?;
        order.remove_product(product_id, Utc::now())?;
        let order = self.store.update_order(order).await?;

        metrics::counter!("order_items_removed_total").increment(1);
        tracing::info!(total = %order.total(), "product removed from order");
        Ok(order)
    }

    /// Closes an order that has at least one live item.
    #[tracing::instrument(skip(self))]
    pub async fn close_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let mut order = self.load(order_id).await?;
        order.close(Utc::now())?;
        let order = self.store.update_order(order).await?;

        metrics::counter!("orders_closed_total").increment(1);
        tracing::info!(total = %order.total(), "order closed");
        Ok(order)
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// Lists orders, optionally restricted to one status.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        let orders = match status {
            Some(status) => self.store.orders_by_status(status).await?,
            None => self.store.list_orders().await?,
        };
        Ok(orders)
    }

    /// Lists orders matching every criterion of the filter.
    #[tracing::instrument(skip(self))]
    pub async fn query_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.query_orders(&filter).await?)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id).into())
    }
}
