use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::catalog::Product;
use crate::order::{Order, OrderFilter, OrderStatus};
use crate::repository::{
    OrderRepository, ProductRepository, RepositoryError, Result, UserRepository,
};
use crate::user::User;

/// In-memory store implementing every repository port.
///
/// Used by tests and when no database is configured. Each write replaces a
/// whole record under one lock, so it is applied entirely or not at all.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    async fn collect_orders(&self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        let store = self.orders.read().await;
        let mut orders: Vec<_> = store.values().filter(|o| predicate(o)).cloned().collect();
        orders.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then(a.id().cmp(&b.id()))
        });
        orders
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.collect_orders(|_| true).await)
    }

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        Ok(self.collect_orders(|o| o.status() == status).await)
    }

    async fn query_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        Ok(self.collect_orders(|o| filter.matches(o)).await)
    }

    async fn add_order(&self, order: Order) -> Result<Order> {
        let updated_at = order.updated_at();
        let order = order.stamped(1, updated_at);
        self.orders.write().await.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn update_order(&self, order: Order) -> Result<Order> {
        let mut store = self.orders.write().await;

        let current = store
            .get(&order.id())
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Order",
                id: order.id().to_string(),
            })?;

        if current.version() != order.version() {
            return Err(RepositoryError::Conflict {
                entity: "Order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: current.version(),
            });
        }

        let next_version = order.version() + 1;
        let order = order.stamped(next_version, Utc::now());
        store.insert(order.id(), order.clone());
        Ok(order)
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .get(&id)
            .filter(|p| p.is_active())
            .cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let store = self.products.read().await;
        let mut products: Vec<_> = store.values().filter(|p| p.is_active()).cloned().collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn add_product(&self, product: Product) -> Result<Product> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        let mut store = self.products.write().await;
        let existing = store
            .get_mut(&product.id)
            .filter(|p| p.is_active())
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Product",
                id: product.id.to_string(),
            })?;

        existing.name = product.name;
        existing.price = product.price;
        existing.updated_at = product.updated_at;
        Ok(existing.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut store = self.products.write().await;
        match store.get_mut(&id).filter(|p| p.is_active()) {
            Some(product) => {
                product.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_cpf(&self, cpf: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.cpf == cpf)
            .cloned())
    }

    async fn add_user(&self, user: User) -> Result<User> {
        let mut store = self.users.write().await;
        if store.values().any(|u| u.cpf == user.cpf) {
            return Err(RepositoryError::Duplicate {
                entity: "User",
                key: user.cpf,
            });
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> Result<User> {
        let mut store = self.users.write().await;
        if !store.contains_key(&user.id) {
            return Err(RepositoryError::NotFound {
                entity: "User",
                id: user.id.to_string(),
            });
        }
        user.updated_at = Utc::now();
        store.insert(user.id, user.clone());
        Ok(user)
    }
}
