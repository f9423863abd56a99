//! Persistence ports.
//!
//! Services depend on these traits only; `InMemoryStore` and the PostgreSQL
//! store in the `persistence` crate implement them. Every method performs a
//! single atomic write, so a cancelled call leaves stored state untouched.

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use thiserror::Error;

use crate::catalog::Product;
use crate::order::{Order, OrderFilter, OrderStatus};
use crate::user::User;

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The entity to update does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The stored version differs from the version the caller loaded.
    #[error("Concurrency conflict for {entity} {id}: expected version {expected}, found {actual}")]
    Conflict {
        entity: &'static str,
        id: String,
        expected: i64,
        actual: i64,
    },

    /// A unique key is already taken.
    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage for orders and their lines.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order with all of its lines, soft-deleted ones included.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads every order, oldest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Loads every order with the given status, oldest first.
    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Loads every order matching the filter, oldest first.
    async fn query_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Inserts a new order. The returned order carries version 1.
    async fn add_order(&self, order: Order) -> Result<Order>;

    /// Replaces a stored order and its lines.
    ///
    /// Fails with `Conflict` unless the stored version equals `order.version()`.
    /// The returned order carries the incremented version.
    async fn update_order(&self, order: Order) -> Result<Order>;
}

/// Storage for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Loads a live product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Loads every live product, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Inserts a new product.
    async fn add_product(&self, product: Product) -> Result<Product>;

    /// Overwrites name, price and `updated_at` of a live product.
    async fn update_product(&self, product: Product) -> Result<Product>;

    /// Soft-deletes a live product. Returns false if there was none.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;
}

/// Storage for registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Looks a user up by normalized CPF.
    async fn find_user_by_cpf(&self, cpf: &str) -> Result<Option<User>>;

    /// Inserts a new user. Fails with `Duplicate` if the CPF is taken.
    async fn add_user(&self, user: User) -> Result<User>;

    /// Overwrites a stored user.
    async fn update_user(&self, user: User) -> Result<User>;
}
