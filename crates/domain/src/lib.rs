//! Domain layer for the order management service.
//!
//! This crate provides:
//! - The Order aggregate with its Open/Closed state machine and derived total
//! - The product catalog
//! - Registered users and CPF validation
//! - Repository ports and an in-memory implementation
//! - `OrderService` and `ProductService`, the operations the API exposes

pub mod catalog;
pub mod error;
pub mod memory;
pub mod order;
pub mod repository;
pub mod user;

pub use catalog::{CatalogError, Product, ProductService};
pub use error::{DomainError, ErrorKind, repository_kind};
pub use memory::InMemoryStore;
pub use order::{
    Money, Order, OrderError, OrderFilter, OrderItem, OrderService, OrderStatus,
    UnknownOrderStatus, order_total,
};
pub use repository::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
pub use user::{User, is_valid_cpf, normalize_cpf};
