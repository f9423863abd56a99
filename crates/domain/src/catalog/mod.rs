//! Product catalog.

mod service;

pub use service::ProductService;

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::order::Money;

/// A product that can be added to orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; deleted products are invisible to lookups.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Creates a new catalog product.
    pub fn new(name: impl Into<String>, price: Money, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Returns true unless the product has been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
}

impl CatalogError {
    /// Classifies the error for callers that map it onto a transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ProductNotFound(_) => ErrorKind::NotFound,
        }
    }
}
