//! Product catalog service.

use chrono::Utc;
use common::ProductId;

use super::{CatalogError, Product};
use crate::error::DomainError;
use crate::order::Money;
use crate::repository::ProductRepository;

/// Service for managing catalog products.
pub struct ProductService<S: ProductRepository> {
    store: S,
}

impl<S: ProductRepository> ProductService<S> {
    /// Creates a new product service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a product.
    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, name: String, price: Money) -> Result<Product, DomainError> {
        let product = self
            .store
            .add_product(Product::new(name, price, Utc::now()))
            .await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Updates a product's name and price.
    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        name: String,
        price: Money,
    ) -> Result<Product, DomainError> {
        let mut product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;

        product.name = name;
        product.price = price;
        product.updated_at = Utc::now();

        Ok(self.store.update_product(product).await?)
    }

    /// Soft-deletes a product. Returns false if it did not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<bool, DomainError> {
        let deleted = self.store.delete_product(product_id).await?;
        if deleted {
            tracing::info!(%product_id, "product deleted");
        }
        Ok(deleted)
    }

    /// Loads a product by ID.
    ///
    /// Returns None if the product doesn't exist or was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, DomainError> {
        Ok(self.store.get_product(product_id).await?)
    }

    /// Lists every live product.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }
}
