//! Product repository for store operations.

use chrono::{DateTime, Utc};

use vitrine_core::ProductId;

use super::{Store, StoreError};
use crate::models::{Product, ProductInput};

/// Repository for the `products` collection.
pub struct ProductRepository<'a> {
    store: &'a Store,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get a product by its ID.
    pub async fn get_by_id(&self, id: ProductId) -> Option<Product> {
        self.store.find(id).await
    }

    /// All products, in stored order.
    pub async fn list(&self) -> Vec<Product> {
        self.store.list().await
    }

    /// Insert a new product stamped with `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be written.
    pub async fn create(
        &self,
        input: ProductInput,
        created_at: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let product = self
            .store
            .insert(|id| Product::create(id, input, created_at))
            .await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Write back a merged product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product disappeared meanwhile.
    /// Returns `StoreError` if the store cannot be written.
    pub async fn assign(&self, product: Product) -> Result<Product, StoreError> {
        let product = self.store.assign(product).await?;
        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such product.
    /// Returns `StoreError` if the store cannot be written.
    pub async fn delete(&self, id: ProductId) -> Result<Product, StoreError> {
        let product = self.store.remove::<Product>(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(product)
    }
}
