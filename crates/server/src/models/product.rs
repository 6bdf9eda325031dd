//! Product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{Price, ProductId};

/// A product as stored in the `products` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned ID, immutable once assigned.
    pub id: ProductId,
    /// Display name (at least 2 characters).
    pub name: String,
    /// Unit price, always greater than zero.
    pub price: Price,
    /// Long description (at least 10 characters).
    pub description: String,
    /// Filename of the uploaded image, relative to the upload directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// When the product was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the product was last replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated product fields from a create or replace request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub image: Option<String>,
}

impl Product {
    /// Build a new record from validated input.
    #[must_use]
    pub fn create(id: ProductId, input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            price: input.price,
            description: input.description,
            image: input.image,
            created_at: Some(now),
            updated_at: None,
        }
    }

    /// Merge validated input over this record.
    ///
    /// Every validated field replaces the stored one; the image is only
    /// replaced when the request carried one. `id` and `created_at` are kept.
    #[must_use]
    pub fn merge(self, input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            name: input.name,
            price: input.price,
            description: input.description,
            image: input.image.or(self.image),
            created_at: self.created_at,
            updated_at: Some(now),
        }
    }
}
