//! Catalog types: products and reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petshop_core::{PetType, ProductId, ReviewId};

/// A product as stored in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub brand: Option<String>,
    pub stock: i32,
    pub pet_type: Option<PetType>,
    pub image_urls: Vec<String>,
    /// Unit weight; `None` means the shipping default applies.
    pub weight_kg: Option<Decimal>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// First image, used as the thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// A product with its review summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    /// Mean rating rounded to one decimal place, `None` without reviews.
    pub average_rating: Option<Decimal>,
    pub review_count: i64,
}

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
