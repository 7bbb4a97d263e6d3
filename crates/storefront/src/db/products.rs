//! Product repository.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use petshop_core::{PetType, ProductId};

use super::RepositoryError;
use crate::models::{Page, Pagination, Product};

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, brand, stock, pet_type, \
     image_urls, weight_kg, active, created_at, updated_at";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id ASC",
            Self::Name => "name ASC, id ASC",
        }
    }
}

/// Filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub pet_type: Option<PetType>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Back-office listings include deactivated products.
    pub include_inactive: bool,
}

/// Fields of a product as edited in the back office.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub pet_type: Option<PetType>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl ProductInput {
    /// Check the fields a product cannot be saved without.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("category is required".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("price cannot be negative".to_string());
        }
        if self.stock < 0 {
            return Err("stock cannot be negative".to_string());
        }
        if self.weight_kg.is_some_and(|w| w.is_sign_negative()) {
            return Err("weight cannot be negative".to_string());
        }
        Ok(())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if !filter.include_inactive {
        qb.push(" AND active");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(brand) = &filter.brand {
        qb.push(" AND brand = ").push_bind(brand.clone());
    }
    if let Some(pet_type) = filter.pet_type {
        qb.push(" AND pet_type = ").push_bind(pet_type);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        pagination: Pagination,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM petshop.product WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM petshop.product WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let items = query.build_query_as::<Product>().fetch_all(self.pool).await?;

        Ok(Page::new(items, total, pagination.page, pagination.per_page))
    }

    /// Get a product by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM petshop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Average rating (one decimal place) and number of reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rating_summary(
        &self,
        id: ProductId,
    ) -> Result<(Option<Decimal>, i64), RepositoryError> {
        let summary = sqlx::query_as::<_, (Option<Decimal>, i64)>(
            r"
            SELECT ROUND(AVG(rating)::numeric, 1), COUNT(*)
            FROM petshop.product_review
            WHERE product_id = $1
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(summary)
    }

    /// Distinct categories of active products, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM petshop.product WHERE active ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Active products at or below `threshold` units.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM petshop.product \
             WHERE active AND stock <= $1 ORDER BY stock, name"
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO petshop.product
                (name, description, price, category, brand, stock, pet_type,
                 image_urls, weight_kg, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category.trim())
        .bind(&input.brand)
        .bind(input.stock)
        .bind(input.pet_type)
        .bind(&input.image_urls)
        .bind(input.weight_kg)
        .bind(input.active)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE petshop.product
            SET name = $2, description = $3, price = $4, category = $5, brand = $6,
                stock = $7, pet_type = $8, image_urls = $9, weight_kg = $10,
                active = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category.trim())
        .bind(&input.brand)
        .bind(input.stock)
        .bind(input.pet_type)
        .bind(&input.image_urls)
        .bind(input.weight_kg)
        .bind(input.active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Activate or deactivate a product. Deactivated products disappear from
    /// the storefront but stay referenced by past orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_active(&self, id: ProductId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE petshop.product SET active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set the stock count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock(&self, id: ProductId, stock: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE petshop.product SET stock = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(stock)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("ração"), "ração");
    }

    #[test]
    fn test_filters_build_sql() {
        let filter = ProductFilter {
            category: Some("food".to_string()),
            pet_type: Some(PetType::Cat),
            search: Some("  salmon ".to_string()),
            min_price: Some(Decimal::ONE),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM petshop.product WHERE TRUE");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM petshop.product WHERE TRUE AND active AND category = $1 \
             AND pet_type = $2 AND (name ILIKE $3 OR description ILIKE $4) AND price >= $5"
        );
    }

    #[test]
    fn test_product_input_validation() {
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Ração Premium",
            "price": "89.90",
            "category": "food",
        }))
        .unwrap();
        assert!(input.active);
        assert!(input.validate().is_ok());

        let negative = ProductInput {
            price: Decimal::NEGATIVE_ONE,
            ..input
        };
        assert_eq!(negative.validate(), Err("price cannot be negative".to_string()));
    }
}
