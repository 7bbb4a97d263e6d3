//! Cart repository.
//!
//! A cart is the set of `cart_item` rows of one user. Lines are always read
//! joined with the product so prices are current.

use rust_decimal::Decimal;
use sqlx::PgPool;

use petshop_core::cart::{Cart, CartLine};
use petshop_core::{ProductId, UserId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    name: String,
    unit_price: Decimal,
    quantity: i32,
    image_url: Option<String>,
    weight_kg: Option<Decimal>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative cart quantity for product {}",
                row.product_id
            ))
        })?;
        Ok(Self {
            product_id: row.product_id,
            name: row.name,
            unit_price: row.unit_price,
            quantity,
            image_url: row.image_url,
            weight_kg: row.weight_kg,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart, priced at current product prices.
    ///
    /// Lines for deactivated products are left out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.product_id, p.name, p.price AS unit_price, c.quantity,
                   p.image_urls[1] AS image_url, p.weight_kg
            FROM petshop.cart_item c
            JOIN petshop.product p ON p.id = c.product_id
            WHERE c.user_id = $1 AND p.active
            ORDER BY c.created_at, c.product_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Cart::new(lines))
    }

    /// Quantity of a product currently in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<i32>, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM petshop.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(quantity)
    }

    /// Add units of a product, incrementing an existing line.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        let total = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO petshop.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = petshop.cart_item.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }

    /// Set a line's quantity; zero deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        if quantity <= 0 {
            return self.remove(user_id, product_id).await;
        }
        let result = sqlx::query(
            r"
            UPDATE petshop.cart_item SET quantity = $3, updated_at = NOW()
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM petshop.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
