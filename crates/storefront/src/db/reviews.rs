//! Product reviews.

use sqlx::PgPool;

use petshop_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Review;

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT id, product_id, author, rating, comment, created_at
            FROM petshop.product_review
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Write the user's review of a product, replacing an earlier one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        product_id: ProductId,
        user_id: UserId,
        author: &str,
        rating: i16,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            r"
            INSERT INTO petshop.product_review (product_id, user_id, author, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET author = EXCLUDED.author, rating = EXCLUDED.rating,
                          comment = EXCLUDED.comment, created_at = NOW()
            RETURNING id, product_id, author, rating, comment, created_at
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(author)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;
        Ok(review)
    }
}
