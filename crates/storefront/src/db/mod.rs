//! Database operations for the pet shop `PostgreSQL` schema.
//!
//! # Schema: `petshop`
//!
//! - `product`, `favorite`, `product_review` - Catalog
//! - `cart_item` - One row per (user, product)
//! - `customer_order`, `order_item` - Orders
//! - `client`, `pet`, `service`, `appointment` - Booking
//! - `shipping_rate` - CEP rate bands
//! - `blog_post` - Blog
//! - `admin_user_role` - Back-office access
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` models);
//! dynamic filters use [`sqlx::QueryBuilder`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p petshop-cli -- migrate
//! ```

pub mod admin_roles;
pub mod appointments;
pub mod blog;
pub mod cart;
pub mod clients;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod services;
pub mod shipping;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_roles::AdminRoleRepository;
pub use appointments::AppointmentRepository;
pub use blog::BlogRepository;
pub use cart::CartRepository;
pub use clients::ClientRepository;
pub use favorites::FavoriteRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use services::ServiceRepository;
pub use shipping::ShippingRateRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., slot already booked).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
