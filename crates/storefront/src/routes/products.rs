//! Catalog, categories and reviews.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use petshop_core::{PetType, ProductId};

use crate::db::products::{ProductFilter, ProductSort};
use crate::db::{ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Page, Pagination, Product, ProductDetail, Review};
use crate::state::AppState;

pub const DEFAULT_PER_PAGE: u32 = 12;
pub const MAX_PER_PAGE: u32 = 60;
const MAX_COMMENT_CHARS: usize = 2000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(product_detail))
        .route("/api/products/{id}/reviews", get(list_reviews).post(submit_review))
        .route("/api/categories", get(categories))
}

/// Query string of the catalog listing.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub pet_type: Option<PetType>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl CatalogQuery {
    fn filter(&self) -> Result<ProductFilter> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price cannot be greater than max_price".to_owned(),
            ));
        }
        Ok(ProductFilter {
            category: non_blank(self.category.as_deref()),
            brand: non_blank(self.brand.as_deref()),
            pet_type: self.pet_type,
            search: non_blank(self.search.as_deref()),
            min_price: self.min_price,
            max_price: self.max_price,
            include_inactive: false,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[tracing::instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Product>>> {
    let filter = query.filter()?;
    let pagination = Pagination::new(query.page, query.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);
    let page = ProductRepository::new(state.pool())
        .list(&filter, query.sort, pagination)
        .await?;
    Ok(Json(page))
}

#[tracing::instrument(skip(state))]
async fn product_detail(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let products = ProductRepository::new(state.pool());
    let product = products
        .get(id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let (average_rating, review_count) = products.rating_summary(id).await?;
    Ok(Json(ProductDetail {
        product,
        average_rating,
        review_count,
    }))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(ProductRepository::new(state.pool()).categories().await?))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(ReviewRepository::new(state.pool()).for_product(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
    /// Display name; defaults to the e-mail's local part.
    #[serde(default)]
    pub author: Option<String>,
}

impl ReviewBody {
    fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::BadRequest("rating must be between 1 and 5".to_owned()));
        }
        if self.comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "comment cannot exceed {MAX_COMMENT_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// Display name for a review: the given author, else the e-mail's local part.
fn review_author(given: Option<&str>, email: Option<&str>) -> String {
    non_blank(given)
        .or_else(|| email.and_then(|e| e.split('@').next()).and_then(|name| non_blank(Some(name))))
        .unwrap_or_else(|| "Cliente".to_owned())
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn submit_review(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ReviewBody>,
) -> Result<(StatusCode, Json<Review>)> {
    body.validate()?;
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let author = review_author(body.author.as_deref(), user.email.as_deref());
    let review = ReviewRepository::new(state.pool())
        .upsert(id, user.id, &author, body.rating, body.comment.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_review_rating_bounds() {
        for rating in [0, 6, -1] {
            let body = ReviewBody { rating, comment: String::new(), author: None };
            assert!(body.validate().is_err());
        }
        let body = ReviewBody { rating: 5, comment: "Ótima ração".to_owned(), author: None };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_review_comment_length_counts_chars() {
        let body = ReviewBody { rating: 4, comment: "ç".repeat(2000), author: None };
        assert!(body.validate().is_ok());
        let body = ReviewBody { rating: 4, comment: "a".repeat(2001), author: None };
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_review_author_fallbacks() {
        assert_eq!(review_author(Some(" Ana "), Some("x@y.com")), "Ana");
        assert_eq!(review_author(None, Some("bruno@example.com")), "bruno");
        assert_eq!(review_author(Some(""), None), "Cliente");
    }

    #[test]
    fn test_price_range_validated() {
        let query = CatalogQuery {
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(10, 0)),
            ..CatalogQuery::default()
        };
        assert!(query.filter().is_err());

        let query = CatalogQuery {
            category: Some("  ".to_owned()),
            search: Some(" ração ".to_owned()),
            ..CatalogQuery::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.search.as_deref(), Some("ração"));
        assert!(!filter.include_inactive);
    }
}
