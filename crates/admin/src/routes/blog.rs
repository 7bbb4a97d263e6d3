//! Blog authoring.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use petshop_core::BlogPostId;
use petshop_storefront::db::BlogRepository;
use petshop_storefront::db::blog::BlogPostInput;
use petshop_storefront::error::{AppError, Result};
use petshop_storefront::models::BlogPost;

use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/blog-posts", get(list).post(create))
        .route("/api/blog-posts/{id}", put(update).delete(remove))
}

/// Drafts included.
async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(BlogRepository::new(state.pool()).list_all().await?))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Json(input): Json<BlogPostInput>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let post = BlogRepository::new(state.pool()).create(&input).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<BlogPostId>,
    Json(input): Json<BlogPostInput>,
) -> Result<Json<BlogPost>> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    Ok(Json(BlogRepository::new(state.pool()).update(id, &input).await?))
}

#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
async fn remove(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<BlogPostId>,
) -> Result<StatusCode> {
    BlogRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
