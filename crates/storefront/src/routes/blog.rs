//! Published blog posts.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::content::RenderedPost;
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{BlogPost, Page, Pagination};
use crate::state::AppState;

const POSTS_PER_PAGE: u32 = 9;
const MAX_POSTS_PER_PAGE: u32 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/blog", get(list_posts))
        .route("/api/blog/{slug}", get(show_post))
}

#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Page<BlogPost>>> {
    let pagination = Pagination::new(query.page, query.per_page, POSTS_PER_PAGE, MAX_POSTS_PER_PAGE);
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let page = BlogRepository::new(state.pool())
        .list_published(category, tag, pagination)
        .await?;
    Ok(Json(page))
}

async fn show_post(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<RenderedPost>> {
    let post = BlogRepository::new(state.pool())
        .published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;
    Ok(Json(RenderedPost::new(post)))
}
