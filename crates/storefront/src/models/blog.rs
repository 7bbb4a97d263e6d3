//! Blog posts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petshop_core::BlogPostId;

/// A blog post; `content` is markdown.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
