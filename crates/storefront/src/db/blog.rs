//! Blog post repository.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use petshop_core::BlogPostId;

use super::RepositoryError;
use crate::models::{BlogPost, Page, Pagination};

const POST_COLUMNS: &str =
    "id, title, slug, summary, content, category, tags, author, published, created_at, updated_at";

/// Input for creating or updating a post.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogPostInput {
    pub title: String,
    /// Generated from the title when absent or blank.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl BlogPostInput {
    /// Check required fields and settle the slug.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for a blank title or an unusable slug.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.title = self.title.trim().to_owned();
        if self.title.is_empty() {
            return Err("title is required".to_owned());
        }
        let source = match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_owned(),
            _ => self.title.clone(),
        };
        let slug = slugify(&source);
        if slug.is_empty() {
            return Err("slug must contain letters or digits".to_owned());
        }
        self.slug = Some(slug);
        self.tags = self
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        Ok(self)
    }

    fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.title))
    }
}

/// Lowercase ASCII slug: accents folded, anything else collapsed into `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Repository for blog posts.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first, optionally by category and/or tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_published(
        &self,
        category: Option<&str>,
        tag: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<BlogPost>, RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM petshop.blog_post WHERE published");
        push_filters(&mut count, category, tag);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {POST_COLUMNS} FROM petshop.blog_post WHERE published"
        ));
        push_filters(&mut query, category, tag);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let posts = query.build_query_as::<BlogPost>().fetch_all(self.pool).await?;

        Ok(Page::new(posts, total, pagination.page, pagination.per_page))
    }

    /// A published post by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM petshop.blog_post WHERE slug = $1 AND published"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(post)
    }

    /// Every post, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM petshop.blog_post ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(posts)
    }

    /// Create a post. `input` should already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &BlogPostInput) -> Result<BlogPost, RepositoryError> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r"
            INSERT INTO petshop.blog_post
                (title, slug, summary, content, category, tags, author, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(input.slug())
        .bind(&input.summary)
        .bind(&input.content)
        .bind(&input.category)
        .bind(&input.tags)
        .bind(&input.author)
        .bind(input.published)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a post with this slug already exists"))
    }

    /// Replace a post's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(&self, id: BlogPostId, input: &BlogPostInput) -> Result<BlogPost, RepositoryError> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r"
            UPDATE petshop.blog_post
            SET title = $2, slug = $3, summary = $4, content = $5, category = $6,
                tags = $7, author = $8, published = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(input.slug())
        .bind(&input.summary)
        .bind(&input.content)
        .bind(&input.category)
        .bind(&input.tags)
        .bind(&input.author)
        .bind(input.published)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a post with this slug already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id.
    pub async fn delete(&self, id: BlogPostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM petshop.blog_post WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, category: Option<&str>, tag: Option<&str>) {
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category.to_owned());
    }
    if let Some(tag) = tag {
        qb.push(" AND ")
            .push_bind(tag.to_lowercase())
            .push(" = ANY(tags)");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(title: &str, slug: Option<&str>) -> BlogPostInput {
        BlogPostInput {
            title: title.to_owned(),
            slug: slug.map(str::to_owned),
            summary: String::new(),
            content: "# Hi".to_owned(),
            category: None,
            tags: vec![" Cães ".to_owned(), String::new()],
            author: None,
            published: true,
        }
    }

    #[test]
    fn test_slugify_folds_accents_and_punctuation() {
        assert_eq!(slugify("Como dar banho no seu cão?"), "como-dar-banho-no-seu-cao");
        assert_eq!(slugify("  Ração -- Premium!! "), "racao-premium");
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn test_slug_generated_from_title_when_absent() {
        let post = input("Vacinas em Filhotes", None).normalized().unwrap();
        assert_eq!(post.slug.as_deref(), Some("vacinas-em-filhotes"));
        assert_eq!(post.tags, vec!["cães".to_owned()]);
    }

    #[test]
    fn test_explicit_slug_is_cleaned() {
        let post = input("Whatever", Some("My Custom Slug")).normalized().unwrap();
        assert_eq!(post.slug.as_deref(), Some("my-custom-slug"));
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(input("   ", None).normalized().is_err());
        assert!(input("Ok", Some("***")).normalized().is_err());
    }

    #[test]
    fn test_tag_filter_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE published");
        push_filters(&mut qb, Some("saude"), Some("Gatos"));
        assert_eq!(
            qb.sql(),
            "SELECT 1 WHERE published AND category = $1 AND $2 = ANY(tags)"
        );
    }
}
