//! Blog post rendering.
//!
//! Posts are stored as markdown and rendered on read with GitHub Flavored
//! Markdown extensions. Raw HTML in a post is escaped.

use comrak::{Options, markdown_to_html};
use serde::Serialize;

use crate::models::BlogPost;

/// Average reading speed used for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// A post ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    #[serde(flatten)]
    pub post: BlogPost,
    pub html: String,
    pub reading_time_minutes: u32,
}

impl RenderedPost {
    #[must_use]
    pub fn new(post: BlogPost) -> Self {
        let html = render_markdown(&post.content);
        let reading_time_minutes = reading_time(&post.content);
        Self {
            post,
            html,
            reading_time_minutes,
        }
    }
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    markdown_to_html(content, &options)
}

/// Minutes to read `content`, at least one.
#[must_use]
pub fn reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time_rounds_up_with_minimum() {
        assert_eq!(reading_time(""), 1);
        assert_eq!(reading_time("um dois três"), 1);
        assert_eq!(reading_time(&"palavra ".repeat(200)), 1);
        assert_eq!(reading_time(&"palavra ".repeat(201)), 2);
        assert_eq!(reading_time(&"palavra ".repeat(1000)), 5);
    }

    #[test]
    fn test_gfm_extensions() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~ https://example.com");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<a href=\"https://example.com\">"));
    }

    #[test]
    fn test_raw_html_is_not_passed_through() {
        let html = render_markdown("<script>alert(1)</script>\n\nHello");
        assert!(!html.contains("<script>"));
        assert!(html.contains("<p>Hello</p>"));
    }
}
