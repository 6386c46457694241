use super::AccountSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub summary: Option<String>,
    pub ai_summary: Option<String>,
    /// Set when `ai_summary` came back from the summarization model rather
    /// than the local fallback.
    pub ai_generated: bool,
    pub author_id: i64,
    pub is_published: bool,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub view_count: i64,
    pub tags: Option<String>,
    pub featured_image: Option<String>,
}

impl Post {
    pub fn tags_list(&self) -> Vec<String> {
        split_tags(self.tags.as_deref())
    }
}

pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    match tags {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub tag_list: Vec<String>,
    pub author: Option<AccountSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub view_count: i64,
    pub published_at: DateTime<Utc>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            view_count: post.view_count,
            published_at: post.published_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
    /// Ask the summarizer for an `ai_summary`. Consumed by the HTTP layer.
    #[serde(default)]
    pub generate_summary: bool,
}

fn default_published() -> bool {
    true
}

impl Default for PostInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            summary: None,
            tags: None,
            featured_image: None,
            is_published: true,
            generate_summary: false,
        }
    }
}

impl PostInput {
    /// Trim free-text fields and turn empty optionals into `None`.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            summary: non_empty(self.summary),
            tags: non_empty(self.tags),
            featured_image: non_empty(self.featured_image),
            is_published: self.is_published,
            generate_summary: self.generate_summary,
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Summary produced for a post, tagged by where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "text", rename_all = "lowercase")]
pub enum Summary {
    Model(String),
    Fallback(String),
}

impl Summary {
    pub fn text(&self) -> &str {
        match self {
            Self::Model(text) | Self::Fallback(text) => text,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: i64,
    pub pages: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: usize, per_page: usize, total: i64) -> Self {
        let per_page = per_page.max(1);
        let pages = (total.max(0) as usize).div_ceil(per_page);
        Self {
            items,
            page,
            per_page,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags_trims_and_drops_empty() {
        assert_eq!(
            split_tags(Some(" rust, web ,, ,sqlite")),
            vec!["rust", "web", "sqlite"]
        );
        assert!(split_tags(None).is_empty());
        assert!(split_tags(Some(" , ")).is_empty());
    }

    #[test]
    fn test_normalized_drops_blank_optionals() {
        let input = PostInput {
            title: "  Title here ".to_string(),
            content: "body".to_string(),
            summary: Some("   ".to_string()),
            tags: Some(" rust ".to_string()),
            featured_image: Some(String::new()),
            is_published: true,
            generate_summary: false,
        }
        .normalized();

        assert_eq!(input.title, "Title here");
        assert_eq!(input.summary, None);
        assert_eq!(input.tags.as_deref(), Some("rust"));
        assert_eq!(input.featured_image, None);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page: Page<i32> = Page::new(vec![], 1, 12, 25);
        assert_eq!(page.pages, 3);

        let empty: Page<i32> = Page::new(vec![], 1, 12, 0);
        assert_eq!(empty.pages, 0);
    }
}
