use crate::models::{AccountSummary, Page, Post, PostInput, PostWithAuthor, Summary};
use crate::services::accounts::{row_to_account, ACCOUNT_COLUMNS};
use crate::services::error::{is_unique_violation, ServiceError};
use crate::services::slug::{generate_slug, resolve_slug};
use crate::Database;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 300;
pub const MIN_CONTENT_LENGTH: usize = 100;
const MAX_TAGS_LENGTH: usize = 500;
const MAX_IMAGE_URL_LENGTH: usize = 500;

const POST_COLUMNS: &str = "id, title, slug, content, summary, ai_summary, ai_generated, author_id, is_published, published_at, updated_at, view_count, tags, featured_image";

pub fn validate_post(input: &PostInput) -> Result<(), ServiceError> {
    let title_len = input.title.chars().count();
    if title_len < MIN_TITLE_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Title must be at least {} characters",
            MIN_TITLE_LENGTH
        )));
    }
    if title_len > MAX_TITLE_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Title must be {} characters or less",
            MAX_TITLE_LENGTH
        )));
    }
    if input.content.chars().count() < MIN_CONTENT_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Post content must be at least {} characters",
            MIN_CONTENT_LENGTH
        )));
    }
    if let Some(tags) = &input.tags {
        if tags.len() > MAX_TAGS_LENGTH {
            return Err(ServiceError::invalid(format!(
                "Tags must be {} characters or less",
                MAX_TAGS_LENGTH
            )));
        }
    }
    if let Some(image) = &input.featured_image {
        let valid = image.len() <= MAX_IMAGE_URL_LENGTH
            && url::Url::parse(image)
                .map(|u| u.scheme() == "http" || u.scheme() == "https")
                .unwrap_or(false);
        if !valid {
            return Err(ServiceError::invalid(
                "Featured image must be an http(s) URL",
            ));
        }
    }
    Ok(())
}

/// Publish a new post. The slug comes from the title; on collision the
/// author's id is appended.
pub fn create_post(
    db: &Database,
    author_id: i64,
    input: PostInput,
    ai_summary: Option<Summary>,
) -> Result<Post> {
    let input = input.normalized();
    validate_post(&input)?;

    let conn = db.get()?;
    let base = generate_slug(&input.title);
    let slug = resolve_slug(&base, author_id, |candidate| slug_exists(&conn, candidate, None))?;

    let now = Utc::now();
    let (ai_text, ai_generated) = split_summary(ai_summary);

    let inserted = conn.execute(
        r#"
        INSERT INTO posts (title, slug, content, summary, ai_summary, ai_generated, author_id, is_published, published_at, updated_at, view_count, tags, featured_image)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
        rusqlite::params![
            input.title,
            slug,
            input.content,
            input.summary,
            ai_text,
            ai_generated,
            author_id,
            input.is_published,
            now,
            now,
            input.tags,
            input.featured_image,
        ],
    );
    map_slug_conflict(inserted, &slug)?;

    let id = conn.last_insert_rowid();
    tracing::info!("Post created: id={} slug={} author={}", id, slug, author_id);

    fetch_by_id(&conn, id)?.ok_or_else(|| ServiceError::NotFound("Post").into())
}

/// Edit a post addressed by its current slug. Only the author may edit.
/// A changed title re-derives the slug; a collision with another post
/// appends this post's id.
pub fn update_post(
    db: &Database,
    slug: &str,
    editor_id: i64,
    input: PostInput,
    ai_summary: Option<Summary>,
) -> Result<Post> {
    let conn = db.get()?;
    let current = owned_post(&conn, slug, editor_id)?;

    let input = input.normalized();
    validate_post(&input)?;

    let new_slug = if input.title == current.title {
        current.slug.clone()
    } else {
        let base = generate_slug(&input.title);
        resolve_slug(&base, current.id, |candidate| {
            slug_exists(&conn, candidate, Some(current.id))
        })?
    };

    let (ai_text, ai_generated) = match ai_summary {
        Some(summary) => split_summary(Some(summary)),
        None => (current.ai_summary.clone(), current.ai_generated),
    };

    let updated = conn.execute(
        r#"
        UPDATE posts SET title = ?, slug = ?, content = ?, summary = ?, ai_summary = ?, ai_generated = ?,
            is_published = ?, tags = ?, featured_image = ?, updated_at = ?
        WHERE id = ?
        "#,
        rusqlite::params![
            input.title,
            new_slug,
            input.content,
            input.summary,
            ai_text,
            ai_generated,
            input.is_published,
            input.tags,
            input.featured_image,
            Utc::now(),
            current.id,
        ],
    );
    map_slug_conflict(updated, &new_slug)?;

    if new_slug != current.slug {
        tracing::info!("Post {} re-slugged: {} -> {}", current.id, current.slug, new_slug);
    }

    fetch_by_id(&conn, current.id)?.ok_or_else(|| ServiceError::NotFound("Post").into())
}

pub fn delete_post(db: &Database, slug: &str, editor_id: i64) -> Result<()> {
    let conn = db.get()?;
    let post = owned_post(&conn, slug, editor_id)?;
    conn.execute("DELETE FROM posts WHERE id = ?", [post.id])?;
    tracing::info!("Post deleted: id={} slug={}", post.id, post.slug);
    Ok(())
}

/// Fetch a published post for reading and count the view.
///
/// The increment is a single `view_count = view_count + 1` statement, so
/// concurrent readers never lose updates.
pub fn view_post(db: &Database, slug: &str) -> Result<Option<PostWithAuthor>> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE posts SET view_count = view_count + 1 WHERE slug = ? AND is_published = 1",
        [slug],
    )?;
    if affected == 0 {
        return Ok(None);
    }

    match fetch_by_slug(&conn, slug)? {
        Some(post) => Ok(Some(with_author(&conn, post)?)),
        None => Ok(None),
    }
}

pub fn get_post_by_slug(db: &Database, slug: &str) -> Result<Option<Post>> {
    let conn = db.get()?;
    fetch_by_slug(&conn, slug)
}

pub fn get_post_by_id(db: &Database, id: i64) -> Result<Option<Post>> {
    let conn = db.get()?;
    fetch_by_id(&conn, id)
}

/// Published posts, newest first, optionally filtered by a
/// case-insensitive match on title or content.
pub fn list_published(
    db: &Database,
    query: Option<&str>,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithAuthor>> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let offset = (page - 1) * per_page;
    let pattern = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", escape_like(q)));

    let conn = db.get()?;
    let (total, posts) = match &pattern {
        Some(pattern) => {
            let filter = "is_published = 1 AND (title LIKE ?1 ESCAPE '\\' OR content LIKE ?1 ESCAPE '\\')";
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM posts WHERE {}", filter),
                [pattern],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM posts WHERE {} ORDER BY published_at DESC, id DESC LIMIT ?2 OFFSET ?3",
                POST_COLUMNS, filter
            ))?;
            let posts = stmt
                .query_map(rusqlite::params![pattern, per_page, offset], row_to_post)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, posts)
        }
        None => {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE is_published = 1",
                [],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM posts WHERE is_published = 1 ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
                POST_COLUMNS
            ))?;
            let posts = stmt
                .query_map(rusqlite::params![per_page, offset], row_to_post)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, posts)
        }
    };

    let items = posts
        .into_iter()
        .map(|p| with_author(&conn, p))
        .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, page, per_page, total))
}

pub fn list_recent(db: &Database, limit: usize) -> Result<Vec<PostWithAuthor>> {
    Ok(list_published(db, None, 1, limit)?.items)
}

/// An author's posts, newest first. `published_only` hides drafts.
pub fn list_by_author(
    db: &Database,
    author_id: i64,
    published_only: bool,
    limit: Option<usize>,
) -> Result<Vec<Post>> {
    let conn = db.get()?;
    let mut sql = format!("SELECT {} FROM posts WHERE author_id = ?1", POST_COLUMNS);
    if published_only {
        sql.push_str(" AND is_published = 1");
    }
    sql.push_str(" ORDER BY published_at DESC, id DESC LIMIT ?2");

    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(rusqlite::params![author_id, limit], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Every published post in id order; the snapshot platform statistics
/// are computed from.
pub fn list_all_published(db: &Database) -> Result<Vec<Post>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts WHERE is_published = 1 ORDER BY id ASC",
        POST_COLUMNS
    ))?;
    let posts = stmt
        .query_map([], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

fn owned_post(conn: &Connection, slug: &str, editor_id: i64) -> Result<Post> {
    let post = fetch_by_slug(conn, slug)?.ok_or(ServiceError::NotFound("Post"))?;
    if post.author_id != editor_id {
        tracing::warn!(
            "Account {} tried to modify post {} owned by {}",
            editor_id,
            post.id,
            post.author_id
        );
        return Err(ServiceError::Forbidden.into());
    }
    Ok(post)
}

fn slug_exists(conn: &Connection, slug: &str, except_id: Option<i64>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ?",
        rusqlite::params![slug, except_id.unwrap_or(0)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn split_summary(summary: Option<Summary>) -> (Option<String>, bool) {
    match summary {
        Some(Summary::Model(text)) => (Some(text), true),
        Some(Summary::Fallback(text)) => (Some(text), false),
        None => (None, false),
    }
}

fn map_slug_conflict(result: rusqlite::Result<usize>, slug: &str) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Slug collision after disambiguation: {}", slug);
            Err(ServiceError::SlugConflict(slug.to_string()).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn fetch_by_id(conn: &Connection, id: i64) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            &format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS),
            [id],
            row_to_post,
        )
        .optional()?;
    Ok(post)
}

fn fetch_by_slug(conn: &Connection, slug: &str) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            &format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS),
            [slug],
            row_to_post,
        )
        .optional()?;
    Ok(post)
}

fn with_author(conn: &Connection, post: Post) -> Result<PostWithAuthor> {
    let author = conn
        .query_row(
            &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
            [post.author_id],
            row_to_account,
        )
        .optional()?
        .map(|a| AccountSummary::from(&a));

    Ok(PostWithAuthor {
        tag_list: post.tags_list(),
        post,
        author,
    })
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        summary: row.get(4)?,
        ai_summary: row.get(5)?,
        ai_generated: row.get(6)?,
        author_id: row.get(7)?,
        is_published: row.get(8)?,
        published_at: row.get(9)?,
        updated_at: row.get(10)?,
        view_count: row.get(11)?,
        tags: row.get(12)?,
        featured_image: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "x".repeat(MIN_CONTENT_LENGTH),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_minimum_lengths() {
        assert!(validate_post(&input("Hello")).is_ok());
    }

    #[test]
    fn test_validate_rejects_short_title() {
        let err = validate_post(&input("Hi")).unwrap_err();
        assert!(err.to_string().contains("Title"));
    }

    #[test]
    fn test_validate_rejects_short_content() {
        let mut post = input("Long enough title");
        post.content = "too short".to_string();
        let err = validate_post(&post).unwrap_err();
        assert!(err.to_string().contains("at least 100"));
    }

    #[test]
    fn test_validate_featured_image_must_be_http_url() {
        let mut post = input("Long enough title");
        post.featured_image = Some("javascript:alert(1)".to_string());
        assert!(validate_post(&post).is_err());

        post.featured_image = Some("https://cdn.example.com/cover.png".to_string());
        assert!(validate_post(&post).is_ok());
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn test_split_summary_flags_model_output_only() {
        assert_eq!(
            split_summary(Some(Summary::Model("m".into()))),
            (Some("m".to_string()), true)
        );
        assert_eq!(
            split_summary(Some(Summary::Fallback("f".into()))),
            (Some("f".to_string()), false)
        );
        assert_eq!(split_summary(None), (None, false));
    }
}
