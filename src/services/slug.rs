use anyhow::Result;
use slug::slugify;

pub const MAX_SLUG_LENGTH: usize = 350;

const EMPTY_TITLE_SLUG: &str = "post";

/// Lowercase `[a-z0-9-]` identifier derived from `title`, at most
/// [`MAX_SLUG_LENGTH`] characters, never starting or ending with a hyphen.
/// Applying it to its own output returns the output unchanged.
pub fn generate_slug(title: &str) -> String {
    // Punctuation is dropped, not turned into a separator.
    let kept: String = title
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace())
        .collect();
    let slug = slugify(kept);
    let slug = truncate(&slug, MAX_SLUG_LENGTH);
    if slug.is_empty() {
        EMPTY_TITLE_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Make `base` unique with a single check against `exists`.
///
/// On collision the result is `{base}-{disambiguator}`, where the
/// disambiguator is the id of the creating author or of the post being
/// edited. There is no second round: if the suffixed slug is taken as well
/// the store's unique constraint rejects the write.
pub fn resolve_slug<F>(base: &str, disambiguator: i64, exists: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<bool>,
{
    if !exists(base)? {
        return Ok(base.to_string());
    }

    let suffix = format!("-{}", disambiguator);
    let room = MAX_SLUG_LENGTH.saturating_sub(suffix.len());
    Ok(format!("{}{}", truncate(base, room), suffix))
}

pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

// Slugs are ASCII, so byte slicing stays on char boundaries.
fn truncate(slug: &str, max: usize) -> &str {
    let cut = if slug.len() > max { &slug[..max] } else { slug };
    cut.trim_end_matches('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_max_length() {
        let title = "word ".repeat(200);
        let slug = generate_slug(&title);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_resolve_without_collision_keeps_base() {
        let slug = resolve_slug("hello-world", 3, |_| Ok(false)).unwrap();
        assert_eq!(slug, "hello-world");
    }

    #[test]
    fn test_resolve_collision_appends_id() {
        let slug = resolve_slug("hello-world", 42, |s| Ok(s == "hello-world")).unwrap();
        assert_eq!(slug, "hello-world-42");
    }

    #[test]
    fn test_resolve_keeps_suffixed_slug_within_limit() {
        let base = "a".repeat(MAX_SLUG_LENGTH);
        let slug = resolve_slug(&base, 123456, |_| Ok(true)).unwrap();
        assert_eq!(slug.len(), MAX_SLUG_LENGTH);
        assert!(slug.ends_with("-123456"));
    }

    #[test]
    fn test_resolve_checks_only_once() {
        let mut calls = 0;
        let slug = resolve_slug("taken", 9, |_| {
            calls += 1;
            Ok(true)
        })
        .unwrap();
        assert_eq!(slug, "taken-9");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_resolve_propagates_lookup_errors() {
        let result = resolve_slug("any", 1, |_| Err(anyhow::anyhow!("store offline")));
        assert!(result.is_err());
    }
}
