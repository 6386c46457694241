//! Post statistics for the author dashboard and the platform overview.
//!
//! The aggregation functions are pure: they read a snapshot of posts, take
//! the clock as an argument, and return the same result for the same input
//! order. [`Statistics`] loads the snapshot from the store.

use crate::models::{Account, AccountSummary, Post, PostSummary};
use crate::services::{accounts, posts};
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const HISTOGRAM_DAYS: i64 = 30;
pub const AUTHOR_TOP_POSTS: usize = 5;
pub const GLOBAL_TOP_POSTS: usize = 10;
pub const TOP_AUTHORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiUsage {
    pub with_ai: usize,
    pub without_ai: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub posts: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub posts: u32,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRank {
    pub author_id: i64,
    pub author: Option<AccountSummary>,
    pub post_count: usize,
    pub total_views: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorStatistics {
    pub total_posts: usize,
    pub total_views: i64,
    pub ai_usage: AiUsage,
    pub daily: Vec<DayBucket>,
    pub top_posts: Vec<PostSummary>,
    pub monthly: BTreeMap<String, MonthBucket>,
}

impl AuthorStatistics {
    pub fn compute(posts: &[Post], now: DateTime<Utc>) -> Self {
        Self {
            total_posts: posts.len(),
            total_views: total_views(posts),
            ai_usage: ai_usage(posts),
            daily: daily_histogram(posts, now, HISTOGRAM_DAYS),
            top_posts: top_posts(posts, AUTHOR_TOP_POSTS),
            monthly: monthly_rollup(posts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatistics {
    pub total_users: usize,
    pub total_posts: usize,
    pub total_views: i64,
    pub ai_posts: usize,
    pub popular_posts: Vec<PostSummary>,
    pub active_authors: Vec<AuthorRank>,
}

impl PlatformStatistics {
    /// `published` is expected to hold only published posts.
    pub fn compute(published: &[Post], accounts: &[Account]) -> Self {
        Self {
            total_users: accounts.len(),
            total_posts: published.len(),
            total_views: total_views(published),
            ai_posts: published.iter().filter(|p| p.ai_generated).count(),
            popular_posts: top_posts(published, GLOBAL_TOP_POSTS),
            active_authors: rank_authors(published, accounts, TOP_AUTHORS),
        }
    }
}

pub fn total_views(posts: &[Post]) -> i64 {
    posts.iter().map(|p| p.view_count).sum()
}

pub fn ai_usage(posts: &[Post]) -> AiUsage {
    let with_ai = posts.iter().filter(|p| p.ai_generated).count();
    let ratio = if posts.is_empty() {
        0.0
    } else {
        with_ai as f64 / posts.len() as f64
    };
    AiUsage {
        with_ai,
        without_ai: posts.len() - with_ai,
        ratio,
    }
}

/// One bucket per UTC day from `days - 1` days ago through today, oldest
/// first. Posts published outside that window are ignored.
pub fn daily_histogram(posts: &[Post], now: DateTime<Utc>, days: i64) -> Vec<DayBucket> {
    if days <= 0 {
        return Vec::new();
    }

    let today = now.date_naive();
    let start = today - TimeDelta::days(days - 1);

    let mut buckets: Vec<DayBucket> = (0..days)
        .map(|offset| DayBucket {
            date: start + TimeDelta::days(offset),
            posts: 0,
        })
        .collect();

    for post in posts {
        let day = post.published_at.date_naive();
        if day < start || day > today {
            continue;
        }
        let index = (day - start).num_days() as usize;
        buckets[index].posts += 1;
    }

    buckets
}

/// Highest view counts first; equal counts keep their input order.
pub fn top_posts(posts: &[Post], limit: usize) -> Vec<PostSummary> {
    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    ranked
        .into_iter()
        .take(limit)
        .map(PostSummary::from)
        .collect()
}

pub fn monthly_rollup(posts: &[Post]) -> BTreeMap<String, MonthBucket> {
    let mut months: BTreeMap<String, MonthBucket> = BTreeMap::new();
    for post in posts {
        let key = post.published_at.format("%Y-%m").to_string();
        let bucket = months.entry(key).or_default();
        bucket.posts += 1;
        bucket.views += post.view_count;
    }
    months
}

/// Authors ordered by post count, most prolific first. Ties keep the order
/// in which each author first appears in `posts`.
pub fn rank_authors(posts: &[Post], accounts: &[Account], limit: usize) -> Vec<AuthorRank> {
    let mut order: Vec<AuthorRank> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for post in posts {
        let slot = *index.entry(post.author_id).or_insert_with(|| {
            order.push(AuthorRank {
                author_id: post.author_id,
                author: None,
                post_count: 0,
                total_views: 0,
            });
            order.len() - 1
        });
        order[slot].post_count += 1;
        order[slot].total_views += post.view_count;
    }

    order.sort_by(|a, b| b.post_count.cmp(&a.post_count));
    order.truncate(limit);

    let by_id: HashMap<i64, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    for rank in &mut order {
        rank.author = by_id.get(&rank.author_id).map(|a| AccountSummary::from(*a));
    }

    order
}

pub struct Statistics {
    db: Database,
}

impl Statistics {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn author_dashboard(&self, author_id: i64) -> Result<AuthorStatistics> {
        let posts = posts::list_by_author(&self.db, author_id, false, None)?;
        tracing::debug!("Author statistics: author={} posts={}", author_id, posts.len());
        Ok(AuthorStatistics::compute(&posts, Utc::now()))
    }

    pub fn platform(&self) -> Result<PlatformStatistics> {
        let published = posts::list_all_published(&self.db)?;
        let accounts = accounts::list_accounts(&self.db)?;
        tracing::debug!(
            "Platform statistics: published={} accounts={}",
            published.len(),
            accounts.len()
        );
        Ok(PlatformStatistics::compute(&published, &accounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn post(id: i64, author_id: i64, views: i64, published_at: DateTime<Utc>) -> Post {
        Post {
            id,
            title: format!("Post {}", id),
            slug: format!("post-{}", id),
            content: String::new(),
            summary: None,
            ai_summary: None,
            ai_generated: false,
            author_id,
            is_published: true,
            published_at,
            updated_at: published_at,
            view_count: views,
            tags: None,
            featured_image: None,
        }
    }

    fn account(id: i64, username: &str) -> Account {
        Account {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: String::new(),
            full_name: None,
            about: None,
            avatar_url: None,
            is_active: true,
            registered_at: now(),
            last_login: None,
        }
    }

    #[test]
    fn test_empty_collection() {
        let stats = AuthorStatistics::compute(&[], now());
        assert_eq!(stats.total_posts, 0);
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.ai_usage.with_ai, 0);
        assert_eq!(stats.ai_usage.ratio, 0.0);
        assert!(stats.top_posts.is_empty());
        assert!(stats.monthly.is_empty());
        assert_eq!(stats.daily.len(), HISTOGRAM_DAYS as usize);
        assert!(stats.daily.iter().all(|d| d.posts == 0));

        let platform = PlatformStatistics::compute(&[], &[]);
        assert_eq!(platform.total_posts, 0);
        assert_eq!(platform.total_views, 0);
        assert!(platform.popular_posts.is_empty());
        assert!(platform.active_authors.is_empty());
    }

    #[test]
    fn test_top_posts_descending_by_views() {
        let posts: Vec<Post> = [10, 50, 30, 5, 100]
            .iter()
            .enumerate()
            .map(|(i, views)| post(i as i64 + 1, 1, *views, now()))
            .collect();

        let top: Vec<i64> = top_posts(&posts, 3).iter().map(|p| p.view_count).collect();
        assert_eq!(top, vec![100, 50, 30]);
    }

    #[test]
    fn test_top_posts_ties_keep_input_order() {
        let posts = vec![
            post(1, 1, 7, now()),
            post(2, 1, 9, now()),
            post(3, 1, 7, now()),
        ];
        let ids: Vec<i64> = top_posts(&posts, 5).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_histogram_window_excludes_old_posts() {
        let posts = vec![
            post(1, 1, 4, now() - TimeDelta::days(31)),
            post(2, 1, 6, now()),
        ];
        let stats = AuthorStatistics::compute(&posts, now());

        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_views, 10);
        let counted: u32 = stats.daily.iter().map(|d| d.posts).sum();
        assert_eq!(counted, 1);
    }

    #[test]
    fn test_histogram_buckets_are_ascending_and_inclusive() {
        let posts = vec![
            post(1, 1, 0, now() - TimeDelta::days(29)),
            post(2, 1, 0, now() - TimeDelta::days(30)),
            post(3, 1, 0, now()),
            post(4, 1, 0, now()),
            post(5, 1, 0, now() + TimeDelta::days(2)),
        ];
        let daily = daily_histogram(&posts, now(), HISTOGRAM_DAYS);

        assert_eq!(daily.len(), 30);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        assert_eq!(daily[0].posts, 1);
        assert_eq!(daily[29].date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(daily[29].posts, 2);
        assert_eq!(daily.iter().map(|d| d.posts).sum::<u32>(), 3);
    }

    #[test]
    fn test_monthly_rollup_groups_by_month() {
        let june = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let late_june = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 0).unwrap();
        let may = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        let posts = vec![post(1, 1, 3, june), post(2, 1, 4, late_june), post(3, 1, 1, may)];

        let months = monthly_rollup(&posts);
        assert_eq!(months.len(), 2);
        assert_eq!(months["2024-06"], MonthBucket { posts: 2, views: 7 });
        assert_eq!(months["2024-05"], MonthBucket { posts: 1, views: 1 });
        assert_eq!(months.keys().next().map(String::as_str), Some("2024-05"));
    }

    #[test]
    fn test_ai_usage_ratio() {
        let mut posts: Vec<Post> = (1..=4).map(|i| post(i, 1, 0, now())).collect();
        posts[0].ai_generated = true;

        let usage = ai_usage(&posts);
        assert_eq!(usage.with_ai, 1);
        assert_eq!(usage.without_ai, 3);
        assert!((usage.ratio - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_authors_by_post_count() {
        let accounts = vec![account(1, "ana"), account(2, "ben"), account(3, "cy")];
        let posts = vec![
            post(1, 2, 10, now()),
            post(2, 1, 1, now()),
            post(3, 1, 2, now()),
            post(4, 3, 50, now()),
            post(5, 1, 3, now()),
            post(6, 3, 5, now()),
        ];

        let ranks = rank_authors(&posts, &accounts, TOP_AUTHORS);
        let order: Vec<i64> = ranks.iter().map(|r| r.author_id).collect();
        assert_eq!(order, vec![1, 3, 2]);
        assert_eq!(ranks[0].post_count, 3);
        assert_eq!(ranks[0].total_views, 6);
        assert_eq!(ranks[1].total_views, 55);
        assert_eq!(ranks[2].author.as_ref().map(|a| a.username.as_str()), Some("ben"));
    }

    #[test]
    fn test_rank_authors_respects_limit() {
        let posts: Vec<Post> = (1..=12).map(|i| post(i, i, 0, now())).collect();
        let ranks = rank_authors(&posts, &[], TOP_AUTHORS);
        assert_eq!(ranks.len(), 10);
        assert_eq!(ranks[0].author_id, 1);
        assert!(ranks[0].author.is_none());
    }

    #[test]
    fn test_platform_counts_ai_posts() {
        let mut posts = vec![post(1, 1, 20, now()), post(2, 1, 5, now())];
        posts[1].ai_generated = true;
        let stats = PlatformStatistics::compute(&posts, &[account(1, "ana")]);

        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_views, 25);
        assert_eq!(stats.ai_posts, 1);
        assert_eq!(stats.popular_posts[0].id, 1);
    }
}
