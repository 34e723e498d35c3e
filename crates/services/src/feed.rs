//! # Feed ranking
//!
//! Read-only projections over a snapshot of posts. Nothing here is stored:
//! every ordering is recomputed from the counters on each read, so the same
//! snapshot always yields the same feed.

use domains::{
    normalize_category, DomainError, FollowRepository, Post, PostRepository, Result, UserId,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Weight of a like in the trending score.
pub const LIKE_WEIGHT: u64 = 3;
/// Weight of a comment in the trending score.
pub const COMMENT_WEIGHT: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLimits {
    pub trending: usize,
    pub recent: usize,
    pub category_cap: usize,
    pub recommendations: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            trending: 5,
            recent: 4,
            category_cap: 6,
            recommendations: 4,
        }
    }
}

pub fn trending_score(post: &Post) -> u64 {
    post.likes() * LIKE_WEIGHT + post.counters.comment_count * COMMENT_WEIGHT
}

/// Higher score first; ties go to the newer post, then the larger id.
fn trending_order(a: &Post, b: &Post) -> Ordering {
    trending_score(b)
        .cmp(&trending_score(a))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

fn recent_order(a: &Post, b: &Post) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn live(posts: &[Post]) -> Vec<Post> {
    posts.iter().filter(|p| p.is_live()).cloned().collect()
}

/// Live posts by trending order, at most `limit`.
pub fn trending(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut ranked = live(posts);
    ranked.sort_by(trending_order);
    ranked.truncate(limit);
    ranked
}

/// Live posts newest first, at most `limit`.
pub fn recent(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut ranked = live(posts);
    ranked.sort_by(recent_order);
    ranked.truncate(limit);
    ranked
}

/// Lower-cases `label` and collapses every run of non-alphanumerics into one hyphen.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_hyphen = false;
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Slug of a raw category label, after blank labels fall back to "General".
pub fn category_slug(label: &str) -> String {
    let slug = slugify(&normalize_category(label));
    if slug.is_empty() {
        slugify(domains::DEFAULT_CATEGORY)
    } else {
        slug
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub slug: String,
    pub count: usize,
}

/// Groups live posts by category slug, busiest first, capped at `cap` groups.
/// A group is named after the first label seen for it in creation order.
pub fn aggregate_categories(posts: &[Post], cap: usize) -> Vec<CategorySummary> {
    let mut by_age = live(posts);
    by_age.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut groups: Vec<CategorySummary> = Vec::new();
    for post in &by_age {
        let slug = category_slug(&post.category);
        match groups.iter_mut().find(|g| g.slug == slug) {
            Some(group) => group.count += 1,
            None => groups.push(CategorySummary {
                name: normalize_category(&post.category),
                slug,
                count: 1,
            }),
        }
    }
    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.slug.cmp(&b.slug))
    });
    groups.truncate(cap);
    groups
}

/// Live posts related to `post` by category slug or a shared tag, in trending
/// order. The post itself is never included.
pub fn recommendations(posts: &[Post], post: &Post, limit: usize) -> Vec<Post> {
    let slug = category_slug(&post.category);
    let mut related: Vec<Post> = posts
        .iter()
        .filter(|p| p.is_live() && p.id != post.id)
        .filter(|p| category_slug(&p.category) == slug || !p.tags.is_disjoint(&post.tags))
        .cloned()
        .collect();
    related.sort_by(trending_order);
    related.truncate(limit);
    related
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    pub trending: Vec<Post>,
    pub featured: Option<Post>,
    pub secondary_recent: Vec<Post>,
    pub categories: Vec<CategorySummary>,
}

pub fn assemble_home(posts: &[Post], limits: FeedLimits) -> HomeFeed {
    let mut latest = recent(posts, limits.recent).into_iter();
    let featured = latest.next();
    HomeFeed {
        trending: trending(posts, limits.trending),
        featured,
        secondary_recent: latest.collect(),
        categories: aggregate_categories(posts, limits.category_cap),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedSort {
    #[default]
    Latest,
    Trending,
}

/// Filters for the post listing. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub sort: FeedSort,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub author: Option<UserId>,
    /// Restrict to authors this viewer follows.
    pub following_of: Option<UserId>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Applies `query` to a snapshot. `followed` is the viewer's following set and
/// is only consulted when `query.following_of` is set.
pub fn filter_posts(posts: &[Post], query: &PostQuery, followed: &HashSet<UserId>) -> Vec<Post> {
    let category = present(&query.category).map(category_slug);
    let tag = present(&query.tag).map(str::to_lowercase);
    let needle = present(&query.q).map(str::to_lowercase);

    let mut matched: Vec<Post> = posts
        .iter()
        .filter(|p| p.is_live())
        .filter(|p| category.as_ref().map_or(true, |c| category_slug(&p.category) == *c))
        .filter(|p| tag.as_ref().map_or(true, |t| p.tags.contains(t)))
        .filter(|p| query.author.as_ref().map_or(true, |a| &p.author_id == a))
        .filter(|p| query.following_of.is_none() || followed.contains(&p.author_id))
        .filter(|p| {
            needle.as_ref().map_or(true, |n| {
                p.title.to_lowercase().contains(n)
                    || p.excerpt.to_lowercase().contains(n)
                    || p.tags.iter().any(|t| t.contains(n))
            })
        })
        .cloned()
        .collect();

    match query.sort {
        FeedSort::Latest => matched.sort_by(recent_order),
        FeedSort::Trending => matched.sort_by(trending_order),
    }
    matched
}

/// Totals over an author's posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    pub posts: usize,
    pub live_posts: usize,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub followers: u64,
}

pub fn author_stats(posts: &[Post], author: &UserId, followers: u64) -> AuthorStats {
    posts
        .iter()
        .filter(|p| &p.author_id == author)
        .fold(
            AuthorStats {
                followers,
                ..Default::default()
            },
            |mut acc, p| {
                acc.posts += 1;
                acc.live_posts += usize::from(p.is_live());
                acc.views += p.counters.views;
                acc.likes += p.likes();
                acc.comments += p.counters.comment_count;
                acc.shares += p.counters.shares;
                acc
            },
        )
}

/// Loads snapshots from the repositories and runs the projections above.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    follows: Arc<dyn FollowRepository>,
    limits: FeedLimits,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        follows: Arc<dyn FollowRepository>,
        limits: FeedLimits,
    ) -> Self {
        Self {
            posts,
            follows,
            limits,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let snapshot = self.posts.list().await?;
        let followed: HashSet<UserId> = match &query.following_of {
            Some(viewer) => self.follows.following(viewer).await?.into_iter().collect(),
            None => HashSet::new(),
        };
        Ok(filter_posts(&snapshot, query, &followed))
    }

    pub async fn home(&self) -> Result<HomeFeed> {
        let snapshot = self.posts.list().await?;
        Ok(assemble_home(&snapshot, self.limits))
    }

    /// NotFound for unknown and archived posts.
    pub async fn recommendations(&self, post_id: Uuid) -> Result<Vec<Post>> {
        let snapshot = self.posts.list().await?;
        let post = snapshot
            .iter()
            .find(|p| p.id == post_id && p.is_live())
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;
        Ok(recommendations(&snapshot, post, self.limits.recommendations))
    }

    pub async fn categories(&self) -> Result<Vec<CategorySummary>> {
        let snapshot = self.posts.list().await?;
        Ok(aggregate_categories(&snapshot, self.limits.category_cap))
    }

    pub async fn author_stats(&self, author: &UserId) -> Result<AuthorStats> {
        let snapshot = self.posts.list().await?;
        let followers = self.follows.counts(author).await?.followers;
        Ok(author_stats(&snapshot, author, followers))
    }
}
