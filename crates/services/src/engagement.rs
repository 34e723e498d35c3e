//! # Engagement
//!
//! Authoring and per-post counters. Each call is exactly one repository
//! mutation; the returned post is the state after that mutation, so callers
//! reconcile from it instead of retrying.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use domains::{
    Authorizer, Clock, DomainError, NewPost, Post, PostEdit, PostRepository, Result, UserId,
    UserRepository, ViewOutcome,
};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 200;

/// A post together with the viewer's own engagement flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub likes: u64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub is_reposted: bool,
}

impl PostView {
    pub fn new(post: Post, viewer: Option<&UserId>) -> Self {
        let has = |set: &BTreeSet<UserId>| viewer.is_some_and(|v| set.contains(v));
        Self {
            likes: post.likes(),
            is_liked: has(&post.liked_by),
            is_bookmarked: has(&post.bookmarked_by),
            is_reposted: has(&post.reposted_by),
            post,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub likes: u64,
    pub liked_by: BTreeSet<UserId>,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkState {
    pub is_bookmarked: bool,
    pub bookmarks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepostState {
    pub is_reposted: bool,
    pub reposts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShareState {
    pub shares: u64,
}

#[derive(Clone)]
pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    authorizer: Arc<dyn Authorizer>,
    clock: Arc<dyn Clock>,
    view_window: Duration,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        authorizer: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
        view_window: Duration,
    ) -> Self {
        Self {
            posts,
            users,
            authorizer,
            clock,
            view_window,
        }
    }

    #[instrument(skip(self, input), fields(author = %input.author_id))]
    pub async fn create_post(&self, input: NewPost) -> Result<Post> {
        validate_title(&input.title)?;
        if self.users.get(&input.author_id).await?.is_none() {
            return Err(DomainError::not_found("User", &input.author_id));
        }
        let post = Post::new(input, self.clock.now());
        self.posts.insert(post.clone()).await?;
        info!(post = %post.id, category = %post.category, "post created");
        Ok(post)
    }

    /// Archived posts are only visible to their author and to admins.
    pub async fn get_post(&self, id: Uuid, viewer: Option<&UserId>) -> Result<PostView> {
        let post = self
            .posts
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        if !post.is_live() {
            let allowed = match viewer {
                Some(v) if *v == post.author_id => true,
                Some(v) => self.authorizer.is_admin(v).await?,
                None => false,
            };
            if !allowed {
                return Err(DomainError::not_found("Post", id));
            }
        }
        Ok(PostView::new(post, viewer))
    }

    #[instrument(skip(self, edit))]
    pub async fn edit_post(&self, id: Uuid, editor: &UserId, edit: PostEdit) -> Result<Post> {
        if edit.is_empty() {
            return Err(DomainError::Validation("edit changes nothing".into()));
        }
        if let Some(title) = &edit.title {
            validate_title(title)?;
        }
        let current = self
            .posts
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        if current.author_id != *editor {
            return Err(DomainError::Unauthorized(
                "only the author can edit a post".into(),
            ));
        }
        let post = self.posts.edit(id, edit, self.clock.now()).await?;
        info!(revisions = post.edit_history.len(), "post edited");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn like(&self, id: Uuid, user: &UserId) -> Result<LikeState> {
        let post = self.posts.toggle_like(id, user).await?;
        let is_liked = post.liked_by.contains(user);
        debug!(is_liked, likes = post.likes(), "like toggled");
        Ok(LikeState {
            likes: post.likes(),
            is_liked,
            liked_by: post.liked_by,
        })
    }

    #[instrument(skip(self))]
    pub async fn bookmark(&self, id: Uuid, user: &UserId) -> Result<BookmarkState> {
        let post = self.posts.toggle_bookmark(id, user).await?;
        Ok(BookmarkState {
            is_bookmarked: post.bookmarked_by.contains(user),
            bookmarks: post.bookmarked_by.len() as u64,
        })
    }

    #[instrument(skip(self))]
    pub async fn repost(&self, id: Uuid, user: &UserId) -> Result<RepostState> {
        let post = self.posts.toggle_repost(id, user).await?;
        Ok(RepostState {
            is_reposted: post.reposted_by.contains(user),
            reposts: post.reposted_by.len() as u64,
        })
    }

    pub async fn share(&self, id: Uuid) -> Result<ShareState> {
        let post = self.posts.record_share(id).await?;
        Ok(ShareState {
            shares: post.counters.shares,
        })
    }

    pub async fn record_view(&self, id: Uuid, user: &UserId) -> Result<ViewOutcome> {
        let outcome = self
            .posts
            .record_view(id, user, self.clock.now(), self.view_window)
            .await?;
        debug!(post = %id, counted = outcome.counted, "view recorded");
        Ok(outcome)
    }

    /// Saturating adjustment of the comment counter.
    pub async fn comment_count_delta(&self, id: Uuid, delta: i64) -> Result<u64> {
        self.posts.apply_comment_delta(id, delta).await
    }
}

fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::Validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
