//! # Ports
//!
//! Any storage or identity adapter must implement these traits to be wired
//! into the services. Each mutating method is one atomic unit against the
//! entity it names: an implementation must never expose a half-applied
//! change, and must return the final state so callers can reconcile.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AddedComment, AuditLogEntry, CascadeOutcome, Comment, FollowCounts, FollowToggle,
    LifecycleChange, LifecycleTransition, NewComment, Notification, Post, PostEdit, ProfileSync,
    ReactionKind, Report, ReportStatus, UserId, UserProfile, ViewOutcome,
};

/// Posts and their engagement counters.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: Post) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Post>>;
    /// Snapshot of every post, archived ones included, in creation order.
    async fn list(&self) -> Result<Vec<Post>>;

    // Toggles fail with NotFound on unknown or archived posts.
    async fn toggle_like(&self, id: Uuid, user: &UserId) -> Result<Post>;
    async fn toggle_bookmark(&self, id: Uuid, user: &UserId) -> Result<Post>;
    async fn toggle_repost(&self, id: Uuid, user: &UserId) -> Result<Post>;
    async fn record_share(&self, id: Uuid) -> Result<Post>;

    /// Counts at most one view per (post, user) inside `window`.
    async fn record_view(
        &self,
        id: Uuid,
        user: &UserId,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<ViewOutcome>;

    /// Adjusts the comment counter, clamping at zero. Returns the new count.
    async fn apply_comment_delta(&self, id: Uuid, delta: i64) -> Result<u64>;

    async fn transition(&self, id: Uuid, change: LifecycleChange) -> Result<LifecycleTransition>;

    /// Fails with Validation on archived posts.
    async fn edit(&self, id: Uuid, edit: PostEdit, now: DateTime<Utc>) -> Result<Post>;
}

/// Comment trees, one per post.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Validates the post and parent, stores the comment and bumps the post's
    /// comment counter in one unit.
    async fn add(&self, comment: NewComment, now: DateTime<Utc>) -> Result<AddedComment>;
    async fn get(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Deletes the comment and, for top-level comments, every active reply,
    /// decrementing the post counter once by the total.
    async fn delete_cascade(&self, id: Uuid) -> Result<CascadeOutcome>;
    async fn toggle_reaction(&self, id: Uuid, user: &UserId, kind: ReactionKind) -> Result<Comment>;
    /// Every comment of the post, deleted ones included, in insertion order.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>>;
}

/// Directed follow edges with O(1) counters.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn toggle(
        &self,
        follower: &UserId,
        followee: &UserId,
        now: DateTime<Utc>,
    ) -> Result<FollowToggle>;
    async fn is_following(&self, follower: &UserId, followee: &UserId) -> Result<bool>;
    async fn counts(&self, user: &UserId) -> Result<FollowCounts>;
    /// In edge-creation order.
    async fn followers(&self, user: &UserId) -> Result<Vec<UserId>>;
    /// In edge-creation order.
    async fn following(&self, user: &UserId) -> Result<Vec<UserId>>;
}

/// Per-recipient append-only notification logs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn append(&self, notification: Notification) -> Result<()>;
    /// Newest first.
    async fn list_for(&self, recipient: &UserId) -> Result<Vec<Notification>>;
    /// NotFound when the notification does not belong to `recipient`.
    async fn mark_read(&self, recipient: &UserId, id: Uuid) -> Result<Notification>;
    /// Returns how many entries changed.
    async fn mark_all_read(&self, recipient: &UserId) -> Result<usize>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: AuditLogEntry) -> Result<()>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<AuditLogEntry>>;
}

/// The moderation queue.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Conflict when the reporter already has an open report on the post.
    async fn file(&self, report: Report) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Report>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Report>>;
    /// Claims an open report. Conflict when it is already closed.
    async fn close(
        &self,
        id: Uuid,
        status: ReportStatus,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Report>;
    /// Puts a claimed report back in the queue.
    async fn reopen(&self, id: Uuid) -> Result<Report>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates or refreshes a profile. Verification flag and join date survive.
    /// Conflict when the handle belongs to someone else.
    async fn upsert(&self, sync: ProfileSync, now: DateTime<Utc>) -> Result<UserProfile>;
    async fn get(&self, id: &UserId) -> Result<Option<UserProfile>>;
    async fn find_by_handle(&self, handle: &str) -> Result<Option<UserProfile>>;
    async fn set_verified(&self, id: &UserId, verified: bool) -> Result<UserProfile>;
    async fn list(&self) -> Result<Vec<UserProfile>>;
}

/// External authorization collaborator. Decides roles; the engine only asks.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_admin(&self, actor: &UserId) -> Result<bool>;
}

/// Source of "now". Swapped for a fixed clock in tests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
