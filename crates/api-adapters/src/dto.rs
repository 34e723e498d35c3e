//! # Wire types
//!
//! camelCase request bodies, query strings and the response shapes that are
//! not plain domain types.

use chrono::{DateTime, Utc};
use domains::{
    CascadeOutcome, Comment, ConnectionKind, LifecycleTransition, Post, PostEdit, ReactionKind,
    ReportStatus, UserId,
};
use serde::{Deserialize, Serialize};
use services::{FeedSort, PostQuery, ReportDecision};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub author_id: UserId,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPostRequest {
    pub editor_id: UserId,
    #[serde(flatten)]
    pub edit: PostEdit,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsParams {
    pub sort: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub author: Option<UserId>,
    /// `following` restricts to authors the viewer follows.
    pub feed: Option<String>,
    pub viewer_id: Option<UserId>,
}

impl ListPostsParams {
    /// Unknown `sort` or `feed` values are rejected rather than ignored.
    pub fn into_query(self) -> Result<PostQuery, String> {
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") | Some("latest") => FeedSort::Latest,
            Some("trending") => FeedSort::Trending,
            Some(other) => return Err(format!("unknown sort {other:?}")),
        };
        let following_of = match self.feed.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some("following") => match self.viewer_id {
                Some(viewer) => Some(viewer),
                None => return Err("feed=following requires viewerId".into()),
            },
            Some(other) => return Err(format!("unknown feed {other:?}")),
        };
        Ok(PostQuery {
            sort,
            category: self.category,
            tag: self.tag,
            q: self.q,
            author: self.author,
            following_of,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerParams {
    pub viewer_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub user_id: UserId,
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub user_id: UserId,
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub viewer_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsParams {
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub viewer_id: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Archive,
    Restore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub actor_id: UserId,
    pub action: ModerationAction,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub actor_id: UserId,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorParams {
    pub actor_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserParams {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterRequest {
    pub actor_id: UserId,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub user_id: UserId,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListParams {
    pub actor_id: UserId,
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDecisionRequest {
    pub actor_id: UserId,
    pub decision: ReportDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A comment as it appears in the flat thread listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: UserId,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: usize,
    pub dislikes: usize,
    pub liked_by: Vec<UserId>,
    pub disliked_by: Vec<UserId>,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            parent_comment_id: c.parent_id,
            content: c.body,
            created_at: c.created_at,
            likes: c.liked_by.len(),
            dislikes: c.disliked_by.len(),
            liked_by: c.liked_by.into_iter().collect(),
            disliked_by: c.disliked_by.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreated {
    pub comment: CommentView,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsDeleted {
    pub deleted_ids: Vec<Uuid>,
    pub comment_count: u64,
}

impl From<CascadeOutcome> for CommentsDeleted {
    fn from(outcome: CascadeOutcome) -> Self {
        Self {
            deleted_ids: outcome.deleted_ids,
            comment_count: outcome.comment_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    pub post: Post,
    pub changed: bool,
}

impl From<LifecycleTransition> for LifecycleResponse {
    fn from(t: LifecycleTransition) -> Self {
        Self {
            post: t.post,
            changed: t.changed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsletterSent {
    pub delivered: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
}
