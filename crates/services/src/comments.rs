use std::sync::Arc;

use domains::{
    extract_mentions, AddedComment, CascadeOutcome, Clock, Comment, CommentRepository,
    CommentThread, DomainError, NewComment, NotificationDraft, NotificationKind,
    NotificationPayload, PostRepository, ReactionKind, Result, UserId, UserRepository,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::notifications::NotificationDispatcher;

pub const MAX_COMMENT_LEN: usize = 5_000;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
            dispatcher,
            clock,
        }
    }

    /// Stores the comment, then notifies every distinct user mentioned in it.
    #[instrument(skip(self, body), fields(post = %post_id, author = %author))]
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author: &UserId,
        body: &str,
        parent_id: Option<Uuid>,
    ) -> Result<AddedComment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::Validation("comment body is empty".into()));
        }
        if body.chars().count() > MAX_COMMENT_LEN {
            return Err(DomainError::Validation(format!(
                "comment exceeds {MAX_COMMENT_LEN} characters"
            )));
        }

        let added = self
            .comments
            .add(
                NewComment {
                    post_id,
                    author_id: author.clone(),
                    body: body.to_string(),
                    parent_id,
                },
                self.clock.now(),
            )
            .await?;
        info!(comment = %added.comment.id, count = added.comment_count, "comment added");

        self.notify_mentions(&added.comment).await;
        Ok(added)
    }

    async fn notify_mentions(&self, comment: &Comment) {
        let handles = extract_mentions(&comment.body);
        if handles.is_empty() {
            return;
        }
        let author_name = match self.users.get(&comment.author_id).await {
            Ok(Some(profile)) => profile.name,
            _ => comment.author_id.to_string(),
        };

        let mut drafts = Vec::new();
        for handle in handles {
            let recipient = match self.users.find_by_handle(&handle).await {
                Ok(Some(profile)) => profile.id,
                Ok(None) => {
                    debug!(%handle, "mention of unknown handle ignored");
                    continue;
                }
                Err(e) => {
                    debug!(%handle, error = %e, "mention lookup failed");
                    continue;
                }
            };
            if recipient == comment.author_id {
                continue;
            }
            drafts.push(NotificationDraft {
                recipient_id: recipient,
                kind: NotificationKind::Mention,
                payload: NotificationPayload {
                    source_user_id: Some(comment.author_id.clone()),
                    message: format!("{author_name} mentioned you in a comment"),
                    post_id: Some(comment.post_id),
                },
            });
        }
        self.dispatcher.deliver_all(drafts).await;
    }

    /// Soft-deletes a comment (and its replies when top-level). Allowed for
    /// the comment's author and the post's author.
    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        requester: &UserId,
    ) -> Result<CascadeOutcome> {
        let comment = self
            .comments
            .get(comment_id)
            .await?
            .filter(|c| c.post_id == post_id && c.is_active())
            .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;

        if comment.author_id != *requester {
            let post = self
                .posts
                .get(post_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Post", post_id))?;
            if post.author_id != *requester {
                return Err(DomainError::Unauthorized(
                    "only the comment author or the post author can delete a comment".into(),
                ));
            }
        }

        let outcome = self.comments.delete_cascade(comment_id).await?;
        info!(
            deleted = outcome.deleted_ids.len(),
            count = outcome.comment_count,
            "comment cascade applied"
        );
        Ok(outcome)
    }

    pub async fn react(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user: &UserId,
        kind: ReactionKind,
    ) -> Result<Comment> {
        match self.comments.get(comment_id).await? {
            Some(c) if c.post_id == post_id => {}
            _ => return Err(DomainError::not_found("Comment", comment_id)),
        }
        self.comments.toggle_reaction(comment_id, user, kind).await
    }

    async fn require_post(&self, post_id: Uuid) -> Result<()> {
        match self.posts.get(post_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("Post", post_id)),
        }
    }

    pub async fn thread(&self, post_id: Uuid) -> Result<CommentThread> {
        self.require_post(post_id).await?;
        let all = self.comments.list_for_post(post_id).await?;
        Ok(CommentThread::build(post_id, &all))
    }

    /// Active comments of a post in insertion order, replies interleaved.
    pub async fn flat(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        self.require_post(post_id).await?;
        let mut all = self.comments.list_for_post(post_id).await?;
        all.retain(Comment::is_active);
        Ok(all)
    }
}
