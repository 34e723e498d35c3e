use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AddedComment, CascadeOutcome, Comment, CommentRepository, DomainError, NewComment,
    ReactionKind, Result, UserId,
};
use uuid::Uuid;

use super::MemoryStore;

impl MemoryStore {
    fn post_of_comment(&self, id: Uuid) -> Result<Uuid> {
        self.comment_index
            .get(&id)
            .map(|post_id| *post_id)
            .ok_or_else(|| DomainError::not_found("Comment", id))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn add(&self, input: NewComment, now: DateTime<Utc>) -> Result<AddedComment> {
        let post_id = input.post_id;
        if !self.posts.contains_key(&post_id) {
            return Err(DomainError::not_found("Post", post_id));
        }

        // The thread entry is the serialization point for this post's comments.
        let mut thread = self.threads.entry(post_id).or_default();

        if let Some(parent_id) = input.parent_id {
            let parent = thread
                .iter()
                .find(|c| c.id == parent_id)
                .ok_or_else(|| {
                    DomainError::InvalidParent(format!(
                        "comment {parent_id} does not belong to post {post_id}"
                    ))
                })?;
            if parent.is_reply() {
                return Err(DomainError::InvalidParent(format!(
                    "comment {parent_id} is a reply and cannot be replied to"
                )));
            }
            if !parent.is_active() {
                return Err(DomainError::InvalidParent(format!(
                    "comment {parent_id} has been deleted"
                )));
            }
        }

        let comment_count = {
            let mut record = self
                .posts
                .get_mut(&post_id)
                .ok_or_else(|| DomainError::not_found("Post", post_id))?;
            if !record.post.is_live() {
                return Err(DomainError::not_found("Post", post_id));
            }
            record.post.apply_comment_delta(1)
        };

        let comment = Comment::new(input, now);
        thread.push(comment.clone());
        self.comment_index.insert(comment.id, post_id);

        Ok(AddedComment {
            comment,
            comment_count,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        let Some(post_id) = self.comment_index.get(&id).map(|p| *p) else {
            return Ok(None);
        };
        Ok(self
            .threads
            .get(&post_id)
            .and_then(|thread| thread.iter().find(|c| c.id == id).cloned()))
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<CascadeOutcome> {
        let post_id = self.post_of_comment(id)?;
        let mut thread = self
            .threads
            .get_mut(&post_id)
            .ok_or_else(|| DomainError::not_found("Comment", id))?;

        let target = thread
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        if !target.is_active() {
            return Err(DomainError::not_found("Comment", id));
        }

        // Snapshot the doomed set once, before anything is touched.
        let mut deleted_ids = vec![id];
        if !target.is_reply() {
            deleted_ids.extend(
                thread
                    .iter()
                    .filter(|c| c.parent_id == Some(id) && c.is_active())
                    .map(|c| c.id),
            );
        }

        for comment in thread.iter_mut() {
            if deleted_ids.contains(&comment.id) {
                comment.mark_deleted();
            }
        }

        let delta = -(deleted_ids.len() as i64);
        let comment_count = match self.posts.get_mut(&post_id) {
            Some(mut record) => record.post.apply_comment_delta(delta),
            None => 0,
        };

        Ok(CascadeOutcome {
            post_id,
            deleted_ids,
            comment_count,
        })
    }

    async fn toggle_reaction(&self, id: Uuid, user: &UserId, kind: ReactionKind) -> Result<Comment> {
        let post_id = self.post_of_comment(id)?;
        let mut thread = self
            .threads
            .get_mut(&post_id)
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        let comment = thread
            .iter_mut()
            .find(|c| c.id == id && c.is_active())
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        comment.toggle_reaction(user, kind);
        Ok(comment.clone())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self
            .threads
            .get(&post_id)
            .map(|thread| thread.clone())
            .unwrap_or_default())
    }
}
