use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domains::{
    DomainError, LifecycleChange, LifecycleTransition, Post, PostEdit, PostRepository, Result,
    UserId, ViewOutcome,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::{MemoryStore, PostRecord};

impl MemoryStore {
    /// Runs `f` against a live post while holding its entry lock.
    fn with_live_post<T>(&self, id: Uuid, f: impl FnOnce(&mut PostRecord) -> T) -> Result<T> {
        let mut record = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        if !record.post.is_live() {
            return Err(DomainError::not_found("Post", id));
        }
        Ok(f(&mut record))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: Post) -> Result<()> {
        match self.posts.entry(post.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "post {} already exists",
                post.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(PostRecord {
                    post,
                    last_viewed: HashMap::new(),
                });
                Ok(())
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|r| r.post.clone()))
    }

    async fn list(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.iter().map(|r| r.post.clone()).collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn toggle_like(&self, id: Uuid, user: &UserId) -> Result<Post> {
        self.with_live_post(id, |r| {
            r.post.toggle_like(user);
            r.post.clone()
        })
    }

    async fn toggle_bookmark(&self, id: Uuid, user: &UserId) -> Result<Post> {
        self.with_live_post(id, |r| {
            r.post.toggle_bookmark(user);
            r.post.clone()
        })
    }

    async fn toggle_repost(&self, id: Uuid, user: &UserId) -> Result<Post> {
        self.with_live_post(id, |r| {
            r.post.toggle_repost(user);
            r.post.clone()
        })
    }

    async fn record_share(&self, id: Uuid) -> Result<Post> {
        self.with_live_post(id, |r| {
            r.post.counters.shares += 1;
            r.post.clone()
        })
    }

    async fn record_view(
        &self,
        id: Uuid,
        user: &UserId,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<ViewOutcome> {
        self.with_live_post(id, |r| {
            let recent = r
                .last_viewed
                .get(user)
                .is_some_and(|seen| now.signed_duration_since(*seen) < window);
            if !recent {
                r.last_viewed.insert(user.clone(), now);
                r.post.counters.views += 1;
            }
            ViewOutcome {
                counted: !recent,
                views: r.post.counters.views,
            }
        })
    }

    async fn apply_comment_delta(&self, id: Uuid, delta: i64) -> Result<u64> {
        let mut record = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        Ok(record.post.apply_comment_delta(delta))
    }

    async fn transition(&self, id: Uuid, change: LifecycleChange) -> Result<LifecycleTransition> {
        let mut record = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        let previous_reason = record.post.moderation_reason.clone();
        let changed = record.post.transition(&change);
        Ok(LifecycleTransition {
            post: record.post.clone(),
            changed,
            previous_reason,
        })
    }

    async fn edit(&self, id: Uuid, edit: PostEdit, now: DateTime<Utc>) -> Result<Post> {
        let mut record = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        if !record.post.is_live() {
            return Err(DomainError::Validation(
                "archived posts cannot be edited".to_string(),
            ));
        }
        record.post.apply_edit(edit, now);
        Ok(record.post.clone())
    }
}
