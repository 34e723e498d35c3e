use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::UserId;

/// Label used when a post carries no usable category.
pub const DEFAULT_CATEGORY: &str = "General";

/// Moderation state of a post. Unlike comment deletion this is restorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostLifecycle {
    Live,
    Archived,
}

/// Monotonic engagement counters. Likes are not stored here: they are
/// always the size of the liker set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounters {
    pub views: u64,
    pub comment_count: u64,
    pub shares: u64,
}

/// Content of a post as it was before an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSnapshot {
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: BTreeSet<String>,
    /// When this content was replaced.
    pub replaced_at: DateTime<Utc>,
}

/// A blog post together with the engagement state it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: UserId,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub counters: PostCounters,
    pub liked_by: BTreeSet<UserId>,
    pub bookmarked_by: BTreeSet<UserId>,
    pub reposted_by: BTreeSet<UserId>,
    pub lifecycle: PostLifecycle,
    pub moderation_reason: Option<String>,
    pub edit_history: Vec<PostSnapshot>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub author_id: UserId,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
}

/// Partial update of a post's content; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEdit {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PostEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.excerpt.is_none() && self.category.is_none() && self.tags.is_none()
    }
}

/// Requested lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleChange {
    Archive { reason: String },
    Restore,
}

/// Result of a lifecycle transition. `changed == false` means the post was
/// already in the requested state and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTransition {
    pub post: Post,
    pub changed: bool,
    /// Moderation reason the post carried before the transition.
    pub previous_reason: Option<String>,
}

impl LifecycleTransition {
    /// The change that puts the post back where it was, if anything changed.
    pub fn inverse(&self) -> Option<LifecycleChange> {
        if !self.changed {
            return None;
        }
        Some(match &self.previous_reason {
            Some(reason) => LifecycleChange::Archive {
                reason: reason.clone(),
            },
            None => LifecycleChange::Restore,
        })
    }
}

/// Outcome of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutcome {
    pub counted: bool,
    pub views: u64,
}

impl Post {
    /// Builds a live post with zeroed counters. Category and tags are normalized.
    pub fn new(input: NewPost, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            author_id: input.author_id,
            title: input.title.trim().to_string(),
            excerpt: input.excerpt.trim().to_string(),
            category: normalize_category(&input.category),
            tags: normalize_tags(input.tags),
            created_at: now,
            counters: PostCounters::default(),
            liked_by: BTreeSet::new(),
            bookmarked_by: BTreeSet::new(),
            reposted_by: BTreeSet::new(),
            lifecycle: PostLifecycle::Live,
            moderation_reason: None,
            edit_history: Vec::new(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.lifecycle == PostLifecycle::Live
    }

    pub fn likes(&self) -> u64 {
        self.liked_by.len() as u64
    }

    /// Flips `user` in the liker set; returns whether the user now likes the post.
    pub fn toggle_like(&mut self, user: &UserId) -> bool {
        toggle_member(&mut self.liked_by, user)
    }

    pub fn toggle_bookmark(&mut self, user: &UserId) -> bool {
        toggle_member(&mut self.bookmarked_by, user)
    }

    pub fn toggle_repost(&mut self, user: &UserId) -> bool {
        toggle_member(&mut self.reposted_by, user)
    }

    /// Applies a signed change to the comment counter, clamped at zero.
    pub fn apply_comment_delta(&mut self, delta: i64) -> u64 {
        let current = self.counters.comment_count;
        self.counters.comment_count = if delta >= 0 {
            current.saturating_add(delta.unsigned_abs())
        } else {
            current.saturating_sub(delta.unsigned_abs())
        };
        self.counters.comment_count
    }

    /// Applies a lifecycle change; returns `false` when already in the target state.
    pub fn transition(&mut self, change: &LifecycleChange) -> bool {
        match (change, self.lifecycle) {
            (LifecycleChange::Archive { reason }, PostLifecycle::Live) => {
                self.lifecycle = PostLifecycle::Archived;
                self.moderation_reason = Some(reason.clone());
                true
            }
            (LifecycleChange::Restore, PostLifecycle::Archived) => {
                self.lifecycle = PostLifecycle::Live;
                self.moderation_reason = None;
                true
            }
            _ => false,
        }
    }

    /// Replaces content fields, appending the previous content to the edit history.
    pub fn apply_edit(&mut self, edit: PostEdit, now: DateTime<Utc>) {
        self.edit_history.push(PostSnapshot {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            replaced_at: now,
        });
        if let Some(title) = edit.title {
            self.title = title.trim().to_string();
        }
        if let Some(excerpt) = edit.excerpt {
            self.excerpt = excerpt.trim().to_string();
        }
        if let Some(category) = edit.category {
            self.category = normalize_category(&category);
        }
        if let Some(tags) = edit.tags {
            self.tags = normalize_tags(tags);
        }
    }
}

fn toggle_member(set: &mut BTreeSet<UserId>, user: &UserId) -> bool {
    if set.remove(user) {
        false
    } else {
        set.insert(user.clone());
        true
    }
}

/// Trims a category label, falling back to [`DEFAULT_CATEGORY`] when blank.
pub fn normalize_category(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Trims and lower-cases tags, dropping blanks and duplicates.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
