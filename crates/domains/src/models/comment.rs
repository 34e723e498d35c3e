use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::UserId;

/// Lifecycle of a comment. `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    Active,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// A comment on a post. A comment with a parent is a reply; replies never
/// have replies of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: UserId,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub liked_by: BTreeSet<UserId>,
    pub disliked_by: BTreeSet<UserId>,
    pub state: CommentState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: UserId,
    pub body: String,
    pub parent_id: Option<Uuid>,
}

/// A stored comment plus the post's comment counter after the insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedComment {
    pub comment: Comment,
    pub comment_count: u64,
}

/// Everything a cascade delete touched, captured in one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeOutcome {
    pub post_id: Uuid,
    /// The target comment first, then its replies in insertion order.
    pub deleted_ids: Vec<Uuid>,
    pub comment_count: u64,
}

impl Comment {
    pub fn new(input: NewComment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id: input.post_id,
            author_id: input.author_id,
            parent_id: input.parent_id,
            body: input.body,
            created_at: now,
            liked_by: BTreeSet::new(),
            disliked_by: BTreeSet::new(),
            state: CommentState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == CommentState::Active
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Flips `user` in the set for `kind` only. Like and dislike are independent.
    pub fn toggle_reaction(&mut self, user: &UserId, kind: ReactionKind) -> bool {
        let set = match kind {
            ReactionKind::Like => &mut self.liked_by,
            ReactionKind::Dislike => &mut self.disliked_by,
        };
        if set.remove(user) {
            false
        } else {
            set.insert(user.clone());
            true
        }
    }

    /// Returns `false` if the comment was already deleted.
    pub fn mark_deleted(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = CommentState::Deleted;
        was_active
    }
}

/// Two-level view of a post's active comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub top_level: Vec<Comment>,
    pub replies_by_parent: BTreeMap<Uuid, Vec<Comment>>,
}

impl CommentThread {
    /// Rebuilds the tree from comments in insertion order. Deleted comments and
    /// comments of other posts are skipped.
    pub fn build<'a, I>(post_id: Uuid, comments: I) -> Self
    where
        I: IntoIterator<Item = &'a Comment>,
    {
        let mut thread = Self::default();
        for comment in comments {
            if comment.post_id != post_id || !comment.is_active() {
                continue;
            }
            match comment.parent_id {
                None => thread.top_level.push(comment.clone()),
                Some(parent) => thread
                    .replies_by_parent
                    .entry(parent)
                    .or_default()
                    .push(comment.clone()),
            }
        }
        thread
    }

    pub fn len(&self) -> usize {
        self.top_level.len() + self.replies_by_parent.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(post_id: Uuid, parent_id: Option<Uuid>, body: &str) -> Comment {
        Comment::new(
            NewComment {
                post_id,
                author_id: "a".into(),
                body: body.into(),
                parent_id,
            },
            Utc::now(),
        )
    }

    #[test]
    fn reactions_are_independent_sets() {
        let mut c = comment(Uuid::now_v7(), None, "hi");
        let user = UserId::from("u");
        assert!(c.toggle_reaction(&user, ReactionKind::Like));
        assert!(c.toggle_reaction(&user, ReactionKind::Dislike));
        assert!(c.liked_by.contains(&user));
        assert!(c.disliked_by.contains(&user));
        assert!(!c.toggle_reaction(&user, ReactionKind::Like));
        assert!(c.disliked_by.contains(&user));
    }

    #[test]
    fn thread_groups_replies_in_insertion_order() {
        let post = Uuid::now_v7();
        let top = comment(post, None, "top");
        let other_top = comment(post, None, "other");
        let r1 = comment(post, Some(top.id), "r1");
        let r2 = comment(post, Some(top.id), "r2");
        let mut gone = comment(post, Some(other_top.id), "gone");
        gone.mark_deleted();
        let foreign = comment(Uuid::now_v7(), None, "elsewhere");

        let all = vec![top.clone(), r1.clone(), other_top.clone(), gone, r2.clone(), foreign];
        let thread = CommentThread::build(post, &all);

        assert_eq!(thread.top_level, vec![top.clone(), other_top.clone()]);
        assert_eq!(thread.replies_by_parent[&top.id], vec![r1, r2]);
        assert!(!thread.replies_by_parent.contains_key(&other_top.id));
        assert_eq!(thread.len(), 4);
    }

    #[test]
    fn deletion_is_terminal() {
        let mut c = comment(Uuid::now_v7(), None, "x");
        assert!(c.mark_deleted());
        assert!(!c.mark_deleted());
        assert_eq!(c.state, CommentState::Deleted);
    }
}
