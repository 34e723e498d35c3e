//! # Moderation
//!
//! Soft-delete and restore of posts, profile verification, newsletter
//! broadcast and the audit trail they leave. Every successful state change
//! writes exactly one [`AuditLogEntry`]; no-ops write nothing.
//!
//! ## Order of checks
//!
//! Input validation (a missing reason) is reported before authorization, and
//! both happen before anything is written. A state change and its audit entry
//! land together: if the audit write fails the change is reverted and the
//! error returned. Notifications go out only after both are stored.

use std::sync::Arc;

use domains::{
    AuditAction, AuditLogEntry, AuditLogRepository, Authorizer, Clock, DomainError, EntityRef,
    LifecycleChange, LifecycleTransition, NotificationDraft, NotificationKind,
    NotificationPayload, Post, PostRepository, Result, UserId, UserProfile, UserRepository,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::notifications::NotificationDispatcher;

/// Moderation reason recorded when authors take down their own post.
pub const AUTHOR_REMOVAL_REASON: &str = "removed by author";

/// A profile as listed in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub is_admin: bool,
}

#[derive(Clone)]
pub struct ModerationService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditLogRepository>,
    authorizer: Arc<dyn Authorizer>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl ModerationService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        audit: Arc<dyn AuditLogRepository>,
        authorizer: Arc<dyn Authorizer>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            users,
            audit,
            authorizer,
            dispatcher,
            clock,
        }
    }

    pub async fn is_admin(&self, actor: &UserId) -> Result<bool> {
        self.authorizer.is_admin(actor).await
    }

    pub(crate) async fn require_admin(&self, actor: &UserId) -> Result<()> {
        if self.authorizer.is_admin(actor).await? {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(format!("{actor} is not an admin")))
        }
    }

    async fn require_post(&self, id: Uuid) -> Result<Post> {
        self.posts
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    pub(crate) async fn record(
        &self,
        actor: &UserId,
        action: AuditAction,
        entity: EntityRef,
        detail: Option<String>,
    ) -> Result<()> {
        self.audit
            .append(AuditLogEntry::new(
                actor.clone(),
                action,
                entity,
                detail,
                self.clock.now(),
            ))
            .await
    }

    /// Applies `change` and writes its audit entry as one unit. When the audit
    /// write fails the transition is reversed and the audit error returned.
    async fn audited_transition(
        &self,
        post_id: Uuid,
        change: LifecycleChange,
        actor: &UserId,
        action: AuditAction,
        detail: Option<String>,
    ) -> Result<LifecycleTransition> {
        let outcome = self.posts.transition(post_id, change).await?;
        let Some(undo) = outcome.inverse() else {
            debug!(?action, "post already in the requested state");
            return Ok(outcome);
        };
        if let Err(err) = self
            .record(actor, action, EntityRef::Post(post_id), detail)
            .await
        {
            warn!(error = %err, ?action, "audit write failed, reverting lifecycle change");
            if let Err(revert) = self.posts.transition(post_id, undo).await {
                error!(error = %revert, "lifecycle revert failed");
            }
            return Err(err);
        }
        Ok(outcome)
    }

    async fn notify_author(&self, post: &Post, actor: &UserId, message: String) {
        self.dispatcher
            .deliver(NotificationDraft {
                recipient_id: post.author_id.clone(),
                kind: NotificationKind::Moderation,
                payload: NotificationPayload {
                    source_user_id: Some(actor.clone()),
                    message,
                    post_id: Some(post.id),
                },
            })
            .await;
    }

    #[instrument(skip(self, reason))]
    pub async fn archive(
        &self,
        post_id: Uuid,
        actor: &UserId,
        reason: &str,
    ) -> Result<LifecycleTransition> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::ReasonRequired);
        }
        self.require_admin(actor).await?;

        let outcome = self
            .audited_transition(
                post_id,
                LifecycleChange::Archive {
                    reason: reason.to_string(),
                },
                actor,
                AuditAction::ArchivePost,
                Some(reason.to_string()),
            )
            .await?;
        if outcome.changed {
            info!(%reason, "post archived");
            let message = format!(
                "Your post \"{}\" was archived by a moderator: {reason}",
                outcome.post.title
            );
            self.notify_author(&outcome.post, actor, message).await;
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, post_id: Uuid, actor: &UserId) -> Result<LifecycleTransition> {
        self.require_admin(actor).await?;

        let outcome = self
            .audited_transition(
                post_id,
                LifecycleChange::Restore,
                actor,
                AuditAction::RestorePost,
                None,
            )
            .await?;
        if outcome.changed {
            info!("post restored");
            let message = format!("Your post \"{}\" has been restored", outcome.post.title);
            self.notify_author(&outcome.post, actor, message).await;
        }
        Ok(outcome)
    }

    /// Archives a post on behalf of its own author. Audited, not notified.
    #[instrument(skip(self))]
    pub async fn remove_own_post(
        &self,
        post_id: Uuid,
        requester: &UserId,
    ) -> Result<LifecycleTransition> {
        let post = self.require_post(post_id).await?;
        if post.author_id != *requester {
            return Err(DomainError::Unauthorized(
                "only the author can remove this post".into(),
            ));
        }
        let outcome = self
            .audited_transition(
                post_id,
                LifecycleChange::Archive {
                    reason: AUTHOR_REMOVAL_REASON.to_string(),
                },
                requester,
                AuditAction::ArchivePost,
                Some(AUTHOR_REMOVAL_REASON.to_string()),
            )
            .await?;
        if outcome.changed {
            info!("post removed by author");
        }
        Ok(outcome)
    }

    /// Restores a post its author removed. Posts archived by a moderator stay
    /// archived until an admin restores them.
    #[instrument(skip(self))]
    pub async fn recover_own_post(
        &self,
        post_id: Uuid,
        requester: &UserId,
    ) -> Result<LifecycleTransition> {
        let post = self.require_post(post_id).await?;
        if post.author_id != *requester {
            return Err(DomainError::Unauthorized(
                "only the author can recover this post".into(),
            ));
        }
        if !post.is_live() && post.moderation_reason.as_deref() != Some(AUTHOR_REMOVAL_REASON) {
            return Err(DomainError::Unauthorized(
                "post was archived by a moderator".into(),
            ));
        }
        let outcome = self
            .audited_transition(
                post_id,
                LifecycleChange::Restore,
                requester,
                AuditAction::RestorePost,
                None,
            )
            .await?;
        if outcome.changed {
            info!("post recovered by author");
        }
        Ok(outcome)
    }

    /// Sets the verification flag. The previous flag is put back when the
    /// audit write fails.
    #[instrument(skip(self))]
    pub async fn set_verified(
        &self,
        user: &UserId,
        actor: &UserId,
        is_verified: bool,
    ) -> Result<UserProfile> {
        self.require_admin(actor).await?;
        let before = self
            .users
            .get(user)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user))?;
        let profile = self.users.set_verified(user, is_verified).await?;
        let action = if is_verified {
            AuditAction::VerifyUser
        } else {
            AuditAction::UnverifyUser
        };
        if let Err(err) = self
            .record(actor, action, EntityRef::User(user.clone()), None)
            .await
        {
            warn!(error = %err, "audit write failed, reverting verification");
            if let Err(revert) = self.users.set_verified(user, before.is_verified).await {
                error!(error = %revert, "verification revert failed");
            }
            return Err(err);
        }
        info!(is_verified, "verification updated");
        Ok(profile)
    }

    /// Every known profile with its role, for the admin console.
    pub async fn list_users(&self, actor: &UserId) -> Result<Vec<AdminUserView>> {
        self.require_admin(actor).await?;
        let mut rows = Vec::new();
        for profile in self.users.list().await? {
            let is_admin = self.authorizer.is_admin(&profile.id).await?;
            rows.push(AdminUserView { profile, is_admin });
        }
        Ok(rows)
    }

    pub async fn audit_log(&self, actor: &UserId) -> Result<Vec<AuditLogEntry>> {
        self.require_admin(actor).await?;
        self.audit.list().await
    }

    /// Sends `message` to every known user except the sender. Returns how many
    /// notifications were delivered.
    #[instrument(skip(self, message))]
    pub async fn broadcast_newsletter(&self, actor: &UserId, message: &str) -> Result<usize> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::Validation("newsletter message is empty".into()));
        }
        self.require_admin(actor).await?;

        let drafts: Vec<NotificationDraft> = self
            .users
            .list()
            .await?
            .into_iter()
            .filter(|u| u.id != *actor)
            .map(|u| NotificationDraft {
                recipient_id: u.id,
                kind: NotificationKind::Newsletter,
                payload: NotificationPayload {
                    source_user_id: Some(actor.clone()),
                    message: message.to_string(),
                    post_id: None,
                },
            })
            .collect();
        let delivered = self.dispatcher.deliver_all(drafts).await;
        info!(delivered, "newsletter sent");
        Ok(delivered)
    }
}
