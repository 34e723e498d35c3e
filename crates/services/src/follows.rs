use std::sync::Arc;

use domains::{
    Clock, ConnectionKind, DomainError, FollowRepository, FollowToggle, NotificationDraft,
    NotificationKind, NotificationPayload, Result, UserId, UserProfile, UserRepository,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::notifications::NotificationDispatcher;

/// One row of a followers/following list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub viewer_follows: bool,
}

#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl FollowService {
    pub fn new(
        follows: Arc<dyn FollowRepository>,
        users: Arc<dyn UserRepository>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            follows,
            users,
            dispatcher,
            clock,
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<UserProfile> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    /// Creates the edge if absent, removes it otherwise. Only a newly created
    /// edge notifies the followee.
    #[instrument(skip(self))]
    pub async fn toggle_follow(&self, follower: &UserId, followee: &UserId) -> Result<FollowToggle> {
        if follower == followee {
            return Err(DomainError::SelfFollow);
        }
        let source = self.require_user(follower).await?;
        self.require_user(followee).await?;

        let outcome = self.follows.toggle(follower, followee, self.clock.now()).await?;
        info!(now_following = outcome.is_following, "follow toggled");

        if outcome.is_following {
            self.dispatcher
                .deliver(NotificationDraft {
                    recipient_id: followee.clone(),
                    kind: NotificationKind::Follow,
                    payload: NotificationPayload {
                        source_user_id: Some(follower.clone()),
                        message: format!("{} started following you", source.name),
                        post_id: None,
                    },
                })
                .await;
        }
        Ok(outcome)
    }

    /// Followers or followees of `user`, each flagged with whether `viewer`
    /// follows them. Ids without a stored profile are skipped.
    pub async fn connections(
        &self,
        user: &UserId,
        kind: ConnectionKind,
        viewer: Option<&UserId>,
    ) -> Result<Vec<Connection>> {
        self.require_user(user).await?;
        let ids = match kind {
            ConnectionKind::Followers => self.follows.followers(user).await?,
            ConnectionKind::Following => self.follows.following(user).await?,
        };

        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(profile) = self.users.get(&id).await? else {
                continue;
            };
            let viewer_follows = match viewer {
                Some(v) if *v != id => self.follows.is_following(v, &id).await?,
                _ => false,
            };
            rows.push(Connection {
                profile,
                viewer_follows,
            });
        }
        Ok(rows)
    }
}
