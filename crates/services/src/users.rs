use std::sync::Arc;

use domains::{
    normalize_handle, Clock, DomainError, FollowRepository, ProfileSync, Result, UserId,
    UserProfile, UserRepository,
};
use serde::Serialize;
use tracing::{info, instrument};

/// A profile as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub followers_count: u64,
    pub following_count: u64,
    pub viewer_follows: bool,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            follows,
            clock,
        }
    }

    /// Creates or refreshes a profile pushed by the identity provider.
    #[instrument(skip(self, sync), fields(user = %sync.id))]
    pub async fn sync(&self, sync: ProfileSync) -> Result<UserProfile> {
        if sync.id.as_str().trim().is_empty() {
            return Err(DomainError::Validation("user id is required".into()));
        }
        let handle = normalize_handle(&sync.handle)
            .ok_or_else(|| DomainError::Validation(format!("unusable handle {:?}", sync.handle)))?;
        let name = match sync.name.trim() {
            "" => handle.clone(),
            trimmed => trimmed.to_string(),
        };
        let profile = self
            .users
            .upsert(
                ProfileSync {
                    id: sync.id,
                    name,
                    handle,
                },
                self.clock.now(),
            )
            .await?;
        info!(handle = %profile.handle, "profile synced");
        Ok(profile)
    }

    pub async fn require(&self, id: &UserId) -> Result<UserProfile> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn profile(&self, id: &UserId, viewer: Option<&UserId>) -> Result<ProfileView> {
        let profile = self.require(id).await?;
        let counts = self.follows.counts(id).await?;
        let viewer_follows = match viewer {
            Some(v) if v != id => self.follows.is_following(v, id).await?,
            _ => false,
        };
        Ok(ProfileView {
            profile,
            followers_count: counts.followers,
            following_count: counts.following,
            viewer_follows,
        })
    }

    /// Every known author, most followed first, then by name.
    pub async fn directory(&self, viewer: Option<&UserId>) -> Result<Vec<ProfileView>> {
        let mut rows = Vec::new();
        for profile in self.users.list().await? {
            let counts = self.follows.counts(&profile.id).await?;
            let viewer_follows = match viewer {
                Some(v) if *v != profile.id => self.follows.is_following(v, &profile.id).await?,
                _ => false,
            };
            rows.push(ProfileView {
                profile,
                followers_count: counts.followers,
                following_count: counts.following,
                viewer_follows,
            });
        }
        rows.sort_by(|a, b| {
            b.followers_count
                .cmp(&a.followers_count)
                .then_with(|| a.profile.name.to_lowercase().cmp(&b.profile.name.to_lowercase()))
                .then_with(|| a.profile.id.cmp(&b.profile.id))
        });
        Ok(rows)
    }
}
