use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use domains::{DomainError, ProfileSync, Result, UserId, UserProfile, UserRepository};

use super::MemoryStore;

impl MemoryStore {
    /// Points `handle` at `owner`, failing if someone else holds it.
    fn claim_handle(&self, handle: &str, owner: &UserId) -> Result<()> {
        match self.handles.entry(handle.to_string()) {
            Entry::Occupied(taken) if taken.get() != owner => Err(DomainError::Conflict(format!(
                "handle @{handle} is already taken"
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner.clone());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert(&self, sync: ProfileSync, now: DateTime<Utc>) -> Result<UserProfile> {
        let slot = self.users.entry(sync.id.clone());
        self.claim_handle(&sync.handle, &sync.id)?;

        let profile = match slot {
            Entry::Occupied(mut existing) => {
                let profile = existing.get_mut();
                let previous = std::mem::replace(&mut profile.handle, sync.handle.clone());
                profile.name = sync.name;
                if previous != sync.handle {
                    self.handles.remove(&previous);
                }
                profile.clone()
            }
            Entry::Vacant(empty) => empty
                .insert(UserProfile {
                    id: sync.id,
                    name: sync.name,
                    handle: sync.handle,
                    is_verified: false,
                    joined_at: now,
                })
                .value()
                .clone(),
        };
        Ok(profile)
    }

    async fn get(&self, id: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.users.get(id).map(|p| p.value().clone()))
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<UserProfile>> {
        let Some(owner) = self.handles.get(handle).map(|o| o.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&owner).map(|p| p.value().clone()))
    }

    async fn set_verified(&self, id: &UserId, verified: bool) -> Result<UserProfile> {
        let mut profile = self
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        profile.is_verified = verified;
        Ok(profile.clone())
    }

    async fn list(&self) -> Result<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = self.users.iter().map(|p| p.value().clone()).collect();
        users.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }
}
