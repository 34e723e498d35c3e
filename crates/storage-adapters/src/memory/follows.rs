use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use domains::{DomainError, FollowCounts, FollowEdge, FollowRepository, FollowToggle, Result, UserId};

use super::MemoryStore;

impl MemoryStore {
    fn counts_of(&self, user: &UserId) -> FollowCounts {
        self.adjacency
            .get(user)
            .map(|a| FollowCounts {
                followers: a.followers.len() as u64,
                following: a.following.len() as u64,
            })
            .unwrap_or_default()
    }

    fn link(&self, follower: &UserId, followee: &UserId) {
        self.adjacency
            .entry(follower.clone())
            .or_default()
            .following
            .push(followee.clone());
        self.adjacency
            .entry(followee.clone())
            .or_default()
            .followers
            .push(follower.clone());
    }

    fn unlink(&self, follower: &UserId, followee: &UserId) {
        if let Some(mut adj) = self.adjacency.get_mut(follower) {
            adj.following.retain(|u| u != followee);
        }
        if let Some(mut adj) = self.adjacency.get_mut(followee) {
            adj.followers.retain(|u| u != follower);
        }
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn toggle(
        &self,
        follower: &UserId,
        followee: &UserId,
        now: DateTime<Utc>,
    ) -> Result<FollowToggle> {
        if follower == followee {
            return Err(DomainError::SelfFollow);
        }

        // The edge entry stays locked until the adjacency lists agree with it.
        let is_following = match self.edges.entry((follower.clone(), followee.clone())) {
            Entry::Occupied(edge) => {
                self.unlink(follower, followee);
                edge.remove();
                false
            }
            Entry::Vacant(slot) => {
                self.link(follower, followee);
                slot.insert(FollowEdge {
                    follower_id: follower.clone(),
                    followee_id: followee.clone(),
                    created_at: now,
                });
                true
            }
        };

        Ok(FollowToggle {
            is_following,
            followers_count: self.counts_of(followee).followers,
            following_count: self.counts_of(follower).following,
        })
    }

    async fn is_following(&self, follower: &UserId, followee: &UserId) -> Result<bool> {
        Ok(self
            .edges
            .contains_key(&(follower.clone(), followee.clone())))
    }

    async fn counts(&self, user: &UserId) -> Result<FollowCounts> {
        Ok(self.counts_of(user))
    }

    async fn followers(&self, user: &UserId) -> Result<Vec<UserId>> {
        Ok(self
            .adjacency
            .get(user)
            .map(|a| a.followers.clone())
            .unwrap_or_default())
    }

    async fn following(&self, user: &UserId) -> Result<Vec<UserId>> {
        Ok(self
            .adjacency
            .get(user)
            .map(|a| a.following.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn follow_twice_restores_counters() {
        let store = MemoryStore::new();
        let (a, b) = (UserId::from("a"), UserId::from("b"));

        let on = store.toggle(&a, &b, Utc::now()).await.unwrap();
        assert_eq!(
            on,
            FollowToggle {
                is_following: true,
                followers_count: 1,
                following_count: 1
            }
        );
        assert!(store.is_following(&a, &b).await.unwrap());
        assert!(!store.is_following(&b, &a).await.unwrap());

        let off = store.toggle(&a, &b, Utc::now()).await.unwrap();
        assert!(!off.is_following);
        assert_eq!(off.followers_count, 0);
        assert_eq!(store.counts(&b).await.unwrap(), FollowCounts::default());
        assert!(store.followers(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let store = MemoryStore::new();
        let a = UserId::from("a");
        let err = store.toggle(&a, &a, Utc::now()).await.unwrap_err();
        assert_eq!(err, DomainError::SelfFollow);
    }

    #[tokio::test]
    async fn connections_keep_edge_creation_order() {
        let store = MemoryStore::new();
        let target = UserId::from("t");
        for name in ["x", "y", "z"] {
            store.toggle(&name.into(), &target, Utc::now()).await.unwrap();
        }
        store.toggle(&"y".into(), &target, Utc::now()).await.unwrap();
        let followers = store.followers(&target).await.unwrap();
        assert_eq!(followers, vec![UserId::from("x"), UserId::from("z")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn counters_match_edges_under_contention() {
        let store = Arc::new(MemoryStore::new());
        let target = UserId::from("star");
        // Each fan toggles an odd or even number of times.
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                let target = target.clone();
                tokio::spawn(async move {
                    let fan = UserId::new(format!("fan-{i}"));
                    for _ in 0..(1 + i % 2) {
                        store.toggle(&fan, &target, Utc::now()).await.unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        let counts = store.counts(&target).await.unwrap();
        assert_eq!(counts.followers, 16);
        assert_eq!(store.followers(&target).await.unwrap().len(), 16);
    }
}
