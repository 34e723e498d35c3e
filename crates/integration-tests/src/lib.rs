//! Shared fixtures for the scenario tests: a fully wired engine over one
//! `MemoryStore`, with `admin` holding the admin role.

use std::sync::Arc;
use std::time::Duration;

use auth_adapters::StaticRoleAuthorizer;
use domains::{Clock, NewPost, Post, ProfileSync, SystemClock, UserProfile};
use services::{DeliveryPolicy, Engine, EngineConfig};
use storage_adapters::MemoryStore;

pub const ADMIN: &str = "admin";

pub struct TestEngine {
    pub store: Arc<MemoryStore>,
    pub engine: Engine,
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            delivery: DeliveryPolicy {
                attempts: 3,
                backoff: Duration::from_millis(1),
            },
            ..Default::default()
        };
        let engine = Engine::new(
            store.clone(),
            Arc::new(StaticRoleAuthorizer::new([ADMIN])),
            clock,
            config,
        );
        Self { store, engine }
    }

    /// Registers a user whose handle equals their id.
    pub async fn user(&self, id: &str, name: &str) -> UserProfile {
        self.engine
            .users
            .sync(ProfileSync {
                id: id.into(),
                name: name.into(),
                handle: id.into(),
            })
            .await
            .expect("user sync")
    }

    pub async fn post(&self, author: &str, title: &str, category: &str) -> Post {
        self.engine
            .engagement
            .create_post(NewPost {
                author_id: author.into(),
                title: title.into(),
                excerpt: format!("About {title}"),
                category: category.into(),
                tags: Vec::new(),
            })
            .await
            .expect("create post")
    }

    #[cfg(feature = "web-axum")]
    pub fn router(&self) -> axum::Router {
        api_adapters::build_router(api_adapters::AppState::new(self.engine.clone()))
    }
}
