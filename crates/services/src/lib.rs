//! # services
//!
//! Use cases of the engagement engine. Each service owns the validation and
//! authorization of its operations, performs one atomic repository mutation,
//! and only then hands side effects to the [`NotificationDispatcher`].
//!
//! [`Engine`] wires every service over a single store that implements all of
//! the repository ports.

pub mod comments;
pub mod engagement;
pub mod feed;
pub mod follows;
pub mod moderation;
pub mod notifications;
pub mod reports;
pub mod users;

use std::sync::Arc;

use chrono::Duration;
use domains::{
    AuditLogRepository, Authorizer, Clock, CommentRepository, FollowRepository,
    NotificationRepository, PostRepository, ReportRepository, UserRepository,
};

pub use comments::CommentService;
pub use engagement::{EngagementService, PostView};
pub use feed::{FeedLimits, FeedService, FeedSort, PostQuery};
pub use follows::{Connection, FollowService};
pub use moderation::{AdminUserView, ModerationService};
pub use notifications::{DeliveryPolicy, MarkedRead, NotificationDispatcher, NotificationService};
pub use reports::{ReportDecision, ReportOutcome, ReportService, ReportView};
pub use users::{ProfileView, UserService};

/// Tunables shared by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub view_window: Duration,
    pub feed: FeedLimits,
    pub delivery: DeliveryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            view_window: Duration::seconds(1800),
            feed: FeedLimits::default(),
            delivery: DeliveryPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    pub engagement: EngagementService,
    pub comments: CommentService,
    pub follows: FollowService,
    pub feed: FeedService,
    pub notifications: NotificationService,
    pub moderation: ModerationService,
    pub reports: ReportService,
    pub users: UserService,
}

impl Engine {
    pub fn new<S>(
        store: Arc<S>,
        authorizer: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self
    where
        S: PostRepository
            + CommentRepository
            + FollowRepository
            + NotificationRepository
            + AuditLogRepository
            + UserRepository
            + ReportRepository
            + 'static,
    {
        let dispatcher = NotificationDispatcher::new(store.clone(), clock.clone(), config.delivery);
        let moderation = ModerationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            authorizer.clone(),
            dispatcher.clone(),
            clock.clone(),
        );
        Self {
            engagement: EngagementService::new(
                store.clone(),
                store.clone(),
                authorizer,
                clock.clone(),
                config.view_window,
            ),
            comments: CommentService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                dispatcher.clone(),
                clock.clone(),
            ),
            follows: FollowService::new(
                store.clone(),
                store.clone(),
                dispatcher.clone(),
                clock.clone(),
            ),
            feed: FeedService::new(store.clone(), store.clone(), config.feed),
            notifications: NotificationService::new(store.clone()),
            moderation: moderation.clone(),
            reports: ReportService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                moderation,
                clock.clone(),
            ),
            users: UserService::new(store.clone(), store, clock),
        }
    }
}
