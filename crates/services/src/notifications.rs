//! # Notifications
//!
//! Side-effect fan-out. A primary operation commits first, then hands drafts
//! to the [`NotificationDispatcher`]. Delivery failures are retried and logged
//! but never propagate back into the operation that produced them.

use std::sync::Arc;
use std::time::Duration;

use domains::{
    Clock, Notification, NotificationDraft, NotificationPage, NotificationRepository, Result, UserId,
};
use serde::Serialize;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Retry schedule for a single notification write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub attempts: u32,
    /// Sleep before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// At-least-once delivery of notification drafts.
#[derive(Clone)]
pub struct NotificationDispatcher {
    repo: Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
    policy: DeliveryPolicy,
}

impl NotificationDispatcher {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        clock: Arc<dyn Clock>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            repo,
            clock,
            policy,
        }
    }

    /// Writes one notification, retrying on failure. Returns whether it landed.
    #[instrument(skip(self, draft), fields(recipient = %draft.recipient_id, kind = ?draft.kind))]
    pub async fn deliver(&self, draft: NotificationDraft) -> bool {
        let notification = draft.into_notification(self.clock.now());
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match self.repo.append(notification.clone()).await {
                Ok(()) => {
                    debug!(id = %notification.id, attempt, "notification delivered");
                    return true;
                }
                Err(e) if attempt < attempts => {
                    warn!(error = %e, attempt, "notification delivery failed, retrying");
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                Err(e) => {
                    error!(error = %e, attempts, "notification dropped");
                }
            }
        }
        false
    }

    /// Delivers every draft in order. Returns how many landed.
    pub async fn deliver_all<I>(&self, drafts: I) -> usize
    where
        I: IntoIterator<Item = NotificationDraft>,
    {
        let mut delivered = 0;
        for draft in drafts {
            if self.deliver(draft).await {
                delivered += 1;
            }
        }
        delivered
    }
}

/// Recipient-facing reads and read-state updates.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, recipient: &UserId) -> Result<NotificationPage> {
        Ok(NotificationPage::from(self.repo.list_for(recipient).await?))
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, recipient: &UserId, id: Uuid) -> Result<Notification> {
        self.repo.mark_read(recipient, id).await
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, recipient: &UserId) -> Result<MarkedRead> {
        let marked = self.repo.mark_all_read(recipient).await?;
        debug!(marked, "notifications marked read");
        Ok(MarkedRead {
            marked,
            page: self.list(recipient).await?,
        })
    }
}

/// Outcome of a mark-all-read: how many flipped, plus the refreshed inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub marked: usize,
    #[serde(flatten)]
    pub page: NotificationPage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        DomainError, MockClock, MockNotificationRepository, NotificationKind, NotificationPayload,
        SystemClock,
    };
    use mockall::Sequence;
    use storage_adapters::MemoryStore;

    fn draft(recipient: &str) -> NotificationDraft {
        NotificationDraft {
            recipient_id: recipient.into(),
            kind: NotificationKind::Follow,
            payload: NotificationPayload {
                source_user_id: Some("someone".into()),
                message: "Someone started following you".into(),
                post_id: None,
            },
        }
    }

    fn fast_policy() -> DeliveryPolicy {
        DeliveryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn fixed_clock() -> Arc<MockClock> {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(Utc::now());
        Arc::new(clock)
    }

    #[tokio::test]
    async fn retries_until_the_write_lands() {
        let mut repo = MockNotificationRepository::new();
        let mut seq = Sequence::new();
        repo.expect_append()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(DomainError::Internal("store unavailable".into())));
        repo.expect_append()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let dispatcher = NotificationDispatcher::new(Arc::new(repo), fixed_clock(), fast_policy());
        assert!(dispatcher.deliver(draft("r")).await);
    }

    #[tokio::test]
    async fn gives_up_after_the_configured_attempts() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_append()
            .times(3)
            .returning(|_| Err(DomainError::Internal("store unavailable".into())));

        let dispatcher = NotificationDispatcher::new(Arc::new(repo), fixed_clock(), fast_policy());
        assert!(!dispatcher.deliver(draft("r")).await);
    }

    #[tokio::test]
    async fn mark_all_read_returns_a_consistent_page() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher =
            NotificationDispatcher::new(store.clone(), Arc::new(SystemClock), fast_policy());
        assert_eq!(dispatcher.deliver_all(vec![draft("r"), draft("r")]).await, 2);

        let service = NotificationService::new(store);
        let page = service.list(&"r".into()).await.unwrap();
        assert_eq!(page.unread_count, 2);
        assert_eq!(page.notifications.len(), 2);

        let outcome = service.mark_all_read(&"r".into()).await.unwrap();
        assert_eq!(outcome.marked, 2);
        assert_eq!(outcome.page.unread_count, 0);
        assert!(outcome.page.notifications.iter().all(|n| n.is_read));

        let again = service.mark_all_read(&"r".into()).await.unwrap();
        assert_eq!(again.marked, 0);
    }
}
