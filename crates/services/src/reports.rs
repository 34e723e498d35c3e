//! # Reports
//!
//! Readers flag posts; admins work the queue. Resolving a report archives the
//! reported post through [`ModerationService::archive`], so it is audited and
//! the author notified like any other archive. Dismissing is audited on its own.
//!
//! A report is claimed (closed) before any moderation work starts, and put back
//! in the queue if that work fails. Two admins can never both act on it.

use std::sync::Arc;

use domains::{
    AuditAction, Clock, DomainError, EntityRef, Post, PostRepository, Report, ReportRepository,
    ReportStatus, Result, UserId, UserRepository,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::moderation::ModerationService;

pub const MAX_REASON_LEN: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDecision {
    /// Archive the reported post.
    Resolve,
    Dismiss,
}

/// A queue entry with the title of the post it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub post_title: Option<String>,
}

/// Final state of a handled report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub report: Report,
    /// True when handling the report archived the post.
    pub archived: bool,
}

#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    moderation: ModerationService,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        moderation: ModerationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reports,
            posts,
            users,
            moderation,
            clock,
        }
    }

    async fn live_post(&self, id: Uuid) -> Result<Post> {
        self.posts
            .get(id)
            .await?
            .filter(Post::is_live)
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    /// Files a report against a live post. One open report per reader and post.
    #[instrument(skip(self, reason))]
    pub async fn file(&self, post_id: Uuid, reporter: &UserId, reason: &str) -> Result<Report> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::ReasonRequired);
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(DomainError::Validation(format!(
                "report reason exceeds {MAX_REASON_LEN} characters"
            )));
        }
        if self.users.get(reporter).await?.is_none() {
            return Err(DomainError::not_found("User", reporter));
        }
        self.live_post(post_id).await?;

        let report = Report::new(post_id, reporter.clone(), reason.to_string(), self.clock.now());
        self.reports.file(report.clone()).await?;
        info!(report = %report.id, "post reported");
        Ok(report)
    }

    /// The queue, newest first, optionally limited to one status. Admin only.
    pub async fn list(
        &self,
        actor: &UserId,
        status: Option<ReportStatus>,
    ) -> Result<Vec<ReportView>> {
        self.moderation.require_admin(actor).await?;
        let mut views = Vec::new();
        for report in self.reports.list().await? {
            if status.is_some_and(|s| s != report.status) {
                continue;
            }
            let post_title = self.posts.get(report.post_id).await?.map(|p| p.title);
            views.push(ReportView { report, post_title });
        }
        Ok(views)
    }

    /// Resolves (archives the post) or dismisses an open report. Admin only.
    /// `reason` overrides the reporter's reason as the archive reason.
    #[instrument(skip(self, reason))]
    pub async fn decide(
        &self,
        id: Uuid,
        actor: &UserId,
        decision: ReportDecision,
        reason: Option<&str>,
    ) -> Result<ReportOutcome> {
        self.moderation.require_admin(actor).await?;
        let status = match decision {
            ReportDecision::Resolve => ReportStatus::Resolved,
            ReportDecision::Dismiss => ReportStatus::Dismissed,
        };
        let report = self.reports.close(id, status, actor, self.clock.now()).await?;

        let applied = match decision {
            ReportDecision::Resolve => {
                let reason = reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(report.reason.as_str());
                self.moderation
                    .archive(report.post_id, actor, reason)
                    .await
                    .map(|t| t.changed)
            }
            ReportDecision::Dismiss => self
                .moderation
                .record(
                    actor,
                    AuditAction::DismissReport,
                    EntityRef::Report(id),
                    reason.map(str::trim).filter(|r| !r.is_empty()).map(String::from),
                )
                .await
                .map(|()| false),
        };

        match applied {
            Ok(archived) => {
                info!(?decision, archived, "report handled");
                Ok(ReportOutcome { report, archived })
            }
            Err(err) => {
                if let Err(reopen) = self.reports.reopen(id).await {
                    error!(error = %reopen, "could not return report to the queue");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{DeliveryPolicy, NotificationDispatcher};
    use chrono::Utc;
    use domains::{
        AuditLogRepository, MockAuditLogRepository, MockAuthorizer, NewPost,
        NotificationRepository, PostLifecycle, ProfileSync, SystemClock,
    };
    use storage_adapters::MemoryStore;

    struct Harness {
        store: Arc<MemoryStore>,
        svc: ReportService,
        post_id: Uuid,
    }

    async fn harness(audit: Option<Arc<dyn AuditLogRepository>>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        for id in ["author", "admin", "reader"] {
            store
                .upsert(
                    ProfileSync {
                        id: id.into(),
                        name: id.into(),
                        handle: id.into(),
                    },
                    Utc::now(),
                )
                .await
                .unwrap();
        }
        let post = Post::new(
            NewPost {
                author_id: "author".into(),
                title: "Hello".into(),
                ..Default::default()
            },
            Utc::now(),
        );
        let post_id = post.id;
        store.insert(post).await.unwrap();

        let mut auth = MockAuthorizer::new();
        auth.expect_is_admin()
            .returning(|actor| Ok(actor.as_str() == "admin"));
        let clock = Arc::new(SystemClock);
        let dispatcher =
            NotificationDispatcher::new(store.clone(), clock.clone(), DeliveryPolicy::default());
        let moderation = ModerationService::new(
            store.clone(),
            store.clone(),
            audit.unwrap_or_else(|| store.clone() as Arc<dyn AuditLogRepository>),
            Arc::new(auth),
            dispatcher,
            clock.clone(),
        );
        let svc = ReportService::new(store.clone(), store.clone(), store.clone(), moderation, clock);
        Harness {
            store,
            svc,
            post_id,
        }
    }

    #[tokio::test]
    async fn filing_validates_reason_reader_and_post() {
        let h = harness(None).await;
        let reader = UserId::from("reader");
        assert_eq!(
            h.svc.file(h.post_id, &reader, "  ").await.unwrap_err(),
            DomainError::ReasonRequired
        );
        assert!(matches!(
            h.svc.file(h.post_id, &"ghost".into(), "spam").await.unwrap_err(),
            DomainError::NotFound { entity: "User", .. }
        ));
        assert!(matches!(
            h.svc.file(Uuid::now_v7(), &reader, "spam").await.unwrap_err(),
            DomainError::NotFound { entity: "Post", .. }
        ));

        h.svc.file(h.post_id, &reader, " spam ").await.unwrap();
        assert!(matches!(
            h.svc.file(h.post_id, &reader, "again").await.unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn resolving_archives_audits_and_notifies() {
        let h = harness(None).await;
        let report = h.svc.file(h.post_id, &"reader".into(), "spam").await.unwrap();

        let queue = h.svc.list(&"admin".into(), Some(ReportStatus::Open)).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].post_title.as_deref(), Some("Hello"));

        let outcome = h
            .svc
            .decide(report.id, &"admin".into(), ReportDecision::Resolve, None)
            .await
            .unwrap();
        assert!(outcome.archived);
        assert_eq!(outcome.report.status, ReportStatus::Resolved);
        assert_eq!(outcome.report.handled_by, Some("admin".into()));

        let post = PostRepository::get(&*h.store, h.post_id).await.unwrap().unwrap();
        assert_eq!(post.lifecycle, PostLifecycle::Archived);
        assert_eq!(post.moderation_reason.as_deref(), Some("spam"));
        let log = AuditLogRepository::list(&*h.store).await.unwrap();
        assert_eq!(log[0].action, AuditAction::ArchivePost);
        assert_eq!(h.store.list_for(&"author".into()).await.unwrap().len(), 1);

        assert!(h.svc.list(&"admin".into(), Some(ReportStatus::Open)).await.unwrap().is_empty());
        let err = h
            .svc
            .decide(report.id, &"admin".into(), ReportDecision::Dismiss, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn dismissing_leaves_the_post_alone() {
        let h = harness(None).await;
        let report = h.svc.file(h.post_id, &"reader".into(), "meh").await.unwrap();
        let outcome = h
            .svc
            .decide(report.id, &"admin".into(), ReportDecision::Dismiss, Some("fine"))
            .await
            .unwrap();
        assert!(!outcome.archived);
        assert_eq!(outcome.report.status, ReportStatus::Dismissed);

        let post = PostRepository::get(&*h.store, h.post_id).await.unwrap().unwrap();
        assert!(post.is_live());
        let log = AuditLogRepository::list(&*h.store).await.unwrap();
        assert_eq!(log[0].action, AuditAction::DismissReport);
        assert_eq!(log[0].entity, EntityRef::Report(report.id));
        assert_eq!(log[0].detail.as_deref(), Some("fine"));
    }

    #[tokio::test]
    async fn only_admins_see_and_handle_the_queue() {
        let h = harness(None).await;
        let report = h.svc.file(h.post_id, &"reader".into(), "spam").await.unwrap();
        assert!(h.svc.list(&"reader".into(), None).await.is_err());
        let err = h
            .svc
            .decide(report.id, &"reader".into(), ReportDecision::Resolve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert!(ReportRepository::get(&*h.store, report.id).await.unwrap().unwrap().is_open());
    }

    #[tokio::test]
    async fn failed_resolution_returns_the_report_to_the_queue() {
        let mut audit = MockAuditLogRepository::new();
        audit
            .expect_append()
            .returning(|_| Err(DomainError::Internal("audit down".into())));
        let h = harness(Some(Arc::new(audit))).await;
        let report = h.svc.file(h.post_id, &"reader".into(), "spam").await.unwrap();

        assert!(h
            .svc
            .decide(report.id, &"admin".into(), ReportDecision::Resolve, None)
            .await
            .is_err());
        assert!(ReportRepository::get(&*h.store, report.id).await.unwrap().unwrap().is_open());
        let post = PostRepository::get(&*h.store, h.post_id).await.unwrap().unwrap();
        assert!(post.is_live());
    }
}
