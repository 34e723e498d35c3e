use domains::{AuditAction, DomainError, EntityRef, NotificationKind, PostLifecycle};
use integration_tests::{TestEngine, ADMIN};

#[tokio::test]
async fn archive_without_reason_is_rejected_and_changes_nothing() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    let post = t.post("ada", "Hello", "Web").await;

    let err = t
        .engine
        .moderation
        .archive(post.id, &ADMIN.into(), "   ")
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::ReasonRequired);

    let view = t.engine.engagement.get_post(post.id, None).await.unwrap();
    assert_eq!(view.post.lifecycle, PostLifecycle::Live);
    assert!(t.engine.moderation.audit_log(&ADMIN.into()).await.unwrap().is_empty());
    let inbox = t.engine.notifications.list(&"ada".into()).await.unwrap();
    assert!(inbox.notifications.is_empty());
}

#[tokio::test]
async fn archive_then_restore_round_trip() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    let post = t.post("ada", "Hello", "Web").await;
    let moderation = &t.engine.moderation;

    let archived = moderation.archive(post.id, &ADMIN.into(), "spam").await.unwrap();
    assert_eq!(archived.post.lifecycle, PostLifecycle::Archived);

    let inbox = t.engine.notifications.list(&"ada".into()).await.unwrap();
    assert_eq!(inbox.notifications.len(), 1);
    assert_eq!(inbox.notifications[0].kind, NotificationKind::Moderation);
    assert!(inbox.notifications[0].payload.message.contains("spam"));

    // Archived posts reject engagement.
    let err = t
        .engine
        .engagement
        .like(post.id, &"bob".into())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    // A second archive is a no-op.
    let again = moderation.archive(post.id, &ADMIN.into(), "spam").await.unwrap();
    assert!(!again.changed);

    let restored = moderation.restore(post.id, &ADMIN.into()).await.unwrap();
    assert_eq!(restored.post.lifecycle, PostLifecycle::Live);
    assert!(restored.post.moderation_reason.is_none());

    let inbox = t.engine.notifications.list(&"ada".into()).await.unwrap();
    assert_eq!(inbox.notifications.len(), 2);
    assert_eq!(inbox.unread_count, 2);

    let log = moderation.audit_log(&ADMIN.into()).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].action, AuditAction::ArchivePost);
    assert_eq!(log[1].detail.as_deref(), Some("spam"));
    assert_eq!(log[1].entity, EntityRef::Post(post.id));
    assert_eq!(log[0].action, AuditAction::RestorePost);
}

#[tokio::test]
async fn restore_of_a_live_post_is_a_noop() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    let post = t.post("ada", "Hello", "Web").await;

    let outcome = t.engine.moderation.restore(post.id, &ADMIN.into()).await.unwrap();
    assert!(!outcome.changed);
    assert!(t.engine.moderation.audit_log(&ADMIN.into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn verify_toggles_and_audits_both_directions() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    let moderation = &t.engine.moderation;

    assert!(moderation.set_verified(&"ada".into(), &ADMIN.into(), true).await.unwrap().is_verified);
    assert!(!moderation.set_verified(&"ada".into(), &ADMIN.into(), false).await.unwrap().is_verified);

    let actions: Vec<_> = moderation
        .audit_log(&ADMIN.into())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::UnverifyUser, AuditAction::VerifyUser]);

    let err = moderation
        .set_verified(&"ada".into(), &"ada".into(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized(_)));
}

#[tokio::test]
async fn authors_see_their_archived_posts_and_admins_do_too() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    let post = t.post("ada", "Hello", "Web").await;
    t.engine
        .moderation
        .archive(post.id, &ADMIN.into(), "spam")
        .await
        .unwrap();

    assert!(t.engine.engagement.get_post(post.id, Some(&"ada".into())).await.is_ok());
    assert!(t.engine.engagement.get_post(post.id, Some(&ADMIN.into())).await.is_ok());
    assert!(t.engine.engagement.get_post(post.id, Some(&"bob".into())).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_admins_handle_a_report_once() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    t.user("bob", "Bob").await;
    let post = t.post("ada", "Hello", "Web").await;
    let report = t
        .engine
        .reports
        .file(post.id, &"bob".into(), "spam")
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let reports = t.engine.reports.clone();
        let decision = if i % 2 == 0 {
            services::ReportDecision::Resolve
        } else {
            services::ReportDecision::Dismiss
        };
        handles.push(tokio::spawn(async move {
            reports.decide(report.id, &ADMIN.into(), decision, None).await
        }));
    }
    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert!(matches!(err, DomainError::Conflict(_)), "{err}"),
        }
    }
    assert_eq!(winners, 1);

    let log = t.engine.moderation.audit_log(&ADMIN.into()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert!(matches!(
        log[0].action,
        AuditAction::ArchivePost | AuditAction::DismissReport
    ));
}
