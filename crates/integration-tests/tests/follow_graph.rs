use std::sync::Arc;

use domains::{ConnectionKind, DomainError, FollowRepository, UserId};
use integration_tests::TestEngine;

#[tokio::test]
async fn follow_twice_restores_counters() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    t.user("bob", "Bob").await;
    let follows = &t.engine.follows;

    let on = follows.toggle_follow(&"bob".into(), &"ada".into()).await.unwrap();
    assert!(on.is_following);
    assert_eq!((on.followers_count, on.following_count), (1, 1));

    let off = follows.toggle_follow(&"bob".into(), &"ada".into()).await.unwrap();
    assert!(!off.is_following);
    assert_eq!((off.followers_count, off.following_count), (0, 0));

    let ada = t.engine.users.profile(&"ada".into(), Some(&"bob".into())).await.unwrap();
    assert_eq!(ada.followers_count, 0);
    assert!(!ada.viewer_follows);
}

#[tokio::test]
async fn self_follow_fails_without_side_effects() {
    let t = TestEngine::new();
    t.user("ada", "Ada").await;
    let err = t
        .engine
        .follows
        .toggle_follow(&"ada".into(), &"ada".into())
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::SelfFollow);
    let counts = t.store.counts(&"ada".into()).await.unwrap();
    assert_eq!((counts.followers, counts.following), (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counters_match_edges_under_concurrent_toggles() {
    let t = Arc::new(TestEngine::new());
    t.user("star", "Star").await;
    for i in 0..40 {
        t.user(&format!("fan{i}"), "Fan").await;
    }

    let mut tasks = Vec::new();
    for i in 0..40 {
        let t = t.clone();
        tasks.push(tokio::spawn(async move {
            let fan = UserId::new(format!("fan{i}"));
            let star = UserId::from("star");
            t.engine.follows.toggle_follow(&fan, &star).await.unwrap();
            if i % 4 == 0 {
                t.engine.follows.toggle_follow(&fan, &star).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let counts = t.store.counts(&"star".into()).await.unwrap();
    let followers = t
        .engine
        .follows
        .connections(&"star".into(), ConnectionKind::Followers, None)
        .await
        .unwrap();
    assert_eq!(counts.followers, 30);
    assert_eq!(followers.len(), 30);
    assert!(followers.iter().all(|c| !c.viewer_follows));
}

#[tokio::test]
async fn following_list_reflects_creation_order() {
    let t = TestEngine::new();
    for id in ["ada", "bob", "cy", "dee"] {
        t.user(id, id).await;
    }
    for followee in ["dee", "bob", "cy"] {
        t.engine
            .follows
            .toggle_follow(&"ada".into(), &followee.into())
            .await
            .unwrap();
    }
    let rows = t
        .engine
        .follows
        .connections(&"ada".into(), ConnectionKind::Following, Some(&"ada".into()))
        .await
        .unwrap();
    let ids: Vec<_> = rows.iter().map(|c| c.profile.id.as_str()).collect();
    assert_eq!(ids, vec!["dee", "bob", "cy"]);
    assert!(rows.iter().all(|c| c.viewer_follows));
}
