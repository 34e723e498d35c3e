mod common;

use axum::http::{Method, StatusCode};
use common::{app, call, create_post, sync_user};
use serde_json::json;

#[tokio::test]
async fn like_toggles_and_reports_final_state() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let id = create_post(&app, "ada", "Hello", "Web").await;
    let uri = format!("/posts/{id}/like");

    let (status, first) = call(&app, Method::POST, &uri, Some(json!({ "userId": "bob" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["likes"], 1);
    assert_eq!(first["isLiked"], true);
    assert_eq!(first["likedBy"], json!(["bob"]));

    let (_, second) = call(&app, Method::POST, &uri, Some(json!({ "userId": "bob" }))).await;
    assert_eq!(second["likes"], 0);
    assert_eq!(second["isLiked"], false);

    let (_, view) = call(&app, Method::GET, &format!("/posts/{id}?viewerId=bob"), None).await;
    assert_eq!(view["likes"], 0);
    assert_eq!(view["isLiked"], false);
}

#[tokio::test]
async fn views_count_once_per_viewer_window() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let id = create_post(&app, "ada", "Hello", "Web").await;
    let uri = format!("/posts/{id}/view");

    let (_, first) = call(&app, Method::POST, &uri, Some(json!({ "userId": "bob" }))).await;
    let (_, again) = call(&app, Method::POST, &uri, Some(json!({ "userId": "bob" }))).await;
    let (_, other) = call(&app, Method::POST, &uri, Some(json!({ "userId": "cy" }))).await;
    assert_eq!(first, json!({ "counted": true, "views": 1 }));
    assert_eq!(again, json!({ "counted": false, "views": 1 }));
    assert_eq!(other, json!({ "counted": true, "views": 2 }));
}

#[tokio::test]
async fn blank_title_is_a_validation_error() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/posts",
        Some(json!({ "authorId": "ada", "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn removed_posts_are_hidden_from_everyone_but_the_author() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let id = create_post(&app, "ada", "Hello", "Web").await;

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/posts/{id}"),
        Some(json!({ "userId": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, removed) = call(
        &app,
        Method::DELETE,
        &format!("/posts/{id}"),
        Some(json!({ "userId": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["post"]["lifecycle"], "archived");

    let (status, _) = call(&app, Method::GET, &format!("/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::GET, &format!("/posts/{id}?viewerId=ada"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/posts/{id}/like"),
        Some(json!({ "userId": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, recovered) = call(
        &app,
        Method::POST,
        &format!("/posts/{id}/recover"),
        Some(json!({ "userId": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recovered["post"]["lifecycle"], "live");
}

#[tokio::test]
async fn listing_filters_by_category_slug_and_sorts() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let ai = create_post(&app, "ada", "Models", "AI/ML").await;
    create_post(&app, "ada", "Servers", "Cloud").await;
    let ai_again = create_post(&app, "ada", "Agents", "ai & ml").await;

    let (status, posts) = call(&app, Method::GET, "/posts?category=ai-ml", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![ai_again.clone(), ai.clone()]);

    call(
        &app,
        Method::POST,
        &format!("/posts/{ai}/like"),
        Some(json!({ "userId": "bob" })),
    )
    .await;
    let (_, trending) = call(&app, Method::GET, "/posts?sort=trending", None).await;
    assert_eq!(trending[0]["id"], ai.as_str());

    let (status, body) = call(&app, Method::GET, "/posts?feed=following", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn home_feed_and_categories() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    for (title, category) in [("a", "AI/ML"), ("b", "ai/ml "), ("c", "  "), ("d", "General")] {
        create_post(&app, "ada", title, category).await;
    }

    let (_, categories) = call(&app, Method::GET, "/categories", None).await;
    assert_eq!(
        categories,
        json!([
            { "name": "AI/ML", "slug": "ai-ml", "count": 2 },
            { "name": "General", "slug": "general", "count": 2 }
        ])
    );

    let (status, home) = call(&app, Method::GET, "/feed/home", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(home["featured"]["title"], "d");
    assert_eq!(home["secondaryRecent"].as_array().unwrap().len(), 3);
    assert_eq!(home["trending"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn edits_keep_history_and_metrics_count_actions() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let id = create_post(&app, "ada", "Hello", "Web").await;

    let (status, edited) = call(
        &app,
        Method::PATCH,
        &format!("/posts/{id}"),
        Some(json!({ "editorId": "ada", "title": "Hello, again" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["title"], "Hello, again");
    assert_eq!(edited["editHistory"][0]["title"], "Hello");

    let (_, shared) = call(&app, Method::POST, &format!("/posts/{id}/share"), None).await;
    assert_eq!(shared["shares"], 1);

    let (status, _) = call(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_is_ok() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn recommendations_skip_the_post_itself_and_archived_posts() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    let id = create_post(&app, "ada", "Hello", "Web").await;
    let sibling = create_post(&app, "ada", "Sibling", "Web").await;
    let hidden = create_post(&app, "ada", "Hidden", "Web").await;
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/posts/{hidden}"),
        Some(json!({ "userId": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/posts/{id}/recommendations");
    let (status, recs) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = recs
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![sibling.as_str()]);

    let (status, body) = call(
        &app,
        Method::GET,
        "/posts/00000000-0000-0000-0000-000000000000/recommendations",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn readers_report_a_post_once() {
    let app = app();
    sync_user(&app, "ada", "Ada").await;
    sync_user(&app, "bob", "Bob").await;
    let id = create_post(&app, "ada", "Hello", "Web").await;
    let uri = format!("/posts/{id}/report");

    let (status, report) = call(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "userId": "bob", "reason": "spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["status"], "open");
    assert_eq!(report["postId"], id.as_str());

    let (status, body) = call(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "userId": "bob", "reason": "still spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, body) = call(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "userId": "ada", "reason": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "reason_required");
}
