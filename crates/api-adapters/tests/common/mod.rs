#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{build_router, AppState};
use auth_adapters::StaticRoleAuthorizer;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use domains::SystemClock;
use serde_json::Value;
use services::{Engine, EngineConfig};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub const ADMIN: &str = "admin";

pub fn app() -> Router {
    let engine = Engine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticRoleAuthorizer::new([ADMIN])),
        Arc::new(SystemClock),
        EngineConfig::default(),
    );
    build_router(AppState::new(engine))
}

/// Sends one request and returns the status with the parsed JSON body
/// (`Value::Null` when the body is empty or not JSON).
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn sync_user(app: &Router, id: &str, name: &str) {
    let (status, _) = call(
        app,
        Method::POST,
        "/users/sync",
        Some(serde_json::json!({ "userId": id, "name": name, "handle": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Creates a post and returns its id.
pub async fn create_post(app: &Router, author: &str, title: &str, category: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/posts",
        Some(serde_json::json!({
            "authorId": author,
            "title": title,
            "excerpt": "An excerpt",
            "category": category,
            "tags": ["Rust"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}
