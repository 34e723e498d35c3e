use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{self, admin, comments, posts, users};
use crate::middleware::{cors_policy, standard_middleware};
use crate::AppState;

/// Builds the full API router with tracing and CORS applied.
pub fn build_router(state: AppState) -> Router {
    let post_routes = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .patch(posts::edit_post)
                .delete(posts::remove_post),
        )
        .route("/posts/{id}/recover", post(posts::recover_post))
        .route("/posts/{id}/like", post(posts::like_post))
        .route("/posts/{id}/bookmark", post(posts::bookmark_post))
        .route("/posts/{id}/repost", post(posts::repost_post))
        .route("/posts/{id}/share", post(posts::share_post))
        .route("/posts/{id}/view", post(posts::view_post))
        .route("/posts/{id}/recommendations", get(posts::recommendations))
        .route("/posts/{id}/report", post(posts::report_post))
        .route("/feed/home", get(posts::home_feed))
        .route("/categories", get(posts::categories))
        .route("/analytics/author/{id}", get(posts::author_stats));

    let comment_routes = Router::new()
        .route("/posts/{id}/comment", post(comments::add_comment))
        .route("/posts/{id}/comments", get(comments::list_comments))
        .route(
            "/posts/{id}/comments/{cid}",
            axum::routing::delete(comments::delete_comment),
        )
        .route(
            "/posts/{id}/comments/{cid}/react",
            post(comments::react_to_comment),
        );

    let user_routes = Router::new()
        .route("/users/sync", post(users::sync_user))
        .route("/users/directory", get(users::directory))
        .route("/users/{id}", get(users::get_profile))
        .route("/users/{id}/follow", post(users::follow_user))
        .route("/users/{id}/connections", get(users::connections))
        .route("/users/{id}/notifications", get(users::notifications))
        .route(
            "/users/{id}/notifications/read-all",
            post(users::mark_all_notifications_read),
        )
        .route(
            "/users/{id}/notifications/{nid}/read",
            post(users::mark_notification_read),
        );

    let admin_routes = Router::new()
        .route("/admin/moderation/posts/{id}", patch(admin::moderate_post))
        .route("/admin/users/{id}/verification", patch(admin::set_verification))
        .route("/admin/audit-logs", get(admin::audit_logs))
        .route("/admin/me", get(admin::admin_me))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/reports", get(admin::list_reports))
        .route("/admin/reports/{id}", patch(admin::decide_report))
        .route("/admin/newsletter", post(admin::newsletter));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(post_routes)
        .merge(comment_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(standard_middleware())
        .layer(cors_policy())
}
