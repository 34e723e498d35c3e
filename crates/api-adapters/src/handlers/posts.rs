use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{NewPost, Post, Report, UserId, ViewOutcome};
use services::engagement::{BookmarkState, LikeState, RepostState, ShareState};
use services::feed::{AuthorStats, CategorySummary, HomeFeed};
use services::PostView;
use tracing::instrument;
use uuid::Uuid;

use crate::dto::{
    CreatePostRequest, EditPostRequest, LifecycleResponse, ListPostsParams, ReportRequest,
    UserAction, ViewerParams,
};
use crate::error::{ApiError, ApiResult};
use crate::metrics::Action;
use crate::AppState;

#[instrument(skip(state, req), fields(author = %req.author_id))]
pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = state
        .engine
        .engagement
        .create_post(NewPost {
            author_id: req.author_id,
            title: req.title,
            excerpt: req.excerpt,
            category: req.category,
            tags: req.tags,
        })
        .await?;
    state.metrics.record(Action::CreatePost);
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> ApiResult<Json<Vec<PostView>>> {
    let viewer = params.viewer_id.clone();
    let query = params.into_query().map_err(ApiError::BadRequest)?;
    let posts = state.engine.feed.list(&query).await?;
    Ok(Json(
        posts
            .into_iter()
            .map(|p| PostView::new(p, viewer.as_ref()))
            .collect(),
    ))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerParams>,
) -> ApiResult<Json<PostView>> {
    let view = state
        .engine
        .engagement
        .get_post(id, params.viewer_id.as_ref())
        .await?;
    Ok(Json(view))
}

#[instrument(skip(state, req))]
pub async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditPostRequest>,
) -> ApiResult<Json<Post>> {
    let post = state
        .engine
        .engagement
        .edit_post(id, &req.editor_id, req.edit)
        .await?;
    state.metrics.record(Action::EditPost);
    Ok(Json(post))
}

pub async fn remove_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<LifecycleResponse>> {
    let outcome = state
        .engine
        .moderation
        .remove_own_post(id, &req.user_id)
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn recover_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<LifecycleResponse>> {
    let outcome = state
        .engine
        .moderation
        .recover_own_post(id, &req.user_id)
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<LikeState>> {
    let liked = state.engine.engagement.like(id, &req.user_id).await?;
    state.metrics.record(Action::Like);
    Ok(Json(liked))
}

pub async fn bookmark_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<BookmarkState>> {
    let bookmarked = state.engine.engagement.bookmark(id, &req.user_id).await?;
    state.metrics.record(Action::Bookmark);
    Ok(Json(bookmarked))
}

pub async fn repost_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<RepostState>> {
    let reposted = state.engine.engagement.repost(id, &req.user_id).await?;
    state.metrics.record(Action::Repost);
    Ok(Json(reposted))
}

pub async fn share_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShareState>> {
    let shared = state.engine.engagement.share(id).await?;
    state.metrics.record(Action::Share);
    Ok(Json(shared))
}

pub async fn view_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<ViewOutcome>> {
    let outcome = state.engine.engagement.record_view(id, &req.user_id).await?;
    if outcome.counted {
        state.metrics.record(Action::View);
    }
    Ok(Json(outcome))
}

/// Live posts sharing the post's category or a tag.
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(state.engine.feed.recommendations(id).await?))
}

#[instrument(skip(state, req), fields(user = %req.user_id))]
pub async fn report_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReportRequest>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let report = state
        .engine
        .reports
        .file(id, &req.user_id, &req.reason)
        .await?;
    state.metrics.record(Action::Report);
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn home_feed(State(state): State<AppState>) -> ApiResult<Json<HomeFeed>> {
    Ok(Json(state.engine.feed.home().await?))
}

pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<CategorySummary>>> {
    Ok(Json(state.engine.feed.categories().await?))
}

pub async fn author_stats(
    State(state): State<AppState>,
    Path(author): Path<UserId>,
) -> ApiResult<Json<AuthorStats>> {
    state.engine.users.require(&author).await?;
    Ok(Json(state.engine.feed.author_stats(&author).await?))
}
