use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::dto::{CommentCreated, CommentRequest, CommentView, CommentsDeleted, ReactRequest, UserAction};
use crate::error::ApiResult;
use crate::metrics::Action;
use crate::AppState;

#[instrument(skip(state, req), fields(user = %req.user_id))]
pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentCreated>)> {
    let added = state
        .engine
        .comments
        .add_comment(post_id, &req.user_id, &req.content, req.parent_comment_id)
        .await?;
    state.metrics.record(Action::Comment);
    Ok((
        StatusCode::CREATED,
        Json(CommentCreated {
            comment: added.comment.into(),
            comment_count: added.comment_count,
        }),
    ))
}

/// Active comments, flat, in insertion order.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let comments = state.engine.comments.flat(post_id).await?;
    Ok(Json(comments.into_iter().map(CommentView::from).collect()))
}

#[instrument(skip(state, req), fields(user = %req.user_id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UserAction>,
) -> ApiResult<Json<CommentsDeleted>> {
    let outcome = state
        .engine
        .comments
        .delete_comment(post_id, comment_id, &req.user_id)
        .await?;
    state.metrics.record(Action::DeleteComment);
    Ok(Json(outcome.into()))
}

pub async fn react_to_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ReactRequest>,
) -> ApiResult<Json<CommentView>> {
    let comment = state
        .engine
        .comments
        .react(post_id, comment_id, &req.user_id, req.kind)
        .await?;
    state.metrics.record(Action::React);
    Ok(Json(comment.into()))
}
