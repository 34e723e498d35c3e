use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{FollowToggle, Notification, NotificationPage, ProfileSync, UserId, UserProfile};
use services::{Connection, MarkedRead, ProfileView};
use tracing::instrument;
use uuid::Uuid;

use crate::dto::{ConnectionsParams, FollowRequest, SyncUserRequest, ViewerParams};
use crate::error::ApiResult;
use crate::metrics::Action;
use crate::AppState;

#[instrument(skip(state, req), fields(user = %req.user_id))]
pub async fn sync_user(
    State(state): State<AppState>,
    Json(req): Json<SyncUserRequest>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .engine
        .users
        .sync(ProfileSync {
            id: req.user_id,
            name: req.name,
            handle: req.handle,
        })
        .await?;
    Ok(Json(profile))
}

pub async fn directory(
    State(state): State<AppState>,
    Query(params): Query<ViewerParams>,
) -> ApiResult<Json<Vec<ProfileView>>> {
    let rows = state
        .engine
        .users
        .directory(params.viewer_id.as_ref())
        .await?;
    Ok(Json(rows))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Query(params): Query<ViewerParams>,
) -> ApiResult<Json<ProfileView>> {
    let view = state
        .engine
        .users
        .profile(&id, params.viewer_id.as_ref())
        .await?;
    Ok(Json(view))
}

/// Toggles `viewerId` following the user in the path.
#[instrument(skip(state, req), fields(follower = %req.viewer_id))]
pub async fn follow_user(
    State(state): State<AppState>,
    Path(followee): Path<UserId>,
    Json(req): Json<FollowRequest>,
) -> ApiResult<Json<FollowToggle>> {
    let outcome = state
        .engine
        .follows
        .toggle_follow(&req.viewer_id, &followee)
        .await?;
    state.metrics.record(Action::Follow);
    Ok(Json(outcome))
}

pub async fn connections(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Query(params): Query<ConnectionsParams>,
) -> ApiResult<Json<Vec<Connection>>> {
    let rows = state
        .engine
        .follows
        .connections(&id, params.kind, params.viewer_id.as_ref())
        .await?;
    Ok(Json(rows))
}

pub async fn notifications(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<NotificationPage>> {
    Ok(Json(state.engine.notifications.list(&id).await?))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((id, notification_id)): Path<(UserId, Uuid)>,
) -> ApiResult<Json<Notification>> {
    let notification = state
        .engine
        .notifications
        .mark_read(&id, notification_id)
        .await?;
    Ok(Json(notification))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<MarkedRead>> {
    Ok(Json(state.engine.notifications.mark_all_read(&id).await?))
}
