use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{AuditLogEntry, UserId, UserProfile};
use services::{AdminUserView, ReportDecision, ReportOutcome, ReportView};
use tracing::instrument;
use uuid::Uuid;

use crate::dto::{
    ActorParams, AdminStatus, LifecycleResponse, ModerationAction, ModerationRequest,
    NewsletterRequest, NewsletterSent, ReportDecisionRequest, ReportListParams, UserParams,
    VerificationRequest,
};
use crate::error::ApiResult;
use crate::metrics::Action;
use crate::AppState;

#[instrument(skip(state, req), fields(actor = %req.actor_id, action = ?req.action))]
pub async fn moderate_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ModerationRequest>,
) -> ApiResult<Json<LifecycleResponse>> {
    let moderation = &state.engine.moderation;
    let outcome = match req.action {
        ModerationAction::Archive => {
            let reason = req.reason.unwrap_or_default();
            let outcome = moderation.archive(id, &req.actor_id, &reason).await?;
            state.metrics.record(Action::Archive);
            outcome
        }
        ModerationAction::Restore => {
            let outcome = moderation.restore(id, &req.actor_id).await?;
            state.metrics.record(Action::Restore);
            outcome
        }
    };
    Ok(Json(outcome.into()))
}

#[instrument(skip(state, req), fields(actor = %req.actor_id))]
pub async fn set_verification(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<VerificationRequest>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .engine
        .moderation
        .set_verified(&id, &req.actor_id, req.is_verified)
        .await?;
    state.metrics.record(Action::Verify);
    Ok(Json(profile))
}

pub async fn audit_logs(
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    Ok(Json(state.engine.moderation.audit_log(&params.actor_id).await?))
}

pub async fn admin_me(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> ApiResult<Json<AdminStatus>> {
    let is_admin = state.engine.moderation.is_admin(&params.user_id).await?;
    Ok(Json(AdminStatus { is_admin }))
}

#[instrument(skip(state, req), fields(actor = %req.actor_id))]
pub async fn newsletter(
    State(state): State<AppState>,
    Json(req): Json<NewsletterRequest>,
) -> ApiResult<Json<NewsletterSent>> {
    let delivered = state
        .engine
        .moderation
        .broadcast_newsletter(&req.actor_id, &req.message)
        .await?;
    state.metrics.record(Action::Newsletter);
    Ok(Json(NewsletterSent { delivered }))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ActorParams>,
) -> ApiResult<Json<Vec<AdminUserView>>> {
    Ok(Json(state.engine.moderation.list_users(&params.actor_id).await?))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportListParams>,
) -> ApiResult<Json<Vec<ReportView>>> {
    let queue = state
        .engine
        .reports
        .list(&params.actor_id, params.status)
        .await?;
    Ok(Json(queue))
}

#[instrument(skip(state, req), fields(actor = %req.actor_id, decision = ?req.decision))]
pub async fn decide_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReportDecisionRequest>,
) -> ApiResult<Json<ReportOutcome>> {
    let outcome = state
        .engine
        .reports
        .decide(id, &req.actor_id, req.decision, req.reason.as_deref())
        .await?;
    state.metrics.record(match req.decision {
        ReportDecision::Resolve => Action::ResolveReport,
        ReportDecision::Dismiss => Action::DismissReport,
    });
    Ok(Json(outcome))
}
