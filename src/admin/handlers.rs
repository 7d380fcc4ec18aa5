use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument};
use uuid::Uuid;
use validator::Validate;

use super::audit::{self, AuditAction};
use super::dto::{AuditPage, AuditQuery, CreatePlanRequest, UpdatePlanRequest};
use super::form::PlanForm;
use super::services;
use crate::{
    auth::{dto::PublicUser, repo_types::User, AdminUser},
    error::{AppError, AppResult},
    images::services::MAX_IMAGE_BYTES,
    state::AppState,
    workouts::{
        dto::{Envelope, ListEnvelope, WorkoutPlanResponse},
        repo,
    },
};

/// Headroom over the image cap for the JSON part of a multipart form.
const PLAN_FORM_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/plans", get(list_plans).post(create_plan))
        .route("/admin/plans/:id", put(update_plan).delete(delete_plan))
        .layer(DefaultBodyLimit::max(PLAN_FORM_LIMIT))
}

pub fn oversight_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/audit-logs", get(audit_logs))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
) -> AppResult<Json<ListEnvelope<PublicUser>>> {
    let users = User::list_all(&state.db).await?;
    audit::record_on_pool(&state.db, admin_id, AuditAction::ViewUsers, None, json!({})).await?;
    Ok(Json(ListEnvelope::success(
        users.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state, form))]
pub async fn create_plan(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    form: PlanForm<CreatePlanRequest>,
) -> AppResult<(StatusCode, Json<Envelope<WorkoutPlanResponse>>)> {
    form.data.validate()?;
    let plan = services::create_plan(&state, admin_id, form.data, form.image).await?;
    Ok((StatusCode::CREATED, Json(Envelope::success(plan.into()))))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
) -> AppResult<Json<ListEnvelope<WorkoutPlanResponse>>> {
    let plans = repo::list_predefined(&state.db).await?;
    audit::record_on_pool(&state.db, admin_id, AuditAction::ViewPlans, None, json!({})).await?;
    Ok(Json(ListEnvelope::success(
        plans.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state, form))]
pub async fn update_plan(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    form: PlanForm<UpdatePlanRequest>,
) -> AppResult<Json<Envelope<WorkoutPlanResponse>>> {
    form.data.check()?;
    if form.data.is_empty() && form.image.is_none() {
        return Err(AppError::BadRequest("No updatable fields supplied".into()));
    }
    let plan = services::update_plan(&state, admin_id, id, form.data, form.image).await?;
    Ok(Json(Envelope::success(plan.into())))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Envelope<Option<Value>>>> {
    services::delete_plan(&state, admin_id, id).await?;
    Ok(Json(Envelope::success(None)))
}

#[instrument(skip(state))]
pub async fn audit_logs(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Query(q): Query<AuditQuery>,
) -> AppResult<Json<AuditPage>> {
    let filter = q.filter();
    let (rows, count) = audit::list(&state.db, filter).await.map_err(|e| {
        error!(error = %e, "audit log query failed");
        AppError::from(e)
    })?;
    audit::record_on_pool(
        &state.db,
        admin_id,
        AuditAction::ViewAuditLogs,
        None,
        json!({ "action": q.action, "adminId": q.admin_id, "page": filter.page }),
    )
    .await?;
    Ok(Json(AuditPage::new(rows, count, &filter)))
}
