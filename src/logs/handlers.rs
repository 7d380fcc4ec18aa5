use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{Pagination, WorkoutLogRequest, WorkoutLogResponse};
use super::repo_types::WorkoutLogRow;
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::ValidatedJson,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/workout/logs", get(list_logs).post(create_log))
        .route(
            "/workout/logs/:id",
            get(get_log).put(update_log).delete(delete_log),
        )
}

fn log_not_found() -> AppError {
    AppError::NotFound("Workout log not found".into())
}

#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<WorkoutLogResponse>>> {
    let (limit, offset) = p.clamped();
    let rows = WorkoutLogRow::list_by_user(&state.db, user_id, limit, offset).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<WorkoutLogRequest>,
) -> AppResult<(StatusCode, Json<WorkoutLogResponse>)> {
    let row = WorkoutLogRow::create(
        &state.db,
        user_id,
        payload.session_order,
        payload.date,
        &payload.exercises,
    )
    .await?;
    info!(%user_id, log_id = %row.id, "workout logged");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn get_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WorkoutLogResponse>> {
    let row = WorkoutLogRow::find(&state.db, user_id, id)
        .await?
        .ok_or_else(log_not_found)?;
    Ok(Json(row.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<WorkoutLogRequest>,
) -> AppResult<Json<WorkoutLogResponse>> {
    let row = WorkoutLogRow::replace(
        &state.db,
        user_id,
        id,
        payload.session_order,
        payload.date,
        &payload.exercises,
    )
    .await?
    .ok_or_else(log_not_found)?;
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !WorkoutLogRow::delete(&state.db, user_id, id).await? {
        return Err(log_not_found());
    }
    info!(%user_id, log_id = %id, "workout log deleted");
    Ok(Json(json!({ "message": "Workout log deleted" })))
}
