use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    Envelope, GenerateRequest, HistoryItem, ListEnvelope, OneRepMaxRequest, OneRepMaxResponse,
    WorkoutPlanResponse,
};
use super::{repo, services};
use crate::{
    auth::AuthUser,
    calculators::one_rep_max::{one_rep_max, training_weights},
    error::{AppError, AppResult},
    extract::ValidatedJson,
    state::AppState,
};

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/workout/generate", post(generate))
        .route("/workout/plan", get(get_plan))
        .route("/workout/plan/deactivate", patch(deactivate_plan))
        .route("/workout/history", get(history))
        .route("/workout/predefined-plans", get(list_predefined))
        .route("/workout/predefined-plans/:id/adopt", post(adopt_predefined))
}

pub fn calculator_routes() -> Router<AppState> {
    Router::new().route("/workout/one-rep-max", post(calculate_one_rep_max))
}

#[instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<GenerateRequest>,
) -> AppResult<(StatusCode, Json<Envelope<WorkoutPlanResponse>>)> {
    let plan =
        services::generate_for_user(&state, user_id, &payload.archetype, payload.training_days)
            .await?;
    Ok((StatusCode::CREATED, Json(Envelope::success(plan.into()))))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Envelope<WorkoutPlanResponse>>> {
    let plan = repo::active_plan_for_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active workout plan".into()))?;
    Ok(Json(Envelope::success(plan.into())))
}

#[instrument(skip(state))]
pub async fn deactivate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Value>> {
    let plan_id = services::deactivate(&state, user_id).await?;
    info!(%user_id, %plan_id, "plan deactivated");
    Ok(Json(json!({
        "status": "success",
        "message": "Workout plan deactivated",
        "planId": plan_id,
    })))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ListEnvelope<HistoryItem>>> {
    let rows = repo::list_history(&state.db, user_id).await?;
    Ok(Json(ListEnvelope::success(
        rows.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state))]
pub async fn list_predefined(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> AppResult<Json<ListEnvelope<WorkoutPlanResponse>>> {
    let plans = repo::list_predefined(&state.db).await?;
    Ok(Json(ListEnvelope::success(
        plans.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state))]
pub async fn adopt_predefined(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Envelope<WorkoutPlanResponse>>)> {
    let plan = services::adopt_predefined(&state, user_id, id).await?;
    Ok((StatusCode::CREATED, Json(Envelope::success(plan.into()))))
}

#[instrument(skip(payload))]
pub async fn calculate_one_rep_max(
    AuthUser(_user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<OneRepMaxRequest>,
) -> AppResult<Json<OneRepMaxResponse>> {
    let max = one_rep_max(payload.weight, payload.reps).map_err(|e| {
        warn!(error = %e, "one rep max rejected");
        AppError::BadRequest(e.to_string())
    })?;
    Ok(Json(OneRepMaxResponse {
        one_rep_max: max,
        training_weights: training_weights(max),
    }))
}
