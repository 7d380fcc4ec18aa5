use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::dto::{
    CreateProfileRequest, MacrosRequest, MacrosResponse, MetricsRequest, MetricsResponse,
    ProfileEnvelope, UpdateProfileRequest, ALLOWED_UPDATES,
};
use super::repo::{load_profile, store_profile};
use super::repo_types::NutritionProfile;
use crate::{
    auth::AuthUser,
    calculators::{
        calories::{bmr, daily_calories, tdee},
        macros::{macros_for_goal, macros_for_split},
    },
    error::{AppError, AppResult},
    extract::{json_rejection, ValidatedJson},
    state::AppState,
};

pub fn calculator_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/nutrition-metrics", post(nutrition_metrics))
        .route("/nutrition/calculate-macros", post(calculate_macros))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/create-profile", post(create_profile))
        .route("/nutrition/update-profile", patch(update_profile))
        .route("/nutrition/get-profile", get(get_profile))
}

#[instrument(skip(payload))]
pub async fn nutrition_metrics(
    AuthUser(_user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<MetricsRequest>,
) -> AppResult<Json<MetricsResponse>> {
    let goal = payload.goal.unwrap_or_default();
    let base = bmr(payload.gender, payload.weight, payload.height, payload.age);
    let calorie_target = daily_calories(
        payload.gender,
        payload.weight,
        payload.height,
        payload.age,
        payload.activity_level,
        goal,
    );
    Ok(Json(MetricsResponse {
        bmr: base.round(),
        tdee: tdee(base, payload.activity_level).round(),
        goal,
        calorie_target,
        macros: macros_for_goal(calorie_target as f64, goal),
    }))
}

#[instrument(skip(payload))]
pub async fn calculate_macros(
    AuthUser(_user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<MacrosRequest>,
) -> AppResult<Json<MacrosResponse>> {
    let calories = payload.calories as f64;
    // an explicit split wins over the goal preset
    let (macros, goal) = match payload.split {
        Some(split) => (macros_for_split(calories, split), None),
        None => {
            let goal = payload.goal.unwrap_or_default();
            (macros_for_goal(calories, goal), Some(goal))
        }
    };
    Ok(Json(MacrosResponse {
        calories: payload.calories,
        split: payload.split,
        goal,
        macros,
    }))
}

fn profile_not_found(message: &str) -> AppError {
    AppError::NotFound(message.into())
}

#[instrument(skip(state, payload))]
pub async fn create_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateProfileRequest>,
) -> AppResult<Json<ProfileEnvelope>> {
    let profile = NutritionProfile::from(payload);
    if !store_profile(&state.db, user_id, &profile).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(%user_id, goal = ?profile.goal, "nutrition profile saved");
    Ok(Json(ProfileEnvelope {
        success: true,
        data: profile,
    }))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> AppResult<Json<ProfileEnvelope>> {
    let Json(fields) = body.map_err(json_rejection)?;
    if let Some(key) = fields.keys().find(|k| !ALLOWED_UPDATES.contains(&k.as_str())) {
        warn!(%user_id, %key, "profile update with disallowed key");
        return Err(AppError::BadRequest("Invalid updates!".into()));
    }
    let update: UpdateProfileRequest = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::invalid("body", e.to_string()))?;
    update.validate()?;

    let mut profile = load_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| profile_not_found("User not found"))?
        .ok_or_else(|| profile_not_found("Nutrition profile not found. Create one first."))?;
    update.apply(&mut profile);
    store_profile(&state.db, user_id, &profile).await?;

    info!(%user_id, "nutrition profile updated");
    Ok(Json(ProfileEnvelope {
        success: true,
        data: profile,
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProfileEnvelope>> {
    let profile = load_profile(&state.db, user_id)
        .await?
        .flatten()
        .ok_or_else(|| profile_not_found("Nutrition profile not found"))?;
    Ok(Json(ProfileEnvelope {
        success: true,
        data: profile,
    }))
}
