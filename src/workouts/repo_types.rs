use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::extract::not_blank;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "plan_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Ai,
    Predefined,
}

/// A substitute movement; same shape as an exercise minus its own alternates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AlternateExercise {
    #[validate(custom(function = "not_blank", message = "Exercise name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "Minimum 1 set required"))]
    pub sets: i32,
    #[validate(custom(function = "not_blank", message = "Rep range is required"))]
    pub rep_range: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[validate(custom(function = "not_blank", message = "Exercise name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "Minimum 1 set required"))]
    pub sets: i32,
    /// "10", "8-12", "AMRAP", "30s", "400m" ...
    #[validate(custom(function = "not_blank", message = "Rep range is required"))]
    pub rep_range: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate]
    pub alternates: Vec<AlternateExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[validate(range(min = 1, message = "Session order starts at 1"))]
    pub session_order: i32,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[validate(length(min = 1, message = "Each session must contain at least 1 exercise"))]
    #[validate]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub plan_name: Option<String>,
    pub training_days: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,
}

/// Plan content before it is persisted, produced by the AI parser or the
/// admin form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub plan_name: String,
    pub program_theme: String,
    pub prioritized_muscles: Vec<String>,
    pub neutral_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub training_days: i32,
    pub sessions: Vec<Session>,
    pub created_at: Option<OffsetDateTime>,
    pub request_params: Option<RequestParams>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkoutPlanRow {
    pub id: Uuid,
    pub source: PlanSource,
    pub plan_name: String,
    pub program_theme: String,
    pub prioritized_muscles: Vec<String>,
    pub neutral_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub training_days: i32,
    pub sessions: Json<Vec<Session>>,
    pub is_active: bool,
    pub image_key: Option<String>,
    pub created_by: Option<Uuid>,
    pub last_modified: Option<OffsetDateTime>,
    pub request_params: Option<Json<RequestParams>>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub started_at: OffsetDateTime,
    pub completed_at: Option<OffsetDateTime>,
}
