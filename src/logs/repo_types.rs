use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::extract::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct PerformedSet {
    #[validate(range(min = 0, message = "Reps cannot be negative"))]
    pub reps: i32,
    #[validate(range(min = 0.0, message = "Weight cannot be negative"))]
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    #[validate(custom(function = "not_blank", message = "Exercise name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate]
    pub performed_sets: Vec<PerformedSet>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkoutLogRow {
    pub id: Uuid,
    pub session_order: i32,
    pub date: OffsetDateTime,
    pub exercises: Json<Vec<ExerciseLog>>,
    pub created_at: OffsetDateTime,
}
