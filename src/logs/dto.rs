use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::repo_types::{ExerciseLog, WorkoutLogRow};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    /// Limit clamped to 1..=100, offset to >= 0.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogRequest {
    #[validate(range(min = 1, message = "Session order must be at least 1"))]
    pub session_order: i32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    #[serde(default)]
    #[validate]
    pub exercises: Vec<ExerciseLog>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogResponse {
    pub id: Uuid,
    pub session_order: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub exercises: Vec<ExerciseLog>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<WorkoutLogRow> for WorkoutLogResponse {
    fn from(row: WorkoutLogRow) -> Self {
        Self {
            id: row.id,
            session_order: row.session_order,
            date: row.date,
            exercises: row.exercises.0,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn negative_sets_are_reported_with_paths() {
        let req: WorkoutLogRequest = serde_json::from_str(
            r#"{
                "sessionOrder": 0,
                "date": "2024-05-01T07:30:00Z",
                "exercises": [
                    { "name": "Squat", "performedSets": [{ "reps": 5, "weight": 100 }] },
                    { "name": "Row", "performedSets": [{ "reps": -1, "weight": 60 }] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(req.date.unwrap().unix_timestamp(), 1_714_548_600);

        let AppError::Validation(fields) = req.validate().unwrap_err().into() else {
            panic!("expected validation error");
        };
        let params: Vec<_> = fields.iter().map(|f| f.param.as_str()).collect();
        assert_eq!(
            params,
            vec!["exercises[1].performedSets[0].reps", "sessionOrder"]
        );
    }

    #[test]
    fn pagination_is_clamped() {
        let p: Pagination = serde_json::from_str(r#"{"limit": 1000, "offset": -5}"#).unwrap();
        assert_eq!(p.clamped(), (100, 0));
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.clamped(), (20, 0));
    }
}
