use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::repo_types::{HistoryRow, PlanSource, RequestParams, Session, WorkoutPlanRow};
use crate::calculators::one_rep_max::TrainingWeights;
use crate::extract::plain_text;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[validate(
        custom = "plain_text",
        length(max = 100, message = "Archetype cannot exceed 100 characters")
    )]
    pub archetype: String,
    #[validate(range(min = 3, max = 6, message = "Training days must be between 3 and 6"))]
    pub training_days: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OneRepMaxRequest {
    #[validate(range(min = 0.01, message = "Weight must be a positive number"))]
    pub weight: f64,
    #[validate(range(min = 1, max = 10, message = "Reps must be between 1 and 10"))]
    pub reps: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OneRepMaxResponse {
    pub one_rep_max: f64,
    pub training_weights: TrainingWeights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetadata {
    pub created_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_modified: Option<OffsetDateTime>,
    pub request_params: Option<RequestParams>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanResponse {
    pub id: Uuid,
    pub source: PlanSource,
    pub plan_name: String,
    pub program_theme: String,
    pub prioritized_muscles: Vec<String>,
    pub neutral_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub training_days: i32,
    pub sessions: Vec<Session>,
    pub is_active: bool,
    /// Served through `/uploads/{key}`, which redirects to storage.
    pub image_url: Option<String>,
    pub metadata: PlanMetadata,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn upload_url(key: &str) -> String {
    format!("/uploads/{key}")
}

impl From<WorkoutPlanRow> for WorkoutPlanResponse {
    fn from(row: WorkoutPlanRow) -> Self {
        Self {
            id: row.id,
            source: row.source,
            plan_name: row.plan_name,
            program_theme: row.program_theme,
            prioritized_muscles: row.prioritized_muscles,
            neutral_points: row.neutral_points,
            weak_points: row.weak_points,
            training_days: row.training_days,
            sessions: row.sessions.0,
            is_active: row.is_active,
            image_url: row.image_key.as_deref().map(upload_url),
            metadata: PlanMetadata {
                created_by: row.created_by,
                last_modified: row.last_modified,
                request_params: row.request_params.map(|p| p.0),
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub plan_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl From<HistoryRow> for HistoryItem {
    fn from(row: HistoryRow) -> Self {
        Self {
            id: row.id,
            plan_id: row.plan_id,
            plan_name: row.plan_name,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

/// `{status: "success", data}` envelope used by the plan routes.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// Like [`Envelope`] with the item count of a list.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub status: &'static str,
    pub results: usize,
    pub data: Vec<T>,
}

impl<T> ListEnvelope<T> {
    pub fn success(data: Vec<T>) -> Self {
        Self {
            status: "success",
            results: data.len(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workouts::repo_types::Exercise;
    use sqlx::types::Json;

    fn row() -> WorkoutPlanRow {
        WorkoutPlanRow {
            id: Uuid::nil(),
            source: PlanSource::Predefined,
            plan_name: "Push Pull Legs".into(),
            program_theme: "Classic".into(),
            prioritized_muscles: vec!["Chest".into()],
            neutral_points: vec![],
            weak_points: vec![],
            training_days: 3,
            sessions: Json(vec![Session {
                session_order: 1,
                focus_areas: vec!["Push".into()],
                exercises: vec![Exercise {
                    name: "Bench Press".into(),
                    sets: 4,
                    rep_range: "6-8".into(),
                    alternates: vec![],
                }],
                notes: String::new(),
            }]),
            is_active: false,
            image_key: Some("plans/abc.webp".into()),
            created_by: None,
            last_modified: None,
            request_params: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn plan_response_uses_camel_case_and_upload_url() {
        let v = serde_json::to_value(WorkoutPlanResponse::from(row())).unwrap();
        assert_eq!(v["planName"], "Push Pull Legs");
        assert_eq!(v["source"], "predefined");
        assert_eq!(v["imageUrl"], "/uploads/plans/abc.webp");
        assert_eq!(v["sessions"][0]["exercises"][0]["repRange"], "6-8");
        assert!(v["sessions"][0]["exercises"][0].get("alternates").is_none());
        assert_eq!(v["createdAt"], "1970-01-01T00:00:00Z");
        assert!(v["metadata"]["lastModified"].is_null());
    }

    #[test]
    fn generate_request_bounds() {
        let ok: GenerateRequest =
            serde_json::from_str(r#"{"archetype":"Goku","trainingDays":4}"#).unwrap();
        assert!(ok.validate().is_ok());
        let bad: GenerateRequest =
            serde_json::from_str(r#"{"archetype":"<b>Goku</b>","trainingDays":7}"#).unwrap();
        let errs = bad.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("archetype"));
        assert!(errs.field_errors().contains_key("training_days"));
    }
}
