use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::audit::{AuditAction, AuditFilter, AuditRow};
use crate::error::{AppError, AppResult};
use crate::extract::{not_blank, plain_text};
use crate::workouts::repo::PlanPatch;
use crate::workouts::repo_types::{PlanDraft, Session};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[validate(
        custom = "plain_text",
        length(max = 100, message = "Plan name cannot exceed 100 characters")
    )]
    pub plan_name: String,
    #[validate(custom(function = "not_blank", message = "Program theme is required"))]
    pub program_theme: String,
    #[validate(length(min = 1, message = "At least one prioritized muscle group is required"))]
    pub prioritized_muscles: Vec<String>,
    #[serde(default)]
    pub neutral_points: Vec<String>,
    #[serde(default)]
    pub weak_points: Vec<String>,
    #[validate(range(min = 3, max = 6, message = "Training days must be between 3 and 6"))]
    pub training_days: i32,
    #[validate(length(min = 1, message = "At least one session is required"))]
    #[validate]
    pub sessions: Vec<Session>,
}

impl From<CreatePlanRequest> for PlanDraft {
    fn from(r: CreatePlanRequest) -> Self {
        PlanDraft {
            plan_name: r.plan_name.trim().to_string(),
            program_theme: r.program_theme.trim().to_string(),
            prioritized_muscles: r.prioritized_muscles,
            neutral_points: r.neutral_points,
            weak_points: r.weak_points,
            training_days: r.training_days,
            sessions: r.sessions,
            created_at: None,
            request_params: None,
        }
    }
}

/// Partial update of a predefined plan. Keys outside this struct are
/// ignored, so `source`, owner and timestamps cannot be overwritten.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        custom = "plain_text",
        length(max = 100, message = "Plan name cannot exceed 100 characters")
    )]
    pub plan_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank", message = "Program theme is required"))]
    pub program_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "At least one prioritized muscle group is required"))]
    pub prioritized_muscles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neutral_points: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weak_points: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 3, max = 6, message = "Training days must be between 3 and 6"))]
    pub training_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<Session>>,
}

#[derive(Validate)]
struct SessionList {
    #[validate(length(min = 1, message = "At least one session is required"))]
    #[validate]
    sessions: Vec<Session>,
}

impl UpdatePlanRequest {
    /// Field rules plus the nested session rules when sessions are sent.
    pub fn check(&self) -> AppResult<()> {
        let mut fields = Vec::new();
        let sessions = self.sessions.as_ref().map(|s| SessionList { sessions: s.clone() });
        let results = [
            self.validate(),
            sessions.as_ref().map_or(Ok(()), |s| s.validate()),
        ];
        for res in results {
            if let Err(e) = res {
                if let AppError::Validation(found) = AppError::from(e) {
                    fields.extend(found);
                }
            }
        }
        if fields.is_empty() {
            return Ok(());
        }
        fields.sort_by(|a, b| a.param.cmp(&b.param));
        Err(AppError::Validation(fields))
    }

    pub fn is_empty(&self) -> bool {
        self.plan_name.is_none()
            && self.program_theme.is_none()
            && self.prioritized_muscles.is_none()
            && self.neutral_points.is_none()
            && self.weak_points.is_none()
            && self.training_days.is_none()
            && self.sessions.is_none()
    }

    pub fn into_patch(self, image_key: Option<String>) -> PlanPatch {
        PlanPatch {
            plan_name: self.plan_name.map(|s| s.trim().to_string()),
            program_theme: self.program_theme.map(|s| s.trim().to_string()),
            prioritized_muscles: self.prioritized_muscles,
            neutral_points: self.neutral_points,
            weak_points: self.weak_points,
            training_days: self.training_days,
            sessions: self.sessions,
            image_key,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub action: Option<AuditAction>,
    pub admin_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl AuditQuery {
    pub fn filter(&self) -> AuditFilter {
        AuditFilter {
            action: self.action,
            admin_id: self.admin_id,
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(50).clamp(1, 100),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditAdmin {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogItem {
    pub id: Uuid,
    pub admin: AuditAdmin,
    pub action: AuditAction,
    pub target_id: Option<Uuid>,
    pub metadata: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<AuditRow> for AuditLogItem {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.id,
            admin: AuditAdmin {
                id: row.admin_id,
                name: row.admin_name,
                email: row.admin_email,
            },
            action: row.action,
            target_id: row.target_id,
            metadata: row.metadata.0,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub status: &'static str,
    pub results: i64,
    pub data: Vec<AuditLogItem>,
    pub total_pages: i64,
    pub current_page: i64,
}

impl AuditPage {
    pub fn new(rows: Vec<AuditRow>, count: i64, filter: &AuditFilter) -> Self {
        Self {
            status: "success",
            results: count,
            data: rows.into_iter().map(Into::into).collect(),
            total_pages: (count + filter.limit - 1) / filter.limit,
            current_page: filter.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "planName": "Upper Lower",
        "programTheme": "Strength",
        "prioritizedMuscles": ["Back"],
        "trainingDays": 4,
        "sessions": [{
            "sessionOrder": 1,
            "focusAreas": ["Upper"],
            "exercises": [{ "name": "Pull Up", "sets": 4, "repRange": "AMRAP" }]
        }]
    }"#;

    #[test]
    fn create_plan_rules() {
        let ok: CreatePlanRequest = serde_json::from_str(PLAN).unwrap();
        assert!(ok.validate().is_ok());

        let mut bad: CreatePlanRequest = serde_json::from_str(PLAN).unwrap();
        bad.plan_name = "x".repeat(101);
        bad.training_days = 2;
        bad.prioritized_muscles.clear();
        bad.sessions[0].exercises[0].sets = 0;
        let AppError::Validation(fields) = bad.validate().unwrap_err().into() else {
            panic!("expected validation error");
        };
        let params: Vec<_> = fields.iter().map(|f| f.param.as_str()).collect();
        assert_eq!(
            params,
            vec![
                "planName",
                "prioritizedMuscles",
                "sessions[0].exercises[0].sets",
                "trainingDays",
            ]
        );
    }

    #[test]
    fn update_ignores_unknown_keys_and_checks_sessions() {
        let upd: UpdatePlanRequest =
            serde_json::from_str(r#"{"source": "ai", "ownerId": "x", "trainingDays": 5}"#).unwrap();
        assert!(!upd.is_empty());
        assert!(upd.check().is_ok());
        assert_eq!(
            serde_json::to_value(&upd).unwrap(),
            serde_json::json!({ "trainingDays": 5 })
        );

        let upd: UpdatePlanRequest = serde_json::from_str(r#"{"sessions": []}"#).unwrap();
        let AppError::Validation(fields) = upd.check().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].param, "sessions");
    }

    #[test]
    fn audit_paging_defaults() {
        let q: AuditQuery = serde_json::from_str(r#"{"action": "DELETE_PLAN"}"#).unwrap();
        let f = q.filter();
        assert_eq!(f.action, Some(AuditAction::DeletePlan));
        assert_eq!((f.page, f.limit), (1, 50));
        let page = AuditPage::new(vec![], 101, &f);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 1);
    }
}
