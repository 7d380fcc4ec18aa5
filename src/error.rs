use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::generator::error::{GenerationError, PlanParseError};

/// One entry of the `data` array returned with a 422.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub msg: String,
    pub param: String,
    pub location: &'static str,
}

impl FieldError {
    pub fn body(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            param: param.into(),
            location: "body",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed.")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    Forbidden { message: String, data: Option<Value> },
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Conflict { message: String, data: Option<Value> },
    #[error(transparent)]
    WorkoutGeneration(#[from] GenerationError),
    #[error(transparent)]
    PlanParse(#[from] PlanParseError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn invalid(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::body(param, msg)])
    }

    pub fn admin_required() -> Self {
        Self::Forbidden {
            message: "Administrator privileges required".into(),
            data: Some(json!({ "code": "ADMIN_ACCESS_REQUIRED" })),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::WorkoutGeneration(_) => StatusCode::BAD_GATEWAY,
            AppError::PlanParse(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Vec::new();
        flatten_validation("", &errors, &mut out);
        out.sort_by(|a, b| a.param.cmp(&b.param));
        AppError::Validation(out)
    }
}

/// `validator` reports Rust field names; request bodies use camelCase keys.
fn json_key(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn flatten_validation(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let key = json_key(field);
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    out.push(FieldError::body(path.clone(), msg));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_validation(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::WorkoutGeneration(ref e) = self {
            error!(error = %e, status = ?e.status_code, "workout generation failed");
            let body = Json(json!({
                "status": "error",
                "message": "Workout generation failed",
                "details": e,
            }));
            return (status, body).into_response();
        }

        let (message, data) = match self {
            AppError::Validation(fields) => (
                "Validation failed.".to_string(),
                serde_json::to_value(fields).ok(),
            ),
            AppError::Forbidden { message, data } | AppError::Conflict { message, data } => {
                (message, data)
            }
            AppError::Database(sqlx::Error::RowNotFound) => ("Resource not found".into(), None),
            AppError::Database(e) => {
                error!(error = %e, "database error");
                ("Internal Server Error".into(), None)
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                ("Internal Server Error".into(), None)
            }
            AppError::PlanParse(e) => {
                error!(error = %e, "plan parse error");
                ("Failed to parse workout plan".into(), None)
            }
            other => (other.to_string(), None),
        };

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": message,
            "data": data,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(range(min = 1, message = "Minimum 1 set required"))]
        set_count: i32,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate]
        performed_sets: Vec<Inner>,
    }

    #[test]
    fn validation_errors_flatten_with_json_paths() {
        let value = Outer {
            name: String::new(),
            performed_sets: vec![Inner { set_count: 3 }, Inner { set_count: 0 }],
        };
        let err: AppError = value.validate().unwrap_err().into();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            fields,
            vec![
                FieldError::body("performedSets[1].setCount", "Minimum 1 set required"),
                FieldError::body("name", "Name is required"),
            ]
        );
    }

    #[test]
    fn field_names_become_camel_case() {
        assert_eq!(json_key("session_order"), "sessionOrder");
        assert_eq!(json_key("prioritized_muscles"), "prioritizedMuscles");
        assert_eq!(json_key("name"), "name");
        assert_eq!(json_key("_hidden"), "hidden");
    }

    #[test]
    fn status_codes_follow_variants() {
        assert_eq!(
            AppError::invalid("x", "bad").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::admin_required().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn generation_error_maps_to_bad_gateway_with_details() {
        let err = AppError::WorkoutGeneration(GenerationError {
            message: "upstream said no".into(),
            request_data: json!({ "archetype": "Goku" }),
            response_data: Some(json!({ "error": "quota" })),
            status_code: Some(429),
            request_config: None,
        });
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Workout generation failed");
        assert_eq!(body["details"]["statusCode"], 429);
        assert_eq!(body["details"]["requestData"]["archetype"], "Goku");
    }
}
