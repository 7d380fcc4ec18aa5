use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RequestConfig {
    pub url: String,
    pub method: String,
}

/// Upstream failure while talking to the completion endpoint. Serialized
/// as the `details` object of the 502 response.
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
    pub request_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_config: Option<RequestConfig>,
}

impl GenerationError {
    pub fn with_request_data(mut self, data: Value) -> Self {
        self.request_data = data;
        self
    }
}

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("completion has no choices")]
    NoChoices,
    #[error("completion message has no content")]
    MissingContent,
    #[error("reply is not a valid plan document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("session {order} breaks plan rules: {errors}")]
    InvalidSession { order: i32, errors: ValidationErrors },
}
