use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;
use crate::extract::json_rejection;
use crate::images::services::UploadItem;

/// Image part of a plan form.
pub struct ImageUpload {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn as_item(&self) -> UploadItem<'_> {
        UploadItem {
            body: self.body.clone(),
            content_type: &self.content_type,
            file_name: self.file_name.as_deref(),
        }
    }
}

/// Plan payload sent either as a JSON body or as multipart with a
/// `planData` JSON part and an optional `image` file. Validation is left
/// to the handler because create and update apply different rules.
pub struct PlanForm<T> {
    pub data: T,
    pub image: Option<ImageUpload>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

#[async_trait]
impl<T, S> FromRequest<S> for PlanForm<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let axum::Json(data) = axum::Json::<T>::from_request(req, state)
                .await
                .map_err(json_rejection)?;
            return Ok(PlanForm { data, image: None });
        }

        let mut mp = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut data = None;
        let mut image = None;
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().map(|s| s.to_string());
            match name.as_deref() {
                Some("planData") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    let parsed = serde_json::from_str::<T>(&text)
                        .map_err(|e| AppError::invalid("planData", e.to_string()))?;
                    data = Some(parsed);
                }
                Some("image") => {
                    let content_type = field
                        .content_type()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "application/octet-stream".into());
                    let file_name = field.file_name().map(|s| s.to_string());
                    let body = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    image = Some(ImageUpload {
                        body,
                        content_type,
                        file_name,
                    });
                }
                other => debug!(field = ?other, "ignoring multipart field"),
            }
        }

        let data = data.ok_or_else(|| AppError::invalid("planData", "planData is required"))?;
        Ok(PlanForm { data, image })
    }
}
