use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Router,
};
use tracing::{error, instrument};

use super::services::{is_servable_key, presign};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/*key", get(serve_upload))
}

/// 307 to a short-lived presigned URL. Public so `<img>` tags work.
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Redirect> {
    if !is_servable_key(&key) {
        return Err(AppError::NotFound("Image not found".into()));
    }
    let url = presign(&state, &key).await.map_err(|e| {
        error!(error = ?e, %key, "presign failed");
        AppError::Internal(e)
    })?;
    Ok(Redirect::temporary(&url))
}
