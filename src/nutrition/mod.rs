//! Calorie and macro calculators plus the caller's stored nutrition profile.

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::calculator_routes())
        .merge(handlers::profile_routes())
}
