//! Workout plans: AI generation, predefined templates, activation history
//! and the strength calculators exposed alongside them.

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::plan_routes())
        .merge(handlers::calculator_routes())
}
