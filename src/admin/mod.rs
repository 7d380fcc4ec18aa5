//! Admin panel: predefined plan curation, user listing and the audit trail.

use crate::state::AppState;
use axum::Router;

pub mod audit;
pub mod dto;
pub mod form;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::plan_routes())
        .merge(handlers::oversight_routes())
}
