//! Per-session workout logs owned by the caller.

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use handlers::router;
