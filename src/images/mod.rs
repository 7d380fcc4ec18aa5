pub mod handlers;
pub mod services;

pub use handlers::router;
