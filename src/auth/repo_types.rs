use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 hash; None for Google-only accounts
    pub google_id: Option<String>,
    pub is_admin: bool,
    pub active_plan_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}
