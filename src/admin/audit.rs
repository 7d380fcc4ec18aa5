use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreatePlan,
    UpdatePlan,
    DeletePlan,
    ViewPlans,
    ViewUsers,
    ViewAuditLogs,
    Login,
}

#[derive(Debug, Clone, FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub action: AuditAction,
    pub target_id: Option<Uuid>,
    pub metadata: Json<Value>,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub admin_id: Option<Uuid>,
    pub page: i64,
    pub limit: i64,
}

/// Append one entry. Audit rows are never updated. Writes pass their own
/// transaction so the entry commits together with the change it describes.
pub async fn record(
    conn: &mut PgConnection,
    admin_id: Uuid,
    action: AuditAction,
    target_id: Option<Uuid>,
    metadata: Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (admin_id, action, target_id, metadata)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(admin_id)
    .bind(action)
    .bind(target_id)
    .bind(Json(metadata))
    .execute(conn)
    .await?;
    Ok(())
}

/// [`record`] on its own pooled connection, for actions that change nothing
/// else (views, logins).
pub async fn record_on_pool(
    db: &PgPool,
    admin_id: Uuid,
    action: AuditAction,
    target_id: Option<Uuid>,
    metadata: Value,
) -> Result<(), sqlx::Error> {
    let mut conn = db.acquire().await?;
    record(&mut *conn, admin_id, action, target_id, metadata).await
}

/// Newest first, with the admin's name/email joined in. Returns the page
/// and the total number of matching rows.
pub async fn list(db: &PgPool, f: AuditFilter) -> Result<(Vec<AuditRow>, i64), sqlx::Error> {
    let offset = (f.page - 1).max(0) * f.limit;
    let rows = sqlx::query_as::<_, AuditRow>(
        r#"
        SELECT a.id, a.admin_id, u.name AS admin_name, u.email AS admin_email,
               a.action, a.target_id, a.metadata, a.timestamp
          FROM audit_logs a
          LEFT JOIN users u ON u.id = a.admin_id
         WHERE ($1::audit_action IS NULL OR a.action = $1)
           AND ($2::uuid IS NULL OR a.admin_id = $2)
         ORDER BY a.timestamp DESC
         LIMIT $3 OFFSET $4
        "#,
    )
    .bind(f.action)
    .bind(f.admin_id)
    .bind(f.limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
          FROM audit_logs a
         WHERE ($1::audit_action IS NULL OR a.action = $1)
           AND ($2::uuid IS NULL OR a.admin_id = $2)
        "#,
    )
    .bind(f.action)
    .bind(f.admin_id)
    .fetch_one(db)
    .await?;

    Ok((rows, count))
}
