use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{HistoryRow, PlanDraft, PlanSource, Session, WorkoutPlanRow};

const PLAN_COLUMNS: &str = r#"
    id, source, plan_name, program_theme, prioritized_muscles, neutral_points,
    weak_points, training_days, sessions, is_active, image_key, created_by,
    last_modified, request_params, created_at
"#;

/// Who a new plan row belongs to and where it came from.
#[derive(Debug, Clone, Copy)]
pub struct PlanOrigin<'a> {
    pub source: PlanSource,
    /// None for predefined templates.
    pub owner_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub image_key: Option<&'a str>,
}

pub async fn insert_plan(
    conn: &mut PgConnection,
    draft: &PlanDraft,
    origin: PlanOrigin<'_>,
) -> Result<WorkoutPlanRow, sqlx::Error> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        r#"
        INSERT INTO workout_plans (
            source, plan_name, program_theme, prioritized_muscles, neutral_points,
            weak_points, training_days, sessions, image_key, owner_id, created_by,
            last_modified, request_params, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                CASE WHEN $1 = 'predefined'::plan_source THEN now() END,
                $12, COALESCE($13, now()))
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(origin.source)
    .bind(&draft.plan_name)
    .bind(&draft.program_theme)
    .bind(&draft.prioritized_muscles)
    .bind(&draft.neutral_points)
    .bind(&draft.weak_points)
    .bind(draft.training_days)
    .bind(Json(&draft.sessions))
    .bind(origin.image_key)
    .bind(origin.owner_id)
    .bind(origin.created_by)
    .bind(draft.request_params.as_ref().map(Json))
    .bind(draft.created_at)
    .fetch_one(conn)
    .await
}

pub async fn active_plan_for_user(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Option<WorkoutPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
          FROM workout_plans
         WHERE id = (SELECT active_plan_id FROM users WHERE id = $1)
        "#
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Admin-curated templates (no owner), newest first.
pub async fn list_predefined(db: &PgPool) -> Result<Vec<WorkoutPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
          FROM workout_plans
         WHERE source = 'predefined' AND owner_id IS NULL
         ORDER BY created_at DESC
        "#
    ))
    .fetch_all(db)
    .await
}

pub async fn find_predefined(db: &PgPool, id: Uuid) -> Result<Option<WorkoutPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
          FROM workout_plans
         WHERE id = $1 AND source = 'predefined' AND owner_id IS NULL
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Allow-listed partial update of a template. `None` keeps the column.
#[derive(Debug, Default)]
pub struct PlanPatch {
    pub plan_name: Option<String>,
    pub program_theme: Option<String>,
    pub prioritized_muscles: Option<Vec<String>>,
    pub neutral_points: Option<Vec<String>>,
    pub weak_points: Option<Vec<String>>,
    pub training_days: Option<i32>,
    pub sessions: Option<Vec<Session>>,
    pub image_key: Option<String>,
}

pub async fn update_predefined(
    conn: &mut PgConnection,
    id: Uuid,
    patch: &PlanPatch,
) -> Result<Option<WorkoutPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        r#"
        UPDATE workout_plans
           SET plan_name = COALESCE($2, plan_name),
               program_theme = COALESCE($3, program_theme),
               prioritized_muscles = COALESCE($4, prioritized_muscles),
               neutral_points = COALESCE($5, neutral_points),
               weak_points = COALESCE($6, weak_points),
               training_days = COALESCE($7, training_days),
               sessions = COALESCE($8, sessions),
               image_key = COALESCE($9, image_key),
               last_modified = now()
         WHERE id = $1 AND source = 'predefined' AND owner_id IS NULL
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&patch.plan_name)
    .bind(&patch.program_theme)
    .bind(&patch.prioritized_muscles)
    .bind(&patch.neutral_points)
    .bind(&patch.weak_points)
    .bind(patch.training_days)
    .bind(patch.sessions.as_ref().map(Json))
    .bind(&patch.image_key)
    .fetch_optional(conn)
    .await
}

pub async fn delete_predefined(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<WorkoutPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, WorkoutPlanRow>(&format!(
        r#"
        DELETE FROM workout_plans
         WHERE id = $1 AND source = 'predefined' AND owner_id IS NULL
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn image_in_use(db: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
    let (used,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM workout_plans WHERE image_key = $1)")
            .bind(key)
            .fetch_one(db)
            .await?;
    Ok(used)
}

/// Closes the user's current plan (if any) into history. Returns its id.
pub async fn deactivate_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    let previous: Option<(Option<Uuid>,)> =
        sqlx::query_as("SELECT active_plan_id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((Some(plan_id),)) = previous else {
        return Ok(None);
    };

    sqlx::query("UPDATE workout_plans SET is_active = false WHERE id = $1")
        .bind(plan_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "UPDATE workout_history SET completed_at = now() WHERE user_id = $1 AND completed_at IS NULL",
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("UPDATE users SET active_plan_id = NULL WHERE id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(Some(plan_id))
}

/// Makes `plan` the user's active plan, retiring whatever was active.
pub async fn activate_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    plan: &WorkoutPlanRow,
) -> Result<(), sqlx::Error> {
    deactivate_for_user(&mut *conn, user_id).await?;

    sqlx::query("UPDATE workout_plans SET is_active = true WHERE id = $1")
        .bind(plan.id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE users SET active_plan_id = $2 WHERE id = $1")
        .bind(user_id)
        .bind(plan.id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("INSERT INTO workout_history (user_id, plan_id, plan_name) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(plan.id)
        .bind(&plan.plan_name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_history(db: &PgPool, user_id: Uuid) -> Result<Vec<HistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT id, plan_id, plan_name, started_at, completed_at
          FROM workout_history
         WHERE user_id = $1
         ORDER BY started_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
