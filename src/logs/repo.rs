use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ExerciseLog, WorkoutLogRow};

impl WorkoutLogRow {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        session_order: i32,
        date: Option<OffsetDateTime>,
        exercises: &[ExerciseLog],
    ) -> Result<WorkoutLogRow, sqlx::Error> {
        sqlx::query_as::<_, WorkoutLogRow>(
            r#"
            INSERT INTO workout_logs (user_id, session_order, date, exercises)
            VALUES ($1, $2, COALESCE($3, now()), $4)
            RETURNING id, session_order, date, exercises, created_at
            "#,
        )
        .bind(user_id)
        .bind(session_order)
        .bind(date)
        .bind(Json(exercises))
        .fetch_one(db)
        .await
    }

    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkoutLogRow>, sqlx::Error> {
        sqlx::query_as::<_, WorkoutLogRow>(
            r#"
            SELECT id, session_order, date, exercises, created_at
              FROM workout_logs
             WHERE user_id = $1
             ORDER BY date DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn find(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WorkoutLogRow>, sqlx::Error> {
        sqlx::query_as::<_, WorkoutLogRow>(
            r#"
            SELECT id, session_order, date, exercises, created_at
              FROM workout_logs
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Full replacement of the caller's log. `None` if it is not theirs.
    pub async fn replace(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        session_order: i32,
        date: Option<OffsetDateTime>,
        exercises: &[ExerciseLog],
    ) -> Result<Option<WorkoutLogRow>, sqlx::Error> {
        sqlx::query_as::<_, WorkoutLogRow>(
            r#"
            UPDATE workout_logs
               SET session_order = $3,
                   date = COALESCE($4, date),
                   exercises = $5
             WHERE id = $1 AND user_id = $2
            RETURNING id, session_order, date, exercises, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(session_order)
        .bind(date)
        .bind(Json(exercises))
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM workout_logs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
