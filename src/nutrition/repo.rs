use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::NutritionProfile;

/// `None` when the user does not exist, `Some(None)` when they have no
/// profile yet.
pub async fn load_profile(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Option<Option<NutritionProfile>>, sqlx::Error> {
    let row: Option<(Option<Json<NutritionProfile>>,)> =
        sqlx::query_as("SELECT nutrition_profile FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(row.map(|(p,)| p.map(|Json(p)| p)))
}

/// Overwrites the stored profile. Returns false if the user is gone.
pub async fn store_profile(
    db: &PgPool,
    user_id: Uuid,
    profile: &NutritionProfile,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET nutrition_profile = $2 WHERE id = $1")
        .bind(user_id)
        .bind(Json(profile))
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
