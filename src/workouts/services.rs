use serde_json::json;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::repo::{self, PlanOrigin};
use super::repo_types::{PlanDraft, PlanSource, WorkoutPlanRow};
use crate::error::{AppError, AppResult};
use crate::generator::{parser::parse_workout_plan, prompt::build_prompt};
use crate::state::AppState;

/// Persists `draft` and makes it the user's only active plan, in one
/// transaction.
pub async fn save_as_active(
    state: &AppState,
    user_id: Uuid,
    draft: &PlanDraft,
    source: PlanSource,
    image_key: Option<&str>,
) -> AppResult<WorkoutPlanRow> {
    let mut tx = state.db.begin().await?;
    let origin = PlanOrigin {
        source,
        owner_id: Some(user_id),
        created_by: Some(user_id),
        image_key,
    };
    let mut plan = repo::insert_plan(&mut *tx, draft, origin).await?;
    repo::activate_for_user(&mut *tx, user_id, &plan).await?;
    tx.commit().await?;

    plan.is_active = true;
    Ok(plan)
}

#[instrument(skip(state))]
pub async fn generate_for_user(
    state: &AppState,
    user_id: Uuid,
    archetype: &str,
    training_days: i32,
) -> AppResult<WorkoutPlanRow> {
    let archetype = archetype.trim();
    let request_data = json!({ "archetype": archetype, "trainingDays": training_days });

    let days = u8::try_from(training_days)
        .map_err(|_| AppError::invalid("trainingDays", "Training days must be between 3 and 6"))?;
    let prompt = build_prompt(archetype, days);

    let completion = state
        .completions
        .complete(&prompt)
        .await
        .map_err(|e| e.with_request_data(request_data))?;

    let mut draft = parse_workout_plan(&completion).map_err(|e| {
        error!(error = %e, completion_id = ?completion.id, "unparseable plan reply");
        e
    })?;
    if let Some(params) = draft.request_params.as_mut() {
        params.archetype = Some(archetype.to_string());
    }

    let plan = save_as_active(state, user_id, &draft, PlanSource::Ai, None).await?;
    info!(%user_id, plan_id = %plan.id, sessions = plan.sessions.len(), "ai plan activated");
    Ok(plan)
}

/// Copies a predefined template into a plan owned by the user and
/// activates it. The template itself is never mutated.
#[instrument(skip(state))]
pub async fn adopt_predefined(
    state: &AppState,
    user_id: Uuid,
    template_id: Uuid,
) -> AppResult<WorkoutPlanRow> {
    let template = repo::find_predefined(&state.db, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan not found".into()))?;

    let draft = PlanDraft {
        plan_name: template.plan_name.clone(),
        program_theme: template.program_theme.clone(),
        prioritized_muscles: template.prioritized_muscles.clone(),
        neutral_points: template.neutral_points.clone(),
        weak_points: template.weak_points.clone(),
        training_days: template.training_days,
        sessions: template.sessions.0.clone(),
        created_at: None,
        request_params: None,
    };
    let plan = save_as_active(
        state,
        user_id,
        &draft,
        PlanSource::Predefined,
        template.image_key.as_deref(),
    )
    .await?;
    info!(%user_id, %template_id, plan_id = %plan.id, "predefined plan adopted");
    Ok(plan)
}

#[instrument(skip(state))]
pub async fn deactivate(state: &AppState, user_id: Uuid) -> AppResult<Uuid> {
    let mut tx = state.db.begin().await?;
    let closed = repo::deactivate_for_user(&mut *tx, user_id).await?;
    tx.commit().await?;
    closed.ok_or_else(|| AppError::NotFound("No active workout plan".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn generation_failure_carries_request_data() {
        let state = AppState::fake();
        let err = generate_for_user(&state, Uuid::nil(), " Goku ", 4)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        match err {
            AppError::WorkoutGeneration(e) => {
                assert_eq!(e.request_data["archetype"], "Goku");
                assert_eq!(e.request_data["trainingDays"], 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
