use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::audit::{self, AuditAction};
use super::dto::{CreatePlanRequest, UpdatePlanRequest};
use super::form::ImageUpload;
use crate::error::{AppError, AppResult};
use crate::images::services::{remove_image, store_plan_image};
use crate::state::AppState;
use crate::workouts::repo::{self, PlanOrigin, PlanPatch};
use crate::workouts::repo_types::{PlanDraft, PlanSource, WorkoutPlanRow};

fn plan_not_found() -> AppError {
    AppError::NotFound("Plan not found".into())
}

/// Drops an image no plan points at any more. Runs after commit, so any
/// failure here is logged and the request still succeeds.
async fn release_image(state: &AppState, key: &str) {
    match repo::image_in_use(&state.db, key).await {
        Ok(false) => remove_image(state, key).await,
        Ok(true) => {}
        Err(e) => warn!(error = %e, %key, "image reference check failed, keeping object"),
    }
}

async fn insert_audited(
    state: &AppState,
    admin_id: Uuid,
    draft: &PlanDraft,
    origin: PlanOrigin<'_>,
) -> AppResult<WorkoutPlanRow> {
    let mut tx = state.db.begin().await?;
    let plan = repo::insert_plan(&mut *tx, draft, origin).await?;
    audit::record(
        &mut *tx,
        admin_id,
        AuditAction::CreatePlan,
        Some(plan.id),
        json!({ "planName": plan.plan_name }),
    )
    .await?;
    tx.commit().await?;
    Ok(plan)
}

async fn update_audited(
    state: &AppState,
    admin_id: Uuid,
    id: Uuid,
    patch: &PlanPatch,
    changes: Value,
) -> AppResult<WorkoutPlanRow> {
    let mut tx = state.db.begin().await?;
    let plan = repo::update_predefined(&mut *tx, id, patch)
        .await?
        .ok_or_else(plan_not_found)?;
    audit::record(
        &mut *tx,
        admin_id,
        AuditAction::UpdatePlan,
        Some(plan.id),
        json!({ "changes": changes }),
    )
    .await?;
    tx.commit().await?;
    Ok(plan)
}

#[instrument(skip(state, req, image))]
pub async fn create_plan(
    state: &AppState,
    admin_id: Uuid,
    req: CreatePlanRequest,
    image: Option<ImageUpload>,
) -> AppResult<WorkoutPlanRow> {
    let image_key = match &image {
        Some(img) => Some(store_plan_image(state, img.as_item()).await?),
        None => None,
    };

    let draft = PlanDraft::from(req);
    let origin = PlanOrigin {
        source: PlanSource::Predefined,
        owner_id: None,
        created_by: Some(admin_id),
        image_key: image_key.as_deref(),
    };
    let plan = match insert_audited(state, admin_id, &draft, origin).await {
        Ok(plan) => plan,
        Err(e) => {
            if let Some(key) = &image_key {
                remove_image(state, key).await;
            }
            return Err(e);
        }
    };

    info!(%admin_id, plan_id = %plan.id, "predefined plan created");
    Ok(plan)
}

#[instrument(skip(state, req, image))]
pub async fn update_plan(
    state: &AppState,
    admin_id: Uuid,
    id: Uuid,
    req: UpdatePlanRequest,
    image: Option<ImageUpload>,
) -> AppResult<WorkoutPlanRow> {
    let existing = repo::find_predefined(&state.db, id)
        .await?
        .ok_or_else(plan_not_found)?;

    let new_key = match &image {
        Some(img) => Some(store_plan_image(state, img.as_item()).await?),
        None => None,
    };

    let mut changes = serde_json::to_value(&req).unwrap_or_else(|_| json!({}));
    if let (Some(key), Some(obj)) = (&new_key, changes.as_object_mut()) {
        obj.insert("image".into(), json!(key));
    }

    let patch = req.into_patch(new_key.clone());
    let plan = match update_audited(state, admin_id, id, &patch, changes).await {
        Ok(plan) => plan,
        Err(e) => {
            if let Some(key) = &new_key {
                remove_image(state, key).await;
            }
            return Err(e);
        }
    };

    if new_key.is_some() {
        if let Some(old) = existing.image_key.as_deref() {
            release_image(state, old).await;
        }
    }

    info!(%admin_id, plan_id = %plan.id, "predefined plan updated");
    Ok(plan)
}

#[instrument(skip(state))]
pub async fn delete_plan(state: &AppState, admin_id: Uuid, id: Uuid) -> AppResult<()> {
    let mut tx = state.db.begin().await?;
    let plan = repo::delete_predefined(&mut *tx, id)
        .await?
        .ok_or_else(plan_not_found)?;
    audit::record(
        &mut *tx,
        admin_id,
        AuditAction::DeletePlan,
        Some(plan.id),
        json!({ "planName": plan.plan_name }),
    )
    .await?;
    tx.commit().await?;

    if let Some(key) = plan.image_key.as_deref() {
        release_image(state, key).await;
    }

    info!(%admin_id, plan_id = %plan.id, "predefined plan deleted");
    Ok(())
}
