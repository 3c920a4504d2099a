//! Medication board routes.
//!
//! The board belongs to a hub; every handler resolves the hub first and runs
//! the caller through the capability check before touching an entry. The
//! `taken_today` flag is derived at read time from `last_taken`, so boards
//! reset at midnight without any scheduled job.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use domain::models::medication::{
    CreateMedicationRequest, MedicationResponse, UpdateMedicationRequest,
};
use domain::models::{Hub, MedicationEntry};
use domain::services::policy::{authorize, Capability, PolicyError};
use persistence::changes::ChangeEvent;
use persistence::repositories::{HubRepository, MedicationRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_change_published;
use crate::routes::auth::MessageResponse;

fn map_policy_error(err: PolicyError) -> ApiError {
    match err {
        PolicyError::NotMember => ApiError::Forbidden("Not a member of this hub".to_string()),
        PolicyError::NotCreator => {
            ApiError::Forbidden("Only the hub creator can do this".to_string())
        }
        PolicyError::NotOwner => {
            ApiError::Forbidden("Only the entry's creator can do this".to_string())
        }
    }
}

async fn load_hub(state: &AppState, hub_id: Uuid) -> Result<Hub, ApiError> {
    let hubs = HubRepository::new(state.pool.clone());
    let hub = hubs
        .find_by_id(hub_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hub not found".to_string()))?;
    Ok(hub.into())
}

async fn load_entry(state: &AppState, id: Uuid) -> Result<MedicationEntry, ApiError> {
    let medications = MedicationRepository::new(state.pool.clone());
    let entry = medications
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Medication not found".to_string()))?;
    Ok(entry.into())
}

fn publish_board_change(state: &AppState, hub_id: Uuid) {
    state.changes.publish(ChangeEvent::Medications { hub_id });
    record_change_published("medications");
}

/// List a hub's board, ordered by time of day. Members only.
///
/// GET /api/v1/hubs/:hub_id/medications
pub async fn list_medications(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(hub_id): Path<Uuid>,
) -> Result<Json<Vec<MedicationResponse>>, ApiError> {
    let hub = load_hub(&state, hub_id).await?;
    authorize(Capability::MarkTaken, auth.user_id, &hub, None).map_err(map_policy_error)?;

    let medications = MedicationRepository::new(state.pool.clone());
    let entries = medications.list_by_hub(hub_id).await?;

    let today = Utc::now().date_naive();
    let board = entries
        .into_iter()
        .map(|e| MedicationResponse::derived(e.into(), today))
        .collect();

    Ok(Json(board))
}

/// Add an entry to a hub's board. Members only; the assignee must also be
/// a member.
///
/// POST /api/v1/hubs/:hub_id/medications
pub async fn create_medication(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(hub_id): Path<Uuid>,
    Json(request): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<MedicationResponse>), ApiError> {
    request.validate()?;

    let hub = load_hub(&state, hub_id).await?;
    authorize(Capability::MarkTaken, auth.user_id, &hub, None).map_err(map_policy_error)?;

    if !hub.is_member(request.assigned_to) {
        return Err(ApiError::Validation(
            "Assignee is not a member of this hub".to_string(),
        ));
    }

    let medications = MedicationRepository::new(state.pool.clone());
    let entry = medications
        .create_medication(
            hub_id,
            &request.name,
            &request.dosage,
            &request.time,
            request.assigned_to,
            auth.user_id,
            request.remarks.as_deref(),
            request.image_url.as_deref(),
        )
        .await?;

    publish_board_change(&state, hub_id);

    let today = Utc::now().date_naive();
    Ok((
        StatusCode::CREATED,
        Json(MedicationResponse::derived(entry.into(), today)),
    ))
}

/// Update an entry. Only the member who created it may edit it.
///
/// PUT /api/v1/medications/:id
pub async fn update_medication(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMedicationRequest>,
) -> Result<Json<MedicationResponse>, ApiError> {
    request.validate()?;

    let entry = load_entry(&state, id).await?;
    let hub = load_hub(&state, entry.hub_id).await?;
    authorize(Capability::EditMedication, auth.user_id, &hub, Some(&entry))
        .map_err(map_policy_error)?;

    if let Some(assigned_to) = request.assigned_to {
        if !hub.is_member(assigned_to) {
            return Err(ApiError::Validation(
                "Assignee is not a member of this hub".to_string(),
            ));
        }
    }

    let medications = MedicationRepository::new(state.pool.clone());
    let updated = medications
        .update_medication(
            id,
            auth.user_id,
            request.name.as_deref(),
            request.dosage.as_deref(),
            request.time.as_deref(),
            request.assigned_to,
            request.remarks.as_deref(),
            request.image_url.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Medication not found".to_string()))?;

    publish_board_change(&state, entry.hub_id);

    let today = Utc::now().date_naive();
    Ok(Json(MedicationResponse::derived(updated.into(), today)))
}

/// Delete an entry. Only the member who created it may delete it.
///
/// DELETE /api/v1/medications/:id
pub async fn delete_medication(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let entry = load_entry(&state, id).await?;
    let hub = load_hub(&state, entry.hub_id).await?;
    authorize(
        Capability::DeleteMedication,
        auth.user_id,
        &hub,
        Some(&entry),
    )
    .map_err(map_policy_error)?;

    let medications = MedicationRepository::new(state.pool.clone());
    let deleted = medications.delete_medication(id, auth.user_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Medication not found".to_string()));
    }

    publish_board_change(&state, entry.hub_id);

    Ok(Json(MessageResponse {
        message: "Medication deleted".to_string(),
    }))
}

/// Flip today's taken state. Any member may mark any entry; unmarking
/// clears `last_taken` so the entry shows as due again.
///
/// POST /api/v1/medications/:id/toggle-taken
pub async fn toggle_taken(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<MedicationResponse>, ApiError> {
    let entry = load_entry(&state, id).await?;
    let hub = load_hub(&state, entry.hub_id).await?;
    authorize(Capability::MarkTaken, auth.user_id, &hub, Some(&entry))
        .map_err(map_policy_error)?;

    let now = Utc::now();
    let today = now.date_naive();
    let next = if entry.taken_on(today) { None } else { Some(now) };

    let medications = MedicationRepository::new(state.pool.clone());
    let updated = medications
        .set_taken(id, next)
        .await?
        .ok_or_else(|| ApiError::NotFound("Medication not found".to_string()))?;

    publish_board_change(&state, entry.hub_id);

    Ok(Json(MedicationResponse::derived(updated.into(), today)))
}
