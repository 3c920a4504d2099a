//! Hub membership routes: create, join, approve, decline, cancel, leave.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::hub::{
    CreateHubRequest, CreateHubResponse, HubDetail, JoinHubRequest, JoinHubResponse,
};
use domain::services::policy::PolicyError;
use persistence::repositories::{HubRepository, ProfileRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::auth::MessageResponse;
use crate::services::hub_ops::{HubOperations, HubOpsError};

pub(crate) fn hub_ops(state: &AppState) -> HubOperations {
    HubOperations::new(
        HubRepository::new(state.pool.clone()),
        ProfileRepository::new(state.pool.clone()),
        state.changes.clone(),
    )
}

fn map_hub_error(err: HubOpsError) -> ApiError {
    match err {
        HubOpsError::ProfileNotFound => ApiError::NotFound("Profile not found".to_string()),
        HubOpsError::HubNotFound => ApiError::NotFound("Hub not found".to_string()),
        HubOpsError::InvalidJoinCode => ApiError::NotFound("Invalid join code".to_string()),
        HubOpsError::JoinCodeExpired => ApiError::Gone("This join code has expired".to_string()),
        HubOpsError::AlreadyInHub => {
            ApiError::Conflict("Already a member of a hub".to_string())
        }
        HubOpsError::NoPendingRequest => {
            ApiError::NotFound("No pending request for this hub".to_string())
        }
        HubOpsError::Denied(policy) => match policy {
            PolicyError::NotMember => {
                ApiError::Forbidden("Not a member of this hub".to_string())
            }
            PolicyError::NotCreator => {
                ApiError::Forbidden("Only the hub creator can do this".to_string())
            }
            PolicyError::NotOwner => {
                ApiError::Forbidden("Only the entry's creator can do this".to_string())
            }
        },
        HubOpsError::DatabaseError(db_err) => ApiError::from(db_err),
    }
}

/// Create a hub with the caller as its first member.
///
/// POST /api/v1/hubs
pub async fn create_hub(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateHubRequest>,
) -> Result<(StatusCode, Json<CreateHubResponse>), ApiError> {
    request.validate()?;

    let hub = hub_ops(&state)
        .create_hub(auth.user_id, &request.name)
        .await
        .map_err(map_hub_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateHubResponse {
            id: hub.id,
            name: hub.name,
            join_code: hub.join_code,
            creator_id: hub.creator_id,
            created_at: hub.created_at,
        }),
    ))
}

/// Request to join a hub by its code. Membership starts pending until the
/// creator approves.
///
/// POST /api/v1/hubs/join
pub async fn join_hub(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<JoinHubRequest>,
) -> Result<Json<JoinHubResponse>, ApiError> {
    request.validate()?;

    let hub = hub_ops(&state)
        .join_hub(auth.user_id, &request.code)
        .await
        .map_err(map_hub_error)?;

    Ok(Json(JoinHubResponse {
        hub_id: hub.id,
        hub_name: hub.name,
        pending: true,
    }))
}

/// Fetch the hub the caller belongs to, or is waiting on, with both rosters
/// resolved to display names.
///
/// GET /api/v1/hubs/current
pub async fn current_hub(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<HubDetail>, ApiError> {
    let profiles = ProfileRepository::new(state.pool.clone());
    let profile = profiles
        .find_by_user_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let hub_id = profile
        .hub_id
        .or(profile.pending_hub_id)
        .ok_or_else(|| ApiError::NotFound("Not in a hub".to_string()))?;

    let detail = hub_ops(&state)
        .hub_detail(auth.user_id, hub_id)
        .await
        .map_err(map_hub_error)?;

    Ok(Json(detail))
}

/// Approve a pending join request. Creator only.
///
/// POST /api/v1/hubs/:hub_id/requests/:user_id/approve
pub async fn approve_request(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((hub_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    hub_ops(&state)
        .approve_request(auth.user_id, hub_id, user_id)
        .await
        .map_err(map_hub_error)?;

    Ok(Json(MessageResponse {
        message: "Request approved".to_string(),
    }))
}

/// Decline a pending join request. Creator only.
///
/// POST /api/v1/hubs/:hub_id/requests/:user_id/decline
pub async fn decline_request(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((hub_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    hub_ops(&state)
        .decline_request(auth.user_id, hub_id, user_id)
        .await
        .map_err(map_hub_error)?;

    Ok(Json(MessageResponse {
        message: "Request declined".to_string(),
    }))
}

/// Withdraw the caller's own pending join request.
///
/// POST /api/v1/hubs/:hub_id/cancel
pub async fn cancel_request(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(hub_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    hub_ops(&state)
        .cancel_request(auth.user_id, hub_id)
        .await
        .map_err(map_hub_error)?;

    Ok(Json(MessageResponse {
        message: "Request cancelled".to_string(),
    }))
}

/// Leave the hub. When the creator leaves, the hub is dissolved and its
/// board deleted; other members keep their profiles pointed at it until
/// they next sync.
///
/// POST /api/v1/hubs/:hub_id/leave
pub async fn leave_hub(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(hub_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    hub_ops(&state)
        .leave_hub(auth.user_id, hub_id)
        .await
        .map_err(map_hub_error)?;

    Ok(Json(MessageResponse {
        message: "Left the hub".to_string(),
    }))
}
