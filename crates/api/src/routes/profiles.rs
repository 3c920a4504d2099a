//! Profile routes for the logged-in account.
//!
//! A profile exists only after email verification, so a 404 here is how
//! clients learn the account has not finished onboarding.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::profile::{ProfileResponse, UpdateProfileRequest};
use persistence::changes::ChangeEvent;
use persistence::repositories::ProfileRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_change_published;

/// Fetch the caller's profile.
///
/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profiles = ProfileRepository::new(state.pool.clone());
    let profile = profiles
        .find_by_user_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(domain::models::AccountProfile::from(profile).into()))
}

/// Update the caller's profile. Membership pointers are not editable here;
/// they only move through hub operations.
///
/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    request.validate()?;

    let profiles = ProfileRepository::new(state.pool.clone());
    let profile = profiles
        .update_profile(
            auth.user_id,
            request.display_name.as_deref(),
            request.gender,
            request.age,
            request.avatar_index,
            request.notifications_enabled,
            request.family_alerts_enabled,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    state.changes.publish(ChangeEvent::Profile {
        user_id: auth.user_id,
    });
    record_change_published("profiles");

    Ok(Json(domain::models::AccountProfile::from(profile).into()))
}
