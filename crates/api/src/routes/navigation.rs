//! Navigation routing for clients.
//!
//! Clients report the screen they are on and get back where to go, based on
//! the caller's membership state. Keeping the rules server-side means every
//! client version agrees on where approval, decline, and dissolution land
//! the user.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use domain::services::lifecycle::{redirect_for_profile, Screen};
use persistence::repositories::ProfileRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    /// Screen the client is currently showing.
    pub screen: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    /// Where the client should go, or null to stay put.
    pub redirect: Option<Screen>,
}

/// Resolve the redirect for the caller's current screen.
///
/// POST /api/v1/navigation/route
pub async fn route(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let screen: Screen = request
        .screen
        .parse()
        .map_err(|_| ApiError::Validation(format!("Unknown screen: {}", request.screen)))?;

    let profiles = ProfileRepository::new(state.pool.clone());
    let profile = profiles
        .find_by_user_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let redirect = redirect_for_profile(screen, &profile.into());

    Ok(Json(RouteResponse { redirect }))
}
