//! Assistant routes: chat, voice-memo extraction, and the daily care line.

use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use domain::models::assistant::{
    CareLineResponse, ChatRequest, ChatResponse, ExtractRequest, ExtractResponse,
};
use domain::models::profile::ProfilePublic;
use persistence::repositories::{HubRepository, MedicationRepository, ProfileRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::hubs::hub_ops;
use crate::services::assistant::{
    AssistantError, AssistantService, AudioClip, ChatContext, CARE_LINE_FALLBACK,
};

fn map_assistant_error(err: AssistantError) -> ApiError {
    match err {
        AssistantError::Disabled => {
            ApiError::ServiceUnavailable("Assistant is not available".to_string())
        }
        AssistantError::Provider(msg) => {
            ApiError::ServiceUnavailable(format!("Assistant request failed: {}", msg))
        }
        AssistantError::ExtractionFailed => ApiError::Validation(
            "Could not extract a medication from the recording".to_string(),
        ),
        AssistantError::EmptyRoster => {
            ApiError::Validation("Hub has no members to assign the medication to".to_string())
        }
    }
}

/// Resolve the caller's active hub and its member roster.
async fn member_roster(
    state: &AppState,
    user_id: Uuid,
) -> Result<(Uuid, Vec<ProfilePublic>), ApiError> {
    let profiles = ProfileRepository::new(state.pool.clone());
    let profile = profiles
        .find_by_user_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let hub_id = profile
        .hub_id
        .ok_or_else(|| ApiError::Forbidden("Not an active member of a hub".to_string()))?;

    let hubs = HubRepository::new(state.pool.clone());
    let hub = hubs
        .find_by_id(hub_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hub not found".to_string()))?;

    let roster = hub_ops(state)
        .roster(&hub.members)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((hub_id, roster))
}

/// Builds the caller's chat context: who they are and what is on their
/// family's board.
async fn chat_context(state: &AppState, user_id: Uuid) -> Result<ChatContext, ApiError> {
    let profiles = ProfileRepository::new(state.pool.clone());
    let profile: domain::models::AccountProfile = profiles
        .find_by_user_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?
        .into();

    let mut medications = Vec::new();
    if let Some(hub_id) = profile.hub_id {
        let board = MedicationRepository::new(state.pool.clone())
            .list_by_hub(hub_id)
            .await?;
        medications = board
            .into_iter()
            .map(|m| format!("{} {} at {}", m.name, m.dosage, m.time))
            .collect();
    }

    Ok(ChatContext {
        display_name: profile.display_name,
        age: profile.age,
        gender: Some(profile.gender.as_str().to_string()),
        medications,
    })
}

/// Free-form caregiver chat, grounded in the caller's profile and board.
///
/// POST /api/v1/assistant/chat
pub async fn chat(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    request.validate()?;

    let context = chat_context(&state, auth.user_id).await?;

    let reply = AssistantService::new(state.assistant.as_ref())
        .chat(context, request.history, request.message)
        .await
        .map_err(map_assistant_error)?;

    Ok(Json(ChatResponse { reply }))
}

/// Turn a recorded voice memo into a medication draft with the assignee
/// resolved against the caller's hub roster.
///
/// POST /api/v1/assistant/extract
pub async fn extract(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    request.validate()?;

    let (_, roster) = member_roster(&state, auth.user_id).await?;

    let clip = AudioClip {
        mime_type: request.mime_type,
        data: request.audio,
    };
    let draft = AssistantService::new(state.assistant.as_ref())
        .extract(clip, &roster)
        .await
        .map_err(map_assistant_error)?;

    Ok(Json(draft))
}

/// Today's care line for the caller. Generated at most once per account per
/// day; falls back to a fixed message when the provider is unavailable.
///
/// GET /api/v1/assistant/care-line
pub async fn care_line(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<CareLineResponse>, ApiError> {
    let (_, roster) = member_roster(&state, auth.user_id).await?;
    let names: Vec<String> = roster.into_iter().map(|p| p.display_name).collect();

    let message = AssistantService::new(state.assistant.as_ref())
        .care_line(&state.care_line, auth.user_id, Utc::now().date_naive(), &names)
        .await;

    Ok(Json(CareLineResponse { message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_assistant_maps_to_service_unavailable() {
        let err = map_assistant_error(AssistantError::Disabled);
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_extraction_failure_maps_to_validation() {
        let err = map_assistant_error(AssistantError::ExtractionFailed);
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_care_line_fallback_is_nonempty() {
        assert!(!CARE_LINE_FALLBACK.is_empty());
    }
}
