//! Live sync over Server-Sent Events.
//!
//! Each connected client holds one [`SyncSession`] fed from the process-wide
//! change feed. The feed itself carries only identities; this handler turns
//! each relevant event into a fresh snapshot read (profile, hub with rosters,
//! or the time-ordered board) so clients render exactly what a direct GET
//! would return. A lagged receiver gets a single `resync` event telling the
//! client to reload everything.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use uuid::Uuid;

use domain::models::medication::MedicationResponse;
use domain::models::profile::ProfileResponse;
use persistence::repositories::{MedicationRepository, ProfileRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_sync_sessions;
use crate::routes::hubs::hub_ops;
use crate::services::sync::{SyncSession, SyncUpdate};

fn data_event<T: Serialize>(name: &'static str, payload: &T) -> Event {
    let base = Event::default().event(name);
    match serde_json::to_string(payload) {
        Ok(json) => base.data(json),
        Err(_) => base.data("{}"),
    }
}

/// Resolve one session update to the snapshot the client should render.
/// A failed snapshot read degrades to the identity-only event so the client
/// can fall back to a direct GET.
async fn snapshot_event(state: &AppState, session: &mut SyncSession, update: SyncUpdate) -> Event {
    let name = update.event_name();
    match update {
        SyncUpdate::ProfileChanged => {
            let profiles = ProfileRepository::new(state.pool.clone());
            match profiles.find_by_user_id(session.user_id()).await {
                Ok(Some(entity)) => {
                    // Membership pointers may have moved; the hub watch
                    // follows the fresh row.
                    session.repoint(entity.hub_id, entity.pending_hub_id);
                    let profile: domain::models::AccountProfile = entity.into();
                    data_event(name, &ProfileResponse::from(profile))
                }
                Ok(None) | Err(_) => data_event(name, &update),
            }
        }
        SyncUpdate::HubChanged { hub_id } => {
            match hub_ops(state).hub_detail(session.user_id(), hub_id).await {
                Ok(detail) => data_event(name, &detail),
                Err(err) => {
                    debug!(error = %err, hub_id = %hub_id, "Hub snapshot read failed");
                    data_event(name, &update)
                }
            }
        }
        SyncUpdate::HubDissolved { .. } => data_event(name, &update),
        SyncUpdate::BoardChanged { hub_id } => {
            let medications = MedicationRepository::new(state.pool.clone());
            match medications.list_by_hub(hub_id).await {
                Ok(entries) => {
                    let today = Utc::now().date_naive();
                    let board: Vec<MedicationResponse> = entries
                        .into_iter()
                        .map(|e| MedicationResponse::derived(e.into(), today))
                        .collect();
                    data_event(name, &board)
                }
                Err(err) => {
                    debug!(error = %err, hub_id = %hub_id, "Board snapshot read failed");
                    data_event(name, &update)
                }
            }
        }
    }
}

/// Subscribe to change notifications for the caller's profile and hub.
///
/// GET /api/v1/sync/events
pub async fn events(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let profiles = ProfileRepository::new(state.pool.clone());
    let profile = profiles
        .find_by_user_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let session = SyncSession::new(auth.user_id, profile.hub_id, profile.pending_hub_id);
    let rx = state.changes.subscribe();
    record_sync_sessions(state.changes.subscriber_count());

    debug!(user_id = %auth.user_id, watched_hub = ?session.watched_hub(), "Sync session opened");

    let opening = stream::once(async { Ok(Event::default().event("connected").data("{}")) });

    let updates = stream::unfold(
        (session, rx, state),
        |(mut session, mut rx, state)| async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let Some(update) = session.apply(&change) else {
                            continue;
                        };
                        let event = snapshot_event(&state, &mut session, update).await;
                        return Some((Ok(event), (session, rx, state)));
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!(missed, "Sync session lagged, requesting resync");
                        let event = Event::default().event("resync").data("{}");
                        return Some((Ok(event), (session, rx, state)));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );

    Ok(Sse::new(opening.chain(updates)).keep_alive(KeepAlive::default()))
}
