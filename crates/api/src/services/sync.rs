//! Live sync session logic.
//!
//! A session tracks what one connected client is watching: its own profile,
//! always; and the hub named by that profile's pointer, whenever one is set.
//! Feed events are filtered against those targets, and a profile change
//! repoints the hub watch, so approval, decline, and dissolution reach the
//! client as plain "re-read this" notices with no client-side bookkeeping.

use serde::Serialize;
use uuid::Uuid;

use persistence::changes::ChangeEvent;

/// What a session tells its client to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SyncUpdate {
    /// The client's own profile changed; membership may have moved.
    ProfileChanged,
    /// The watched hub's roster or metadata changed.
    HubChanged { hub_id: Uuid },
    /// The watched hub no longer exists.
    HubDissolved { hub_id: Uuid },
    /// The watched hub's medication board changed.
    BoardChanged { hub_id: Uuid },
}

impl SyncUpdate {
    /// SSE event name for this update.
    pub fn event_name(&self) -> &'static str {
        match self {
            SyncUpdate::ProfileChanged => "profile_changed",
            SyncUpdate::HubChanged { .. } => "hub_changed",
            SyncUpdate::HubDissolved { .. } => "hub_dissolved",
            SyncUpdate::BoardChanged { .. } => "board_changed",
        }
    }
}

/// One client's view of the change feed.
#[derive(Debug, Clone)]
pub struct SyncSession {
    user_id: Uuid,
    /// Hub being watched: the profile's hub_id or pending_hub_id.
    watched_hub: Option<Uuid>,
}

impl SyncSession {
    /// Opens a session from the profile's current pointers.
    pub fn new(user_id: Uuid, hub_id: Option<Uuid>, pending_hub_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            watched_hub: hub_id.or(pending_hub_id),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn watched_hub(&self) -> Option<Uuid> {
        self.watched_hub
    }

    /// Repoint the hub watch after the profile was re-read. Keeps the watch
    /// when the pointer is unchanged, moves it when membership moved, and
    /// tears it down when the profile left both pointers behind.
    pub fn repoint(&mut self, hub_id: Option<Uuid>, pending_hub_id: Option<Uuid>) {
        self.watched_hub = hub_id.or(pending_hub_id);
    }

    /// Filter one feed event down to an update for this client, mutating the
    /// watch target when the watched hub disappears.
    pub fn apply(&mut self, event: &ChangeEvent) -> Option<SyncUpdate> {
        match *event {
            ChangeEvent::Profile { user_id } if user_id == self.user_id => {
                Some(SyncUpdate::ProfileChanged)
            }
            ChangeEvent::Profile { .. } => None,
            ChangeEvent::Hub { hub_id, deleted } if Some(hub_id) == self.watched_hub => {
                if deleted {
                    self.watched_hub = None;
                    Some(SyncUpdate::HubDissolved { hub_id })
                } else {
                    Some(SyncUpdate::HubChanged { hub_id })
                }
            }
            ChangeEvent::Hub { .. } => None,
            ChangeEvent::Medications { hub_id } if Some(hub_id) == self.watched_hub => {
                Some(SyncUpdate::BoardChanged { hub_id })
            }
            ChangeEvent::Medications { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_profile_change_is_delivered() {
        let user_id = Uuid::new_v4();
        let mut session = SyncSession::new(user_id, None, None);

        assert_eq!(
            session.apply(&ChangeEvent::Profile { user_id }),
            Some(SyncUpdate::ProfileChanged)
        );
        assert_eq!(
            session.apply(&ChangeEvent::Profile {
                user_id: Uuid::new_v4()
            }),
            None
        );
    }

    #[test]
    fn test_watches_active_hub() {
        let hub_id = Uuid::new_v4();
        let mut session = SyncSession::new(Uuid::new_v4(), Some(hub_id), None);

        assert_eq!(
            session.apply(&ChangeEvent::Medications { hub_id }),
            Some(SyncUpdate::BoardChanged { hub_id })
        );
        assert_eq!(
            session.apply(&ChangeEvent::Hub {
                hub_id,
                deleted: false
            }),
            Some(SyncUpdate::HubChanged { hub_id })
        );
        // Other hubs stay silent
        assert_eq!(
            session.apply(&ChangeEvent::Medications {
                hub_id: Uuid::new_v4()
            }),
            None
        );
    }

    #[test]
    fn test_pending_hub_is_watched_for_roster_changes() {
        let hub_id = Uuid::new_v4();
        let mut session = SyncSession::new(Uuid::new_v4(), None, Some(hub_id));

        assert_eq!(
            session.apply(&ChangeEvent::Hub {
                hub_id,
                deleted: false
            }),
            Some(SyncUpdate::HubChanged { hub_id })
        );
    }

    #[test]
    fn test_dissolution_tears_down_hub_watch() {
        let hub_id = Uuid::new_v4();
        let mut session = SyncSession::new(Uuid::new_v4(), Some(hub_id), None);

        assert_eq!(
            session.apply(&ChangeEvent::Hub {
                hub_id,
                deleted: true
            }),
            Some(SyncUpdate::HubDissolved { hub_id })
        );
        assert_eq!(session.watched_hub(), None);
        // Later board events for the dead hub are dropped
        assert_eq!(session.apply(&ChangeEvent::Medications { hub_id }), None);
    }

    #[test]
    fn test_repoint_moves_watch_after_approval() {
        let pending = Uuid::new_v4();
        let mut session = SyncSession::new(Uuid::new_v4(), None, Some(pending));
        assert_eq!(session.watched_hub(), Some(pending));

        // Approval flips the profile pointers from pending to active
        session.repoint(Some(pending), None);
        assert_eq!(session.watched_hub(), Some(pending));

        // Leaving clears both
        session.repoint(None, None);
        assert_eq!(session.watched_hub(), None);
    }

    #[test]
    fn test_active_pointer_wins_over_pending() {
        let active = Uuid::new_v4();
        let pending = Uuid::new_v4();
        let session = SyncSession::new(Uuid::new_v4(), Some(active), Some(pending));
        assert_eq!(session.watched_hub(), Some(active));
    }
}
