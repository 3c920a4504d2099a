//! Navigation policy driven by membership state.
//!
//! Clients report where they are; this decides where a signed-in account with
//! the given membership state belongs. Membership changes land through the
//! live feed, so a member whose join request is approved while sitting on the
//! waiting screen gets repointed to the dashboard without any client logic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::profile::{AccountProfile, MembershipState};

/// Every screen a client can report. Wire values are kebab-case slugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Home,
    Login,
    Signup,
    HubSelection,
    EmailVerification,
    CreateHub,
    JoinHub,
    Dashboard,
    WaitingApproval,
    RequestDeclined,
    ForgotPassword,
    Profile,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Login => "login",
            Screen::Signup => "signup",
            Screen::HubSelection => "hub-selection",
            Screen::EmailVerification => "email-verification",
            Screen::CreateHub => "create-hub",
            Screen::JoinHub => "join-hub",
            Screen::Dashboard => "dashboard",
            Screen::WaitingApproval => "waiting-approval",
            Screen::RequestDeclined => "request-declined",
            Screen::ForgotPassword => "forgot-password",
            Screen::Profile => "profile",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Screen::Home),
            "login" => Ok(Screen::Login),
            "signup" => Ok(Screen::Signup),
            "hub-selection" => Ok(Screen::HubSelection),
            "email-verification" => Ok(Screen::EmailVerification),
            "create-hub" => Ok(Screen::CreateHub),
            "join-hub" => Ok(Screen::JoinHub),
            "dashboard" => Ok(Screen::Dashboard),
            "waiting-approval" => Ok(Screen::WaitingApproval),
            "request-declined" => Ok(Screen::RequestDeclined),
            "forgot-password" => Ok(Screen::ForgotPassword),
            "profile" => Ok(Screen::Profile),
            _ => Err(format!("Invalid screen: {}", s)),
        }
    }
}

/// Screens an active member is pulled away from, onto the dashboard.
const MEMBER_SOURCES: &[Screen] = &[
    Screen::Home,
    Screen::HubSelection,
    Screen::Login,
    Screen::Signup,
    Screen::WaitingApproval,
    Screen::JoinHub,
    Screen::RequestDeclined,
    Screen::ForgotPassword,
];

/// Screens a pending requester is pulled away from, onto the waiting screen.
/// Note waiting-approval itself is not a source here, so the pending user is
/// left in place.
const PENDING_SOURCES: &[Screen] = &[
    Screen::Home,
    Screen::HubSelection,
    Screen::Login,
    Screen::Signup,
    Screen::JoinHub,
    Screen::RequestDeclined,
    Screen::ForgotPassword,
];

/// Returns where the client should go next, or None to stay put.
pub fn redirect_target(current: Screen, state: &MembershipState) -> Option<Screen> {
    match state {
        MembershipState::ActiveMember(_) => {
            if MEMBER_SOURCES.contains(&current) {
                Some(Screen::Dashboard)
            } else {
                None
            }
        }
        MembershipState::PendingApproval(_) => {
            if PENDING_SOURCES.contains(&current) {
                Some(Screen::WaitingApproval)
            } else {
                None
            }
        }
        MembershipState::NoHub => match current {
            // The request was declined or the hub dissolved while waiting.
            Screen::WaitingApproval => Some(Screen::RequestDeclined),
            Screen::Login | Screen::Signup => Some(Screen::HubSelection),
            _ => None,
        },
    }
}

/// Convenience wrapper taking the stored profile directly.
pub fn redirect_for_profile(current: Screen, profile: &AccountProfile) -> Option<Screen> {
    redirect_target(current, &profile.membership_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const ALL_SCREENS: &[Screen] = &[
        Screen::Home,
        Screen::Login,
        Screen::Signup,
        Screen::HubSelection,
        Screen::EmailVerification,
        Screen::CreateHub,
        Screen::JoinHub,
        Screen::Dashboard,
        Screen::WaitingApproval,
        Screen::RequestDeclined,
        Screen::ForgotPassword,
        Screen::Profile,
    ];

    #[test]
    fn test_active_member_is_pulled_to_dashboard() {
        let state = MembershipState::ActiveMember(Uuid::new_v4());
        assert_eq!(
            redirect_target(Screen::WaitingApproval, &state),
            Some(Screen::Dashboard)
        );
        assert_eq!(
            redirect_target(Screen::Login, &state),
            Some(Screen::Dashboard)
        );
        // Already there, or on a screen members may use freely.
        assert_eq!(redirect_target(Screen::Dashboard, &state), None);
        assert_eq!(redirect_target(Screen::Profile, &state), None);
        assert_eq!(redirect_target(Screen::CreateHub, &state), None);
    }

    #[test]
    fn test_pending_requester_waits() {
        let state = MembershipState::PendingApproval(Uuid::new_v4());
        assert_eq!(
            redirect_target(Screen::JoinHub, &state),
            Some(Screen::WaitingApproval)
        );
        assert_eq!(redirect_target(Screen::WaitingApproval, &state), None);
        assert_eq!(redirect_target(Screen::Profile, &state), None);
    }

    #[test]
    fn test_declined_requester_lands_on_declined_screen() {
        let state = MembershipState::NoHub;
        assert_eq!(
            redirect_target(Screen::WaitingApproval, &state),
            Some(Screen::RequestDeclined)
        );
    }

    #[test]
    fn test_no_hub_after_login_goes_to_selection() {
        let state = MembershipState::NoHub;
        assert_eq!(
            redirect_target(Screen::Login, &state),
            Some(Screen::HubSelection)
        );
        assert_eq!(
            redirect_target(Screen::Signup, &state),
            Some(Screen::HubSelection)
        );
        assert_eq!(redirect_target(Screen::HubSelection, &state), None);
        assert_eq!(redirect_target(Screen::JoinHub, &state), None);
    }

    #[test]
    fn test_redirect_is_idempotent() {
        // Following a redirect once must land on a screen with no further
        // redirect for the same state.
        let states = [
            MembershipState::NoHub,
            MembershipState::PendingApproval(Uuid::new_v4()),
            MembershipState::ActiveMember(Uuid::new_v4()),
        ];
        for state in &states {
            for &screen in ALL_SCREENS {
                if let Some(target) = redirect_target(screen, state) {
                    assert_eq!(
                        redirect_target(target, state),
                        None,
                        "redirect from {} via {} is not a fixed point",
                        screen,
                        target
                    );
                }
            }
        }
    }

    #[test]
    fn test_screen_round_trip() {
        for &screen in ALL_SCREENS {
            assert_eq!(screen.as_str().parse::<Screen>().unwrap(), screen);
        }
        assert!("unknown".parse::<Screen>().is_err());
    }
}
