//! Routing decisions derived from session and profile state.

use super::UserData;
use crate::session::SessionState;

/// What a guarded page should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthGate {
    /// Session restore still running; render a spinner.
    Loading,
    RedirectToLogin,
    Allow,
}

pub fn auth_gate(state: &SessionState) -> AuthGate {
    if state.loading {
        AuthGate::Loading
    } else if state.user.is_none() {
        AuthGate::RedirectToLogin
    } else {
        AuthGate::Allow
    }
}

/// True once user data loaded and the profile has not finished onboarding.
pub fn needs_onboarding(data: &UserData) -> bool {
    !data.loading
        && data
            .profile
            .as_ref()
            .is_some_and(|profile| !profile.onboarding_complete)
}

#[cfg(test)]
mod tests {
    use super::{auth_gate, needs_onboarding, AuthGate};
    use crate::model::profile::UserProfile;
    use crate::session::{AuthUser, SessionState};
    use crate::view::UserData;

    fn profile(onboarding_complete: bool) -> UserProfile {
        UserProfile {
            uid: "u1".to_string(),
            email: None,
            display_name: String::new(),
            photo_url: None,
            onboarding_complete,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn gate_waits_for_restore_then_requires_user() {
        let mut state = SessionState {
            user: None,
            loading: true,
        };
        assert_eq!(auth_gate(&state), AuthGate::Loading);
        state.loading = false;
        assert_eq!(auth_gate(&state), AuthGate::RedirectToLogin);
        state.user = Some(AuthUser {
            id: "u1".to_string(),
            email: None,
            display_name: None,
            photo_url: None,
        });
        assert_eq!(auth_gate(&state), AuthGate::Allow);
    }

    #[test]
    fn onboarding_redirect_only_after_load() {
        let mut data = UserData {
            profile: Some(profile(false)),
            ..UserData::empty()
        };
        data.loading = true;
        assert!(!needs_onboarding(&data));
        data.loading = false;
        assert!(needs_onboarding(&data));
        data.profile = Some(profile(true));
        assert!(!needs_onboarding(&data));
        data.profile = None;
        assert!(!needs_onboarding(&data));
    }
}
