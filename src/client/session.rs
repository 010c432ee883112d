//! Session state as a pure reducer, published through watch/broadcast channels.

use crate::modules::auth::dto::UserResponse;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// No check has completed yet.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub status: AuthStatus,
    pub profile: Option<UserResponse>,
    pub checking: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.role.is_admin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    NoToken,
    /// The server rejected the token and the refresh.
    Rejected,
    RetriesExhausted,
    UserLogout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CheckStarted,
    /// A check ended without a verdict (cancelled); auth state is kept.
    CheckAborted,
    ProfileLoaded(UserResponse),
    SignedOut { reason: SignOutReason },
    LoginFailed(String),
}

pub fn reduce(state: &SessionState, event: &SessionEvent) -> SessionState {
    match event {
        SessionEvent::CheckStarted => SessionState {
            checking: true,
            ..state.clone()
        },
        SessionEvent::CheckAborted => SessionState {
            checking: false,
            ..state.clone()
        },
        SessionEvent::ProfileLoaded(profile) => SessionState {
            status: AuthStatus::Authenticated,
            profile: Some(profile.clone()),
            checking: false,
            error: None,
        },
        SessionEvent::SignedOut { .. } => SessionState {
            status: AuthStatus::Unauthenticated,
            profile: None,
            checking: false,
            error: None,
        },
        SessionEvent::LoginFailed(message) => SessionState {
            status: AuthStatus::Unauthenticated,
            profile: None,
            checking: false,
            error: Some(message.clone()),
        },
    }
}

/// Holds the current [`SessionState`]; every dispatch runs [`reduce`].
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(state),
            events,
        }
    }

    pub fn dispatch(&self, event: SessionEvent) {
        debug!("Session event: {:?}", event);
        self.state.send_modify(|state| *state = reduce(state, &event));
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
pub(crate) fn test_profile(role: crate::modules::auth::model::UserRole) -> UserResponse {
    UserResponse {
        id: uuid::Uuid::new_v4(),
        email: "viewer@example.com".to_string(),
        username: "viewer".to_string(),
        full_name: "Viewer".to_string(),
        role,
        is_verified: true,
        avatar_url: None,
        favorites_count: 2,
        watchlist_count: 1,
        created_at: time::OffsetDateTime::UNIX_EPOCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::model::UserRole;

    #[test]
    fn profile_loaded_authenticates() {
        let profile = test_profile(UserRole::User);
        let checking = reduce(&SessionState::default(), &SessionEvent::CheckStarted);
        assert!(checking.checking);
        assert_eq!(checking.status, AuthStatus::Unknown);

        let state = reduce(&checking, &SessionEvent::ProfileLoaded(profile.clone()));
        assert!(state.is_authenticated());
        assert!(!state.checking);
        assert_eq!(state.profile, Some(profile));
        assert!(!state.is_admin());
    }

    #[test]
    fn sign_out_drops_profile() {
        let state = reduce(
            &SessionState::default(),
            &SessionEvent::ProfileLoaded(test_profile(UserRole::Admin)),
        );
        assert!(state.is_admin());

        let state = reduce(&state, &SessionEvent::SignedOut { reason: SignOutReason::Rejected });
        assert_eq!(state.status, AuthStatus::Unauthenticated);
        assert!(state.profile.is_none());
    }

    #[test]
    fn aborted_check_keeps_auth_state() {
        let state = reduce(
            &SessionState::default(),
            &SessionEvent::ProfileLoaded(test_profile(UserRole::User)),
        );
        let state = reduce(&state, &SessionEvent::CheckStarted);
        let state = reduce(&state, &SessionEvent::CheckAborted);
        assert!(state.is_authenticated());
        assert!(state.profile.is_some());
        assert!(!state.checking);
    }

    #[test]
    fn login_failure_records_message() {
        let state = reduce(&SessionState::default(), &SessionEvent::LoginFailed("Invalid email or password".into()));
        assert_eq!(state.status, AuthStatus::Unauthenticated);
        assert_eq!(state.error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn store_publishes_state_and_events() {
        let store = SessionStore::new();
        let mut state_rx = store.subscribe();
        let mut events = store.events();

        store.dispatch(SessionEvent::SignedOut { reason: SignOutReason::NoToken });

        assert!(state_rx.has_changed().unwrap());
        assert_eq!(state_rx.borrow_and_update().status, AuthStatus::Unauthenticated);
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut { reason: SignOutReason::NoToken }
        );
        assert_eq!(store.snapshot().status, AuthStatus::Unauthenticated);
    }
}
