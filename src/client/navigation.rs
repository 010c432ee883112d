//! Route guarding driven by session state changes.

use super::session::{AuthStatus, SessionState, SessionStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const LOGIN_ROUTE: &str = "/auth/login";
pub const HOME_ROUTE: &str = "/";

/// Router of the host application.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;

    fn navigate(&self, route: &str);
}

fn under(route: &str, prefix: &str) -> bool {
    route == prefix
        || route
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}

/// Where the user must be sent from `route`, if anywhere.
pub fn redirect_for(state: &SessionState, route: &str) -> Option<&'static str> {
    match state.status {
        AuthStatus::Unknown => None,
        AuthStatus::Unauthenticated if !under(route, "/auth") => Some(LOGIN_ROUTE),
        AuthStatus::Unauthenticated => None,
        AuthStatus::Authenticated if under(route, "/auth") => Some(HOME_ROUTE),
        AuthStatus::Authenticated if under(route, "/admin") && !state.is_admin() => Some(HOME_ROUTE),
        AuthStatus::Authenticated => None,
    }
}

pub struct NavigationEffects;

impl NavigationEffects {
    /// Applies [`redirect_for`] after every state change until cancelled.
    pub fn spawn(store: &SessionStore, navigator: Arc<dyn Navigator>, cancel: CancellationToken) -> JoinHandle<()> {
        let mut state_rx = store.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let state = state_rx.borrow_and_update().clone();
                let route = navigator.current_route();
                match redirect_for(&state, &route) {
                    Some(target) if target != route => {
                        info!("Redirecting {} -> {}", route, target);
                        navigator.navigate(target);
                    }
                    _ => debug!("No redirect for {}", route),
                }
            }
        })
    }
}
