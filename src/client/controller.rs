//! Periodic token validation, refresh, login and logout.

use super::api::{AuthApi, ClientError};
use super::session::{SessionEvent, SessionStore, SignOutReason};
use super::token_store::TokenStore;
use crate::common::retry::{retry, Backoff, RetryError, RetryPolicy};
use crate::modules::auth::dto::{LoginRequest, UserResponse};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum time between unforced checks.
    pub check_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            retry: RetryPolicy::new(
                3,
                Backoff::Exponential {
                    base: Duration::from_secs(2),
                    max: Duration::from_secs(30),
                },
            )
            .with_attempt_timeout(Duration::from_secs(20)),
        }
    }
}

/// Online/offline flag shared with the host.
#[derive(Debug, Clone)]
pub struct NetworkStatus(Arc<AtomicBool>);

impl Default for NetworkStatus {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl NetworkStatus {
    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The check interval has not elapsed.
    Skipped,
    Offline,
    /// Another check is running.
    InFlight,
    Authenticated(UserResponse),
    Unauthenticated(SignOutReason),
    Cancelled,
}

pub struct SessionController {
    api: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    session: SessionStore,
    network: NetworkStatus,
    config: SessionConfig,
    check_lock: tokio::sync::Mutex<()>,
    /// Bumped by every logout; a check that sees it change drops its result.
    logouts: AtomicU64,
    last_checked: Mutex<Option<Instant>>,
    shutdown: CancellationToken,
}

impl SessionController {
    pub fn new(api: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>, config: SessionConfig) -> Self {
        Self {
            api,
            tokens,
            session: SessionStore::new(),
            network: NetworkStatus::default(),
            config,
            check_lock: tokio::sync::Mutex::new(()),
            logouts: AtomicU64::new(0),
            last_checked: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    /// Stops [`run`](Self::run) and cancels any check in progress.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        let last = self.last_checked.lock().unwrap_or_else(|p| p.into_inner());
        last.is_none_or(|at| now.duration_since(at) >= self.config.check_interval)
    }

    fn mark_checked(&self, now: Instant) {
        *self.last_checked.lock().unwrap_or_else(|p| p.into_inner()) = Some(now);
    }

    async fn stored_token(&self) -> Option<String> {
        match self.tokens.load().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read session token: {:#}", e);
                None
            }
        }
    }

    async fn forget_token(&self) {
        if let Err(e) = self.tokens.clear().await {
            warn!("Could not clear session token: {:#}", e);
        }
    }

    /// Validates the stored token, refreshing it when the server reports it expired.
    pub async fn check_auth(&self, force: bool) -> CheckOutcome {
        if !self.network.is_online() {
            debug!("Offline, keeping last known session");
            return CheckOutcome::Offline;
        }

        let now = Instant::now();
        if !force && !self.interval_elapsed(now) {
            return CheckOutcome::Skipped;
        }

        let Ok(_guard) = self.check_lock.try_lock() else {
            return CheckOutcome::InFlight;
        };
        self.mark_checked(now);
        let logouts = self.logouts.load(Ordering::SeqCst);

        if self.stored_token().await.is_none() {
            self.session.dispatch(SessionEvent::SignedOut {
                reason: SignOutReason::NoToken,
            });
            return CheckOutcome::Unauthenticated(SignOutReason::NoToken);
        }

        self.session.dispatch(SessionEvent::CheckStarted);

        let api = self.api.clone();
        let tokens = self.tokens.clone();
        let result = retry(&self.config.retry, &self.shutdown, move |attempt| {
            debug!("Validating session, attempt {}", attempt);
            validate_stored_token(api.clone(), tokens.clone())
        })
        .await;

        if self.logouts.load(Ordering::SeqCst) != logouts {
            debug!("Logged out during session check, dropping its result");
            // a refresh may have stored a token after logout cleared it
            self.forget_token().await;
            return CheckOutcome::Unauthenticated(SignOutReason::UserLogout);
        }

        match result {
            Ok(profile) => {
                self.session.dispatch(SessionEvent::ProfileLoaded(profile.clone()));
                CheckOutcome::Authenticated(profile)
            }
            Err(RetryError::Cancelled) => {
                self.session.dispatch(SessionEvent::CheckAborted);
                CheckOutcome::Cancelled
            }
            Err(err) => {
                let reason = match err {
                    RetryError::Permanent(_) => SignOutReason::Rejected,
                    _ => SignOutReason::RetriesExhausted,
                };
                info!("Session check failed ({}), signing out", err);
                self.forget_token().await;
                self.session.dispatch(SessionEvent::SignedOut { reason });
                CheckOutcome::Unauthenticated(reason)
            }
        }
    }

    pub async fn login(&self, credentials: LoginRequest) -> Result<UserResponse, ClientError> {
        let _guard = self.check_lock.lock().await;

        match self.try_login(&credentials).await {
            Ok(profile) => {
                self.mark_checked(Instant::now());
                self.session.dispatch(SessionEvent::ProfileLoaded(profile.clone()));
                info!("Logged in as {}", profile.username);
                Ok(profile)
            }
            Err(e) => {
                self.session.dispatch(SessionEvent::LoginFailed(e.user_message()));
                Err(e)
            }
        }
    }

    async fn try_login(&self, credentials: &LoginRequest) -> Result<UserResponse, ClientError> {
        if !self.network.is_online() {
            return Err(ClientError::Offline);
        }

        let login = self.api.login(credentials);
        let auth = match self.config.retry.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, login)
                .await
                .map_err(|_| ClientError::Timeout)??,
            None => login.await?,
        };

        self.tokens
            .save(&auth.access_token)
            .await
            .map_err(|e| ClientError::Storage(format!("{:#}", e)))?;

        let api = self.api.clone();
        let token = auth.access_token.clone();
        let profile = retry(&self.config.retry, &self.shutdown, move |_| {
            let api = api.clone();
            let token = token.clone();
            async move { api.profile(&token).await }
        })
        .await;

        match profile {
            Ok(profile) => Ok(profile),
            Err(err) => {
                self.forget_token().await;
                Err(match err {
                    RetryError::Cancelled => ClientError::Network("login cancelled".to_string()),
                    RetryError::Exhausted { last: None, .. } => ClientError::Timeout,
                    RetryError::Permanent(e) | RetryError::Exhausted { last: Some(e), .. } => e,
                })
            }
        }
    }

    /// Clears the local session; the server is notified on a best-effort basis.
    pub async fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        let token = self.stored_token().await;
        self.forget_token().await;
        self.session.dispatch(SessionEvent::SignedOut {
            reason: SignOutReason::UserLogout,
        });

        if let Some(token) = token {
            let notify = self.api.logout(&token);
            let limit = self.config.retry.attempt_timeout.unwrap_or(Duration::from_secs(20));
            match tokio::time::timeout(limit, notify).await {
                Ok(Ok(())) => debug!("Server acknowledged logout"),
                Ok(Err(e)) => debug!("Server logout failed: {}", e),
                Err(_) => debug!("Server logout timed out"),
            }
        }
    }

    /// Checks immediately, then every check interval, until shut down.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let outcome = self.check_auth(false).await;
                    debug!("Session check: {:?}", outcome);
                }
            }
        }
    }
}

/// One validation attempt. The token is re-read so a refresh saved by an
/// earlier attempt is used.
async fn validate_stored_token(api: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Result<UserResponse, ClientError> {
    let token = tokens
        .load()
        .await
        .map_err(|e| ClientError::Storage(format!("{:#}", e)))?
        .ok_or_else(|| ClientError::Unauthorized("No session token".to_string()))?;

    match api.profile(&token).await {
        Err(ClientError::Unauthorized(_)) => {}
        other => return other,
    }

    debug!("Token rejected, refreshing");
    let refreshed = api.refresh(&token).await?;
    if let Err(e) = tokens.save(&refreshed.access_token).await {
        warn!("Could not persist refreshed token: {:#}", e);
    }

    api.profile(&refreshed.access_token).await
}
