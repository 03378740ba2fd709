//! Process-wide account state.
//!
//! [`SessionStore`] is created once at startup, restores any cached session
//! in [`SessionStore::initialize`], and publishes every change through a
//! `watch` channel. The root view is a pure function of the published
//! [`SessionState`].

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{io, path::PathBuf, sync::Arc};

use chrono::{Duration, Utc};
use shared::{
    domain::Account,
    error::{ApiError, ErrorCode},
};
use tokio::{
    io::AsyncWriteExt,
    sync::{watch, Mutex},
};
use tracing::{info, warn};

use crate::{AuthProvider, AuthSession, Credentials, SignUpOutcome};

const CACHE_DIR: &str = "campaign-tracker";
const CACHE_FILE: &str = "session.json";
/// Access tokens this close to expiry are renewed before the next request.
const RENEW_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub loading: bool,
    pub account: Option<Account>,
}

impl SessionState {
    pub fn root_view(&self) -> RootView {
        match (&self.account, self.loading) {
            (_, true) => RootView::Loading,
            (Some(account), false) => RootView::SignedIn(account.clone()),
            (None, false) => RootView::Auth,
        }
    }
}

/// Exactly one of these is rendered at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootView {
    Loading,
    Auth,
    SignedIn(Account),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpNotice {
    SignedIn,
    ConfirmationRequired,
}

/// JSON file holding the last signed-in session.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CACHE_DIR).join(CACHE_FILE))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub async fn load(&self) -> Option<AuthSession> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), "auth: session cache unreadable: {err}");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(path = %self.path.display(), "auth: discarding corrupt session cache: {err}");
                None
            }
        }
    }

    pub async fn store(&self, session: &AuthSession) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(session)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;
        // A file left by an older run keeps its mode on open.
        #[cfg(unix)]
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
        file.write_all(&raw).await?;
        file.flush().await
    }

    pub async fn clear(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %self.path.display(), "auth: failed to remove session cache: {err}")
            }
        }
    }
}

pub struct SessionStore {
    auth: Arc<dyn AuthProvider>,
    cache: Option<SessionCache>,
    current: Mutex<Option<AuthSession>>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthProvider>, cache: Option<SessionCache>) -> Self {
        let (state, _) = watch::channel(SessionState {
            loading: true,
            account: None,
        });
        Self {
            auth,
            cache,
            current: Mutex::new(None),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn account(&self) -> Option<Account> {
        self.state.borrow().account.clone()
    }

    /// Restores the cached session, if any, by exchanging its refresh token.
    /// Ends the loading phase whatever the outcome.
    pub async fn initialize(&self) {
        let cached = match &self.cache {
            Some(cache) => cache.load().await,
            None => None,
        };

        if let Some(cached) = cached {
            match self.auth.refresh_session(&cached.refresh_token).await {
                Ok(session) => {
                    info!(email = %session.account.email, "auth: session restored");
                    self.adopt(session).await;
                }
                // Offline starts keep the cache for the next run.
                Err(err) if err.code == ErrorCode::Network => {
                    warn!("auth: could not restore session: {err}");
                }
                Err(err) => {
                    warn!("auth: cached session rejected: {err}");
                    if let Some(cache) = &self.cache {
                        cache.clear().await;
                    }
                }
            }
        }

        self.state.send_modify(|state| state.loading = false);
    }

    /// Renews the access token once it is within the margin of expiry. A
    /// renewal the provider rejects ends the session; a network failure
    /// leaves it for the next attempt.
    pub async fn ensure_fresh(&self) {
        let refresh_token = {
            let current = self.current.lock().await;
            match current.as_ref() {
                Some(session)
                    if session.expires_at - Utc::now() <= Duration::seconds(RENEW_MARGIN_SECS) =>
                {
                    session.refresh_token.clone()
                }
                _ => return,
            }
        };

        match self.auth.refresh_session(&refresh_token).await {
            Ok(session) => {
                info!(email = %session.account.email, "auth: session renewed");
                self.adopt(session).await;
            }
            Err(err) if err.code == ErrorCode::Network => {
                warn!("auth: could not renew session: {err}");
            }
            Err(err) => {
                warn!("auth: session renewal rejected: {err}");
                self.current.lock().await.take();
                if let Some(cache) = &self.cache {
                    cache.clear().await;
                }
                self.state.send_modify(|state| state.account = None);
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpNotice, ApiError> {
        let credentials = Credentials::new(email.trim(), password);
        match self.auth.sign_up(&credentials).await? {
            SignUpOutcome::SignedIn(session) => {
                self.adopt(session).await;
                Ok(SignUpNotice::SignedIn)
            }
            SignUpOutcome::ConfirmationRequired(_) => Ok(SignUpNotice::ConfirmationRequired),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Account, ApiError> {
        let credentials = Credentials::new(email.trim(), password);
        let session = self.auth.sign_in_with_password(&credentials).await?;
        let account = session.account.clone();
        info!(email = %account.email, "auth: signed in");
        self.adopt(session).await;
        Ok(account)
    }

    /// Always ends signed out; a provider failure is only logged.
    pub async fn sign_out(&self) {
        let previous = self.current.lock().await.take();
        if let Some(session) = previous {
            if let Err(err) = self.auth.sign_out(&session.access_token).await {
                warn!("auth: provider sign-out failed: {err}");
            }
            info!(email = %session.account.email, "auth: signed out");
        }
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
        self.state.send_modify(|state| state.account = None);
    }

    async fn adopt(&self, session: AuthSession) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.store(&session).await {
                warn!(path = %cache.path().display(), "auth: failed to persist session: {err}");
            }
        }
        let account = session.account.clone();
        *self.current.lock().await = Some(session);
        self.state
            .send_modify(|state| state.account = Some(account));
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
