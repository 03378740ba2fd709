//! Application root: decides between the loading state, the auth screen and
//! the signed-in navigator from the published session state.

use std::sync::Arc;

use shared::error::ApiError;
use tracing::info;

use crate::{
    navigator::Navigator,
    records::Records,
    screens::AuthScreen,
    session::{RootView, SessionStore},
};

pub struct CampaignApp {
    session: Arc<SessionStore>,
    records: Records,
    auth: AuthScreen,
    navigator: Option<Navigator>,
}

impl CampaignApp {
    pub fn new(session: Arc<SessionStore>, records: Records) -> Self {
        Self {
            session,
            records,
            auth: AuthScreen::default(),
            navigator: None,
        }
    }

    /// Restores any cached session and builds the matching root.
    pub async fn start(&mut self) {
        self.session.initialize().await;
        self.sync().await;
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn root_view(&self) -> RootView {
        self.session.snapshot().root_view()
    }

    pub fn auth(&self) -> &AuthScreen {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthScreen {
        &mut self.auth
    }

    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    pub fn navigator_mut(&mut self) -> Option<&mut Navigator> {
        self.navigator.as_mut()
    }

    /// Brings the navigator in line with the session: a fresh Home on sign-in,
    /// nothing once signed out.
    pub async fn sync(&mut self) {
        match self.root_view() {
            RootView::SignedIn(account) => {
                if self.navigator.is_none() {
                    info!(email = %account.email, "app: opening home");
                    self.navigator = Some(Navigator::start(self.records.clone()).await);
                }
            }
            RootView::Auth | RootView::Loading => {
                if self.navigator.take().is_some() {
                    info!("app: navigator closed");
                }
            }
        }
    }

    /// Renews an expiring session before the next command touches the store.
    /// A rejected renewal lands on the auth screen.
    pub async fn keep_session_fresh(&mut self) {
        self.session.ensure_fresh().await;
        if self.root_view() == RootView::Auth && self.navigator.is_some() {
            self.auth = AuthScreen::default();
        }
        self.sync().await;
    }

    pub async fn submit_auth(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        let result = self.auth.submit(&self.session, email, password).await;
        self.sync().await;
        result
    }

    /// Signs out from any depth; the next sign-in starts again at Home.
    pub async fn sign_out(&mut self) {
        self.session.sign_out().await;
        self.auth = AuthScreen::default();
        self.sync().await;
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
