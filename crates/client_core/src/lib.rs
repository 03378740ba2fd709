//! Client core for the campaign tracker.
//!
//! The remote backend is reached only through two ports: [`AuthProvider`]
//! for identity and [`RecordStore`] for table rows. [`supabase::SupabaseClient`]
//! implements both; tests substitute in-memory doubles. On top of the ports
//! sit the typed [`records::Records`] layer, the process-wide
//! [`session::SessionStore`], the [`navigator::Navigator`] state machine and
//! the per-entity [`forms`] sessions the screens own.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::Account,
    error::ApiError,
    protocol::{Filter, Table},
};

pub mod app;
pub mod error;
pub mod forms;
pub mod navigator;
pub mod records;
pub mod screens;
pub mod session;
pub mod supabase;

pub use app::CampaignApp;
pub use error::{FieldError, FormError, ValidationError};
pub use navigator::{LoadTicket, NavigationError, Navigator, View, ViewStack};
pub use records::Records;
pub use session::{RootView, SessionCache, SessionState, SessionStore};
pub use supabase::SupabaseClient;

/// Row-level access to the hosted tables.
///
/// Rows travel as JSON objects; [`Records`] owns the typed mapping.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, ApiError>;
    /// Inserts one row and returns it as stored (with its assigned id).
    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError>;
    async fn update(&self, table: Table, id: i64, patch: Value) -> Result<(), ApiError>;
    async fn delete(&self, table: Table, id: i64) -> Result<(), ApiError>;
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("account", &self.account)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The provider created the account but wants the email confirmed first.
    ConfirmationRequired(Account),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, ApiError>;
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ApiError>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, ApiError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError>;
}

/// Interactive yes/no gate in front of destructive operations.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod support;
