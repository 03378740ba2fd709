//! In-memory doubles for the two collaborator ports.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use shared::{
    domain::{Account, AccountId},
    error::{ApiError, ErrorCode},
    protocol::{Filter, Table},
};
use uuid::Uuid;

use crate::{
    records::Records, AuthProvider, AuthSession, Credentials, RecordStore, SignUpOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
struct MemoryInner {
    tables: HashMap<Table, Vec<Value>>,
    next_id: i64,
    failures: HashMap<(Table, Op), ApiError>,
    calls: HashMap<(Table, Op), usize>,
}

/// Table store that keeps rows in insertion order, assigns increasing ids and
/// can be told to fail a given operation on a given table.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn seed(&self, table: Table, row: Value) -> i64 {
        let mut inner = self.inner.lock().expect("store lock");
        inner.next_id += 1;
        let id = inner.next_id;
        let mut row = row;
        row["id"] = json!(id);
        inner.tables.entry(table).or_default().push(row);
        id
    }

    pub(crate) fn rows(&self, table: Table) -> Vec<Value> {
        let inner = self.inner.lock().expect("store lock");
        inner.tables.get(&table).cloned().unwrap_or_default()
    }

    pub(crate) fn fail(&self, table: Table, op: Op, message: &str) {
        let mut inner = self.inner.lock().expect("store lock");
        inner
            .failures
            .insert((table, op), ApiError::new(ErrorCode::Internal, message));
    }

    pub(crate) fn heal(&self, table: Table, op: Op) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.failures.remove(&(table, op));
    }

    pub(crate) fn calls(&self, table: Table, op: Op) -> usize {
        let inner = self.inner.lock().expect("store lock");
        inner.calls.get(&(table, op)).copied().unwrap_or(0)
    }

    pub(crate) fn writes(&self) -> usize {
        let inner = self.inner.lock().expect("store lock");
        inner
            .calls
            .iter()
            .filter(|((_, op), _)| *op != Op::Select)
            .map(|(_, count)| *count)
            .sum()
    }

    fn enter(&self, table: Table, op: Op) -> Result<std::sync::MutexGuard<'_, MemoryInner>, ApiError> {
        let mut inner = self.inner.lock().expect("store lock");
        *inner.calls.entry((table, op)).or_default() += 1;
        if let Some(err) = inner.failures.get(&(table, op)) {
            return Err(err.clone());
        }
        Ok(inner)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, ApiError> {
        let inner = self.enter(table, Op::Select)?;
        let mut rows: Vec<Value> = inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &filter.order {
            rows.sort_by_key(|row| row.get(&order.column).and_then(Value::as_i64));
            if !order.ascending {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError> {
        let mut inner = self.enter(table, Op::Insert)?;
        inner.next_id += 1;
        let mut row = row;
        row["id"] = json!(inner.next_id);
        inner.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: i64, patch: Value) -> Result<(), ApiError> {
        let mut inner = self.enter(table, Op::Update)?;
        if let (Some(rows), Value::Object(fields)) = (inner.tables.get_mut(&table), patch) {
            if let Some(row) = rows.iter_mut().find(|row| row["id"] == json!(id)) {
                for (key, value) in fields {
                    row[key.as_str()] = value;
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), ApiError> {
        let mut inner = self.enter(table, Op::Delete)?;
        if let Some(rows) = inner.tables.get_mut(&table) {
            rows.retain(|row| row["id"] != json!(id));
        }
        Ok(())
    }
}

pub(crate) fn records_over(store: &Arc<MemoryStore>) -> Records {
    Records::new(store.clone())
}

struct FakeAccount {
    password: String,
    account: Account,
}

/// Auth provider with a fixed set of accounts and monotonically numbered
/// tokens. Refresh tokens stay valid until `revoke_refresh` is called.
/// Sessions last an hour, or thirty seconds after `issue_short_lived`.
#[derive(Default)]
pub(crate) struct FakeAuth {
    accounts: Mutex<HashMap<String, FakeAccount>>,
    require_confirmation: bool,
    refresh_revoked: Mutex<bool>,
    offline: Mutex<bool>,
    short_lived: AtomicBool,
    issued: AtomicUsize,
    refreshes: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl FakeAuth {
    pub(crate) fn with_account(email: &str, password: &str) -> Self {
        let auth = Self::default();
        auth.register(email, password);
        auth
    }

    pub(crate) fn requiring_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::default()
        }
    }

    pub(crate) fn register(&self, email: &str, password: &str) -> Account {
        let account = Account {
            id: AccountId(Uuid::new_v4()),
            email: email.to_string(),
        };
        self.accounts.lock().expect("accounts lock").insert(
            email.to_string(),
            FakeAccount {
                password: password.to_string(),
                account: account.clone(),
            },
        );
        account
    }

    pub(crate) fn revoke_refresh(&self) {
        *self.refresh_revoked.lock().expect("revoke lock") = true;
    }

    pub(crate) fn issue_short_lived(&self) {
        self.short_lived.store(true, Ordering::SeqCst);
    }

    pub(crate) fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub(crate) fn go_offline(&self) {
        *self.offline.lock().expect("offline lock") = true;
    }

    pub(crate) fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn issue(&self, account: Account) -> AuthSession {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let lifetime = if self.short_lived.load(Ordering::SeqCst) {
            Duration::seconds(30)
        } else {
            Duration::hours(1)
        };
        AuthSession {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh::{}", account.email),
            expires_at: Utc::now() + lifetime,
            account,
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, ApiError> {
        if self
            .accounts
            .lock()
            .expect("accounts lock")
            .contains_key(&credentials.email)
        {
            return Err(ApiError::new(
                ErrorCode::Validation,
                "User already registered",
            ));
        }
        let account = self.register(&credentials.email, &credentials.password);
        if self.require_confirmation {
            Ok(SignUpOutcome::ConfirmationRequired(account))
        } else {
            Ok(SignUpOutcome::SignedIn(self.issue(account)))
        }
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ApiError> {
        let account = {
            let accounts = self.accounts.lock().expect("accounts lock");
            match accounts.get(&credentials.email) {
                Some(entry) if entry.password == credentials.password => entry.account.clone(),
                _ => {
                    return Err(ApiError::new(
                        ErrorCode::Validation,
                        "Invalid login credentials",
                    ))
                }
            }
        };
        Ok(self.issue(account))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, ApiError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if *self.offline.lock().expect("offline lock") {
            return Err(ApiError::network("connection refused"));
        }
        if *self.refresh_revoked.lock().expect("revoke lock") {
            return Err(ApiError::new(
                ErrorCode::Unauthorized,
                "Invalid Refresh Token",
            ));
        }
        let email = refresh_token
            .strip_prefix("refresh::")
            .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "Invalid Refresh Token"))?;
        let account = self
            .accounts
            .lock()
            .expect("accounts lock")
            .get(email)
            .map(|entry| entry.account.clone())
            .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "Invalid Refresh Token"))?;
        Ok(self.issue(account))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), ApiError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
