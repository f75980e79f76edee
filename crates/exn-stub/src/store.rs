//! In-memory storage backend using DashMap.
//!
//! Table rows are kept as JSON objects, one `Vec` per table. Accounts and
//! issued tokens live in their own maps so the auth routes never touch the
//! table data except to create the profile row at signup.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

/// Tables served under `/rest/v1`.
pub const TABLES: [&str; 4] = ["users", "pdfs", "ratings", "bookmarks"];

/// Column sets that must be unique per table.
pub fn unique_keys(table: &str) -> &'static [&'static [&'static str]] {
    match table {
        "users" => &[&["user_id"], &["email"]],
        "ratings" | "bookmarks" => &[&["user_id", "pdf_id"]],
        _ => &[],
    }
}

/// Current time in the format the service stores timestamps.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A registered auth account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub user_metadata: Value,
    pub email_confirmed_at: Option<String>,
    pub created_at: String,
}

/// What a one-time email link does when followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Signup,
    Recovery,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Signup => "signup",
            LinkKind::Recovery => "recovery",
        }
    }
}

/// Server behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubOptions {
    /// Confirm new accounts immediately and return a session from signup.
    pub autoconfirm: bool,
}

struct Inner {
    options: StubOptions,
    tables: DashMap<String, Vec<Value>>,
    next_row_id: AtomicI64,
    /// Keyed by lowercased email.
    accounts: DashMap<String, Account>,
    /// Access token to account email.
    sessions: DashMap<String, String>,
    /// One-time link token to (account email, kind).
    links: DashMap<String, (String, LinkKind)>,
}

/// Shared application state holding all in-memory stores.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(options: StubOptions) -> Self {
        let tables = DashMap::new();
        for table in TABLES {
            tables.insert(table.to_string(), Vec::new());
        }
        Self {
            inner: Arc::new(Inner {
                options,
                tables,
                next_row_id: AtomicI64::new(1),
                accounts: DashMap::new(),
                sessions: DashMap::new(),
                links: DashMap::new(),
            }),
        }
    }

    pub fn options(&self) -> StubOptions {
        self.inner.options
    }

    pub fn tables(&self) -> &DashMap<String, Vec<Value>> {
        &self.inner.tables
    }

    pub fn next_row_id(&self) -> i64 {
        self.inner.next_row_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn accounts(&self) -> &DashMap<String, Account> {
        &self.inner.accounts
    }

    /// Issue an access token for `email`.
    pub fn open_session(&self, email: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.inner.sessions.insert(token.clone(), email.to_string());
        token
    }

    /// The account that owns `token`, if the session is live.
    pub fn session_account(&self, token: &str) -> Option<Account> {
        let email = self.inner.sessions.get(token)?.value().clone();
        self.inner.accounts.get(&email).map(|a| a.value().clone())
    }

    pub fn close_session(&self, token: &str) -> bool {
        self.inner.sessions.remove(token).is_some()
    }

    /// Create a one-time link token.
    pub fn issue_link(&self, email: &str, kind: LinkKind) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.inner
            .links
            .insert(token.clone(), (email.to_string(), kind));
        token
    }

    /// Consume a one-time link token.
    pub fn redeem_link(&self, token: &str, kind: LinkKind) -> Option<String> {
        let (_, (email, issued)) = self.inner.links.remove(token)?;
        (issued == kind).then_some(email)
    }

    /// Insert rows into the catalog, assigning fresh ids.
    pub fn seed_documents(&self, docs: &[exn_core::Document]) -> usize {
        let mut seeded = 0;
        for doc in docs {
            let Ok(Value::Object(mut row)) = serde_json::to_value(doc) else {
                continue;
            };
            row.insert("id".into(), Value::from(self.next_row_id()));
            if let Some(mut rows) = self.inner.tables.get_mut("pdfs") {
                rows.push(Value::Object(row));
                seeded += 1;
            }
        }
        seeded
    }
}
