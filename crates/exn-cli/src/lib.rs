//! # exn-cli: Command-line client for the ExamNation portal
//!
//! Provides the `exn` command:
//!
//! - `exn account`: signup, login, logout, email verification and password
//!   recovery.
//! - `exn docs`: browse the catalog with tag filters, rate and bookmark
//!   documents.
//! - `exn admin`: password-guarded catalog editor with a two-hour session.
//!
//! Session data that a browser would keep in local storage lives in a JSON
//! file in the state directory (see [`state`]).
//!
//! ```bash
//! exn account login --email asha@example.com --password secret1
//! exn docs list --tag "sbi po" --tag notes
//! exn admin login --username admin --password admin123
//! ```

pub mod account;
pub mod admin;
pub mod config;
pub mod docs;
pub mod state;

use anyhow::Result;

use exn_client::PortalClient;
use exn_core::{Notice, NoticeKind};

use crate::config::Settings;
use crate::state::StateStore;

/// Everything a command handler needs.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub settings: Settings,
    pub store: StateStore,
}

impl CliContext {
    pub fn new(settings: Settings) -> Self {
        let store = StateStore::new(&settings.state_dir);
        Self { settings, store }
    }

    /// A backend client acting as the anonymous role.
    pub fn client(&self) -> Result<PortalClient> {
        Ok(PortalClient::new(self.settings.api_config()?)?)
    }
}

/// Print a notice and return the matching exit code.
pub fn report(notice: &Notice) -> u8 {
    match notice.kind {
        NoticeKind::Success => {
            println!("OK: {notice}");
            0
        }
        NoticeKind::Info => {
            println!("{notice}");
            0
        }
        NoticeKind::Error => {
            eprintln!("ERROR: {notice}");
            1
        }
    }
}
