//! # Admin Subcommand
//!
//! Catalog editor guarded by the configured admin credentials. A login is
//! kept in the local state file for two hours; every catalog change checks
//! it first.
//!
//! - `login` / `logout` / `status`: Admin session.
//! - `list`: All documents with ids.
//! - `create` / `update` / `delete`: Catalog changes.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use exn_core::{DocumentDraft, DocumentId, Notice};

use crate::state::{AdminCheck, LocalState};
use crate::{report, CliContext};

/// Arguments for the `exn admin` subcommand.
#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Editable document fields. On `update`, omitted fields keep their
/// current values.
#[derive(Args, Debug, Default, Clone)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub image_path: Option<String>,
    /// Catalog tag. Repeatable; replaces all tags when given.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub size_mb: Option<f64>,
    #[arg(long)]
    pub preview_link: Option<String>,
    #[arg(long)]
    pub download_link: Option<String>,
}

impl DraftArgs {
    /// Overlay the given fields onto `draft`.
    pub fn apply(&self, mut draft: DocumentDraft) -> DocumentDraft {
        let set = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *slot = v.clone();
            }
        };
        set(&mut draft.title, &self.title);
        set(&mut draft.description, &self.description);
        set(&mut draft.image_path, &self.image_path);
        set(&mut draft.preview_link, &self.preview_link);
        set(&mut draft.download_link, &self.download_link);
        if !self.tags.is_empty() {
            draft.tags = self.tags.clone();
        }
        if let Some(size) = self.size_mb {
            draft.size_mb = size;
        }
        draft
    }
}

/// Admin subcommands.
#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Start an admin session.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// End the admin session.
    Logout,

    /// Show whether the admin session is active.
    Status,

    /// List all documents.
    List,

    /// Add a document.
    Create(DraftArgs),

    /// Edit a document.
    Update {
        id: DocumentId,
        #[command(flatten)]
        fields: DraftArgs,
    },

    /// Remove a document.
    Delete {
        id: DocumentId,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Execute the admin subcommand.
pub async fn run_admin(args: &AdminArgs, ctx: &CliContext) -> Result<u8> {
    let now = Utc::now();
    let mut state = ctx.store.load()?;

    match &args.command {
        AdminCommand::Login { username, password } => {
            let notice = cmd_login(ctx, &mut state, username, password, now);
            ctx.store.save(&state)?;
            Ok(report(&notice))
        }

        AdminCommand::Logout => {
            state.clear_admin();
            ctx.store.save(&state)?;
            Ok(report(&Notice::success("Logged out of admin panel")))
        }

        AdminCommand::Status => {
            let check = state.check_admin(now);
            ctx.store.save(&state)?;
            match check {
                AdminCheck::Valid(session) => {
                    let mins = session.remaining_ms(now) / 60_000;
                    println!("Admin session active ({mins} min remaining)");
                    Ok(0)
                }
                AdminCheck::Expired => Ok(report(&expired_notice())),
                AdminCheck::Missing => {
                    println!("Not logged in as admin.");
                    Ok(1)
                }
            }
        }

        command => {
            if let Some(code) = require_admin(ctx, &mut state, now)? {
                return Ok(code);
            }
            let documents = ctx.client()?.documents();
            match command {
                AdminCommand::List => {
                    let docs = documents.list().await?;
                    println!("Documents ({}):", docs.len());
                    for doc in &docs {
                        println!(
                            "  [{}] {} ({:.1} MB, {:.1}★ from {})",
                            doc.id, doc.title, doc.size_mb, doc.average_rating, doc.total_ratings
                        );
                    }
                    Ok(0)
                }
                AdminCommand::Create(fields) => {
                    let draft = fields.apply(DocumentDraft::default());
                    if let Err(e) = draft.validate() {
                        return Ok(report(&Notice::error(e.to_string())));
                    }
                    let doc = documents.create(&draft).await?;
                    println!("Created document {}", doc.id);
                    Ok(report(&Notice::success("PDF added successfully!")))
                }
                AdminCommand::Update { id, fields } => {
                    let current = documents
                        .get(*id)
                        .await?
                        .with_context(|| format!("document {id} not found"))?;
                    let draft = fields.apply(DocumentDraft::from_document(&current));
                    if let Err(e) = draft.validate() {
                        return Ok(report(&Notice::error(e.to_string())));
                    }
                    documents.update(*id, &draft).await?;
                    Ok(report(&Notice::success("PDF updated successfully!")))
                }
                AdminCommand::Delete { id, yes } => {
                    if !*yes {
                        bail!("refusing to delete document {id} without --yes");
                    }
                    documents.delete(*id).await?;
                    Ok(report(&Notice::success("PDF deleted successfully!")))
                }
                AdminCommand::Login { .. } | AdminCommand::Logout | AdminCommand::Status => {
                    Ok(0)
                }
            }
        }
    }
}

fn expired_notice() -> Notice {
    Notice::error("Session expired. Please login again.")
}

/// Verify credentials and start a session.
fn cmd_login(
    ctx: &CliContext,
    state: &mut LocalState,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Notice {
    if !ctx.settings.admin.verify(username, password) {
        tracing::warn!(username, "admin login rejected");
        return Notice::error("Invalid username or password");
    }
    if ctx.settings.admin.is_default() {
        tracing::warn!("admin credentials are the built-in defaults");
    }
    state.start_admin(now);
    Notice::success("Admin login successful")
}

/// `Some(exit code)` when there is no valid admin session.
fn require_admin(
    ctx: &CliContext,
    state: &mut LocalState,
    now: DateTime<Utc>,
) -> Result<Option<u8>> {
    match state.check_admin(now) {
        AdminCheck::Valid(_) => Ok(None),
        AdminCheck::Expired => {
            ctx.store.save(state)?;
            Ok(Some(report(&expired_notice())))
        }
        AdminCheck::Missing => Ok(Some(report(&Notice::error(
            "Admin login required. Run `exn admin login` first.",
        )))),
    }
}
