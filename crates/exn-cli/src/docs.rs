//! # Docs Subcommand
//!
//! Catalog browsing for everyone, plus ratings and bookmarks for signed-in
//! users.
//!
//! - `list`: Catalog, newest first, optionally filtered by tags.
//! - `show`: One document by its link slug.
//! - `tags`: Every tag used in the catalog.
//! - `rate` / `my-rating`: Submit or read the signed-in user's rating.
//! - `bookmark` / `bookmarks`: Toggle or list bookmarks.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use exn_client::{CatalogSource, PortalApiError, PortalClient};
use exn_core::{detail_path, distinct_tags, Document, DocumentId, Notice, TagFilter};

use crate::state::LocalState;
use crate::{report, CliContext};

/// Arguments for the `exn docs` subcommand.
#[derive(Args, Debug)]
pub struct DocsArgs {
    #[command(subcommand)]
    pub command: DocsCommand,
}

/// Docs subcommands.
#[derive(Subcommand, Debug)]
pub enum DocsCommand {
    /// List documents.
    List {
        /// Only documents carrying any of these tags. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Show the built-in sample catalog if the backend is unreachable.
        #[arg(long)]
        sample_fallback: bool,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show a document by slug (e.g. `sbi-po-notes`).
    Show { slug: String },

    /// List the distinct tags of the catalog.
    Tags,

    /// Rate a document from 1 to 5.
    Rate { id: DocumentId, value: i64 },

    /// Show your rating of a document.
    MyRating { id: DocumentId },

    /// Add or remove a bookmark.
    Bookmark { id: DocumentId },

    /// List your bookmarked documents.
    Bookmarks,
}

/// Execute the docs subcommand.
pub async fn run_docs(args: &DocsArgs, ctx: &CliContext) -> Result<u8> {
    let client = ctx.client()?;
    let state = ctx.store.load()?;

    match &args.command {
        DocsCommand::List {
            tags,
            sample_fallback,
            json,
        } => cmd_list(&client, tags, *sample_fallback, *json).await,

        DocsCommand::Show { slug } => cmd_show(&client, slug).await,

        DocsCommand::Tags => {
            let docs = client.documents().list().await?;
            for tag in distinct_tags(&docs) {
                println!("{tag}");
            }
            Ok(0)
        }

        DocsCommand::Rate { id, value } => {
            let client = as_user(&client, &state);
            match client.ratings().rate(state.user_id(), *id, *value).await {
                Ok(summary) => {
                    println!(
                        "Average: {:.1} ({} ratings)",
                        summary.average_rating, summary.total_ratings
                    );
                    Ok(report(&Notice::success("Thank you for rating!")))
                }
                Err(e) => Ok(report(&failure_notice(&e))),
            }
        }

        DocsCommand::MyRating { id } => {
            let client = as_user(&client, &state);
            match client.ratings().user_rating(state.user_id(), *id).await? {
                Some(value) => println!("Your rating: {}/5", value.get()),
                None => println!("You have not rated this document."),
            }
            Ok(0)
        }

        DocsCommand::Bookmark { id } => {
            let client = as_user(&client, &state);
            match client.bookmarks().toggle(state.user_id(), *id).await {
                Ok(true) => Ok(report(&Notice::success("Bookmarked"))),
                Ok(false) => Ok(report(&Notice::success("Bookmark removed"))),
                Err(e) => Ok(report(&failure_notice(&e))),
            }
        }

        DocsCommand::Bookmarks => {
            let Some(user) = state.user_id() else {
                return Ok(report(&Notice::error("Please login to see bookmarks.")));
            };
            let client = as_user(&client, &state);
            let ids = client.bookmarks().list_for_user(user).await?;
            let docs = client.documents().list().await?;
            let marked: Vec<Document> = docs.into_iter().filter(|d| ids.contains(&d.id)).collect();
            if marked.is_empty() {
                println!("No bookmarks yet.");
            } else {
                print_table(&marked);
            }
            Ok(0)
        }
    }
}

/// Narrow `client` to the signed-in user, when there is one.
fn as_user(client: &PortalClient, state: &LocalState) -> PortalClient {
    match state.access_token() {
        Some(token) => client.with_access_token(token),
        None => client.clone(),
    }
}

fn failure_notice(err: &PortalApiError) -> Notice {
    match err {
        PortalApiError::NotAuthenticated => Notice::error("Please login first."),
        PortalApiError::AlreadyRated | PortalApiError::Validation(_) => {
            Notice::error(err.to_string())
        }
        other => Notice::error(format!("Error: {}", other.service_message())),
    }
}

async fn cmd_list(
    client: &PortalClient,
    tags: &[String],
    sample_fallback: bool,
    json: bool,
) -> Result<u8> {
    let listing = client
        .documents()
        .list_or_sample(sample_fallback)
        .await
        .context("failed to load the catalog")?;
    if listing.source == CatalogSource::Sample {
        eprintln!("WARNING: backend unavailable, showing sample documents");
    }

    let filter = TagFilter::with_tags(tags.iter().cloned());
    let shown = filter.apply(&listing.documents);

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(0);
    }
    if shown.is_empty() {
        println!("No documents match the selected filters.");
    } else {
        print_table(shown.into_iter());
    }
    Ok(0)
}

async fn cmd_show(client: &PortalClient, slug: &str) -> Result<u8> {
    let doc = match client.documents().get_by_slug(slug).await {
        Ok(doc) => doc,
        Err(PortalApiError::NotFound(_)) => {
            return Ok(report(&Notice::error("PDF not found")));
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", doc.title);
    println!("  {}", doc.description);
    println!("  Tags:     {}", doc.tags.join(", "));
    println!("  Size:     {:.1} MB", doc.size_mb);
    println!(
        "  Rating:   {} ({:.1} from {} ratings)",
        stars(doc.display_stars()),
        doc.average_rating,
        doc.total_ratings
    );
    println!("  Preview:  {}", doc.preview_link);
    println!("  Download: {}", doc.download_link);
    println!("  Link:     {}", detail_path(&doc.slug()));
    Ok(0)
}

fn stars(filled: u8) -> String {
    let filled = usize::from(filled.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn print_table<'a, I>(docs: I)
where
    I: IntoIterator<Item = &'a Document>,
{
    for doc in docs {
        println!(
            "{:>5}  {:<40}  {:>6.1} MB  {} ({})  [{}]",
            doc.id.get(),
            doc.title,
            doc.size_mb,
            stars(doc.display_stars()),
            doc.total_ratings,
            doc.tags.join(", ")
        );
    }
}
