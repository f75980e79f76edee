//! # exn CLI entry point
//!
//! Parses command-line arguments, resolves settings and dispatches to the
//! subcommand handlers on a Tokio runtime.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exn_cli::account::{run_account, AccountArgs};
use exn_cli::admin::{run_admin, AdminArgs};
use exn_cli::config::Settings;
use exn_cli::docs::{run_docs, DocsArgs};
use exn_cli::CliContext;

/// ExamNation portal CLI.
///
/// Account management, catalog browsing with tag filters, ratings and
/// bookmarks, and the admin catalog editor.
#[derive(Parser, Debug)]
#[command(name = "exn", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the local session file.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Signup, login, verification and password recovery.
    Account(AccountArgs),

    /// Browse, rate and bookmark study documents.
    Docs(DocsArgs),

    /// Admin session and catalog editing.
    Admin(AdminArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = match Settings::resolve(cli.config.as_deref(), cli.state_dir.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(state_dir = %settings.state_dir.display(), "settings resolved");
    let ctx = CliContext::new(settings);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Account(args) => run_account(args, &ctx).await,
            Commands::Docs(args) => run_docs(args, &ctx).await,
            Commands::Admin(args) => run_admin(args, &ctx).await,
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_tags_and_global_flags() {
        let cli = Cli::try_parse_from([
            "exn", "-vv", "docs", "list", "--tag", "sbi po", "--tag", "notes", "--state-dir", "/tmp/s",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/s")));
        match cli.command {
            Commands::Docs(args) => match args.command {
                exn_cli::docs::DocsCommand::List { tags, .. } => {
                    assert_eq!(tags, vec!["sbi po", "notes"]);
                }
                other => panic!("unexpected: {other:?}"),
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn signup_exam_type_accepts_labels() {
        let cli = Cli::try_parse_from([
            "exn",
            "account",
            "signup",
            "--full-name",
            "Asha Rao",
            "--email",
            "asha@example.com",
            "--mobile",
            "9876543210",
            "--exam-type",
            "grade_b",
            "--password",
            "secret1",
            "--confirm-password",
            "secret1",
            "--accept-terms",
        ]);
        assert!(cli.is_ok());

        let bad = Cli::try_parse_from([
            "exn", "account", "signup", "--full-name", "A", "--email", "a@b.c", "--mobile",
            "9876543210", "--exam-type", "astronaut", "--password", "x", "--confirm-password", "x",
        ]);
        assert!(bad.is_err());
    }
}
