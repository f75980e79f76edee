//! ExamNation backend stub: a standalone development server.
//!
//! In-memory stand-in for the hosted auth and table service, serving only
//! the endpoints `exn-client` calls. Point the CLI at it with
//! `EXN_SUPABASE_URL=http://127.0.0.1:54321` and any non-empty anon key.
//!
//! Environment:
//! - `EXN_STUB_PORT` listen port (default 54321).
//! - `EXN_STUB_AUTOCONFIRM=1` confirms accounts at signup.
//! - `EXN_STUB_SEED_SAMPLE=1` loads the sample catalog at startup.
//!
//! Storage is in-memory (DashMap) with no persistence; data is lost on
//! restart.

mod auth;
mod query;
mod routes;
mod store;

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::store::{AppState, StubOptions};

const DEFAULT_PORT: u16 = 54321;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("EXN_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let state = AppState::new(StubOptions {
        autoconfirm: env_flag("EXN_STUB_AUTOCONFIRM"),
    });
    if env_flag("EXN_STUB_SEED_SAMPLE") {
        let n = state.seed_documents(&exn_core::sample_catalog());
        tracing::info!("seeded {n} sample documents");
    }
    let app = routes::router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("exn-stub listening on {addr}");

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
