//! End-to-end command handler tests against a mocked backend.
//!
//! Each test gets its own state directory, so the local session file is
//! exercised the way the `exn` binary uses it across invocations.

use std::path::Path;

use exn_cli::account::{run_account, AccountArgs, AccountCommand};
use exn_cli::admin::{run_admin, AdminArgs, AdminCommand};
use exn_cli::config::{FileConfig, Settings};
use exn_cli::docs::{run_docs, DocsArgs, DocsCommand};
use exn_cli::CliContext;
use exn_core::DocumentId;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ctx(mock_server: &MockServer, state_dir: &Path) -> CliContext {
    let uri = mock_server.uri();
    let env = move |name: &str| match name {
        "EXN_SUPABASE_URL" => Some(uri.clone()),
        "EXN_SUPABASE_ANON_KEY" => Some("anon-test-key".to_string()),
        "EXN_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    };
    CliContext::new(Settings::layer(FileConfig::default(), env, Some(state_dir)))
}

fn docs(command: DocsCommand) -> DocsArgs {
    DocsArgs { command }
}

async fn mount_login(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "user-jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "email": "asha@example.com",
                "email_confirmed_at": "2026-01-15T12:00:00Z",
                "user_metadata": {}
            }
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.asha@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user_id": 123456789,
            "full_name": "Asha Rao",
            "email": "asha@example.com",
            "mobile": "9876543210",
            "exam_type": "PO"
        })))
        .mount(mock_server)
        .await;
}

async fn login(ctx: &CliContext) -> u8 {
    let args = AccountArgs {
        command: AccountCommand::Login {
            email: "asha@example.com".into(),
            password: "secret1".into(),
        },
    };
    run_account(&args, ctx).await.unwrap()
}

// ── account login / logout ──────────────────────────────────────────

#[tokio::test]
async fn login_persists_session_and_logout_clears_it() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());

    assert_eq!(login(&ctx).await, 0);
    let state = ctx.store.load().unwrap();
    assert!(state.is_logged_in);
    assert_eq!(state.user_id().map(|u| u.get()), Some(123_456_789));
    assert_eq!(state.access_token(), Some("user-jwt"));

    let logout = AccountArgs {
        command: AccountCommand::Logout,
    };
    assert_eq!(run_account(&logout, &ctx).await.unwrap(), 0);
    let state = ctx.store.load().unwrap();
    assert!(!state.is_logged_in);
    assert_eq!(state.access_token(), None);
}

#[tokio::test]
async fn rejected_login_exits_nonzero_and_stores_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());
    assert_eq!(login(&ctx).await, 1);
    assert!(!ctx.store.load().unwrap().is_logged_in);
}

// ── docs bookmark ───────────────────────────────────────────────────

#[tokio::test]
async fn bookmark_uses_the_stored_session() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookmarks"))
        .and(query_param("user_id", "eq.123456789"))
        .and(query_param("pdf_id", "eq.7"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(406).set_body_json(serde_json::json!({
            "code": "PGRST116",
            "details": "The result contains 0 rows",
            "hint": null,
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookmarks"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());
    assert_eq!(login(&ctx).await, 0);

    let args = docs(DocsCommand::Bookmark {
        id: DocumentId::new(7),
    });
    assert_eq!(run_docs(&args, &ctx).await.unwrap(), 0);
}

#[tokio::test]
async fn bookmark_while_signed_out_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());
    let args = docs(DocsCommand::Bookmark {
        id: DocumentId::new(7),
    });
    assert_eq!(run_docs(&args, &ctx).await.unwrap(), 1);
}

// ── docs list ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_falls_back_to_sample_only_when_asked() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pdfs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());

    let strict = docs(DocsCommand::List {
        tags: vec![],
        sample_fallback: false,
        json: true,
    });
    assert!(run_docs(&strict, &ctx).await.is_err());

    let lenient = docs(DocsCommand::List {
        tags: vec!["notes".into()],
        sample_fallback: true,
        json: true,
    });
    assert_eq!(run_docs(&lenient, &ctx).await.unwrap(), 0);
}

// ── admin ───────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_commands_require_login() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pdfs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());
    let list = AdminArgs {
        command: AdminCommand::List,
    };
    assert_eq!(run_admin(&list, &ctx).await.unwrap(), 1);

    let login = AdminArgs {
        command: AdminCommand::Login {
            username: "admin".into(),
            password: "admin123".into(),
        },
    };
    assert_eq!(run_admin(&login, &ctx).await.unwrap(), 0);
    assert_eq!(run_admin(&list, &ctx).await.unwrap(), 0);
}

#[tokio::test]
async fn admin_delete_needs_confirmation() {
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/pdfs"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = ctx(&mock_server, dir.path());
    let login = AdminArgs {
        command: AdminCommand::Login {
            username: "admin".into(),
            password: "admin123".into(),
        },
    };
    run_admin(&login, &ctx).await.unwrap();

    let unconfirmed = AdminArgs {
        command: AdminCommand::Delete {
            id: DocumentId::new(3),
            yes: false,
        },
    };
    assert!(run_admin(&unconfirmed, &ctx).await.is_err());

    let confirmed = AdminArgs {
        command: AdminCommand::Delete {
            id: DocumentId::new(3),
            yes: true,
        },
    };
    assert_eq!(run_admin(&confirmed, &ctx).await.unwrap(), 0);
}
