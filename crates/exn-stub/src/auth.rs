//! Auth routes: email + password accounts with emailed one-time links.
//!
//! No mail is sent. Verification and recovery links are written to the log
//! at `info`, and following one (`GET /auth/v1/verify`) redirects to the
//! requested site page with the new session in the URL fragment.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::store::{now_rfc3339, Account, AppState, LinkKind};

const MIN_PASSWORD_LEN: usize = 6;
const SESSION_TTL_SECS: i64 = 3600;

fn auth_error(status: StatusCode, error_code: &str, msg: &str) -> Response {
    (
        status,
        Json(json!({
            "code": status.as_u16(),
            "error_code": error_code,
            "msg": msg
        })),
    )
        .into_response()
}

fn bad_jwt() -> Response {
    auth_error(
        StatusCode::UNAUTHORIZED,
        "bad_jwt",
        "invalid JWT: unable to parse or verify signature",
    )
}

fn weak_password() -> Response {
    auth_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        "weak_password",
        "Password should be at least 6 characters.",
    )
}

fn user_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "aud": "authenticated",
        "role": "authenticated",
        "email": account.email,
        "email_confirmed_at": account.email_confirmed_at,
        "app_metadata": { "provider": "email", "providers": ["email"] },
        "user_metadata": account.user_metadata,
        "created_at": account.created_at
    })
}

fn session_json(state: &AppState, account: &Account) -> Value {
    let access_token = state.open_session(&account.email);
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": SESSION_TTL_SECS,
        "expires_at": Utc::now().timestamp() + SESSION_TTL_SECS,
        "refresh_token": Uuid::new_v4().simple().to_string(),
        "user": user_json(account)
    })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The account behind the request's bearer token.
fn caller(state: &AppState, headers: &HeaderMap) -> Result<Account, Response> {
    bearer(headers)
        .and_then(|token| state.session_account(token))
        .ok_or_else(bad_jwt)
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn send_link(state: &AppState, email: &str, kind: LinkKind, redirect_to: Option<&str>) {
    let token = state.issue_link(email, kind);
    tracing::info!(
        email,
        kind = kind.as_str(),
        redirect_to = redirect_to.unwrap_or(""),
        "email link: GET /auth/v1/verify?type={}&token={token}",
        kind.as_str()
    );
}

// ── Health ──────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({
        "name": "exn-stub",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "In-memory auth for ExamNation development"
    }))
}

// ── Signup and sign-in ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RedirectQuery {
    redirect_to: Option<String>,
}

#[derive(Deserialize)]
pub struct SignUpBody {
    email: String,
    password: String,
    #[serde(default)]
    data: Value,
}

/// The `users` row implied by signup metadata.
fn profile_row(email: &str, data: &Value) -> Option<Value> {
    let user_id: u64 = match data.get("user_id")? {
        Value::String(s) => s.parse().ok()?,
        other => other.as_u64()?,
    };
    Some(json!({
        "user_id": user_id,
        "full_name": data.get("full_name").cloned().unwrap_or(Value::Null),
        "email": email,
        "mobile": data.get("mobile").cloned().unwrap_or(Value::Null),
        "exam_type": data.get("exam_type").cloned().unwrap_or(Value::Null),
        "created_at": now_rfc3339()
    }))
}

pub async fn signup(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    Json(body): Json<SignUpBody>,
) -> Response {
    let key = email_key(&body.email);
    if key.is_empty() || !key.contains('@') {
        return auth_error(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            "Unable to validate email address: invalid format",
        );
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return weak_password();
    }
    if state.accounts().contains_key(&key) {
        return auth_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "user_already_exists",
            "User already registered",
        );
    }

    // The profile row is written the way a signup trigger would.
    if let Some(mut row) = profile_row(&key, &body.data) {
        let Some(mut users) = state.tables().get_mut("users") else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let taken = users
            .iter()
            .any(|u| u.get("user_id") == row.get("user_id") || u.get("email") == row.get("email"));
        if taken {
            return auth_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected_failure",
                "Database error saving new user",
            );
        }
        if let Some(fields) = row.as_object_mut() {
            fields.insert("id".into(), Value::from(state.next_row_id()));
        }
        users.push(row);
    }

    let now = now_rfc3339();
    let autoconfirm = state.options().autoconfirm;
    let account = Account {
        id: Uuid::new_v4(),
        email: key.clone(),
        password: body.password,
        user_metadata: body.data,
        email_confirmed_at: autoconfirm.then(|| now.clone()),
        created_at: now,
    };
    state.accounts().insert(key.clone(), account.clone());
    tracing::info!(email = %key, "account registered");

    if autoconfirm {
        return Json(session_json(&state, &account)).into_response();
    }
    send_link(&state, &key, LinkKind::Signup, query.redirect_to.as_deref());
    Json(user_json(&account)).into_response()
}

#[derive(Deserialize)]
pub struct GrantQuery {
    grant_type: String,
}

#[derive(Deserialize)]
pub struct PasswordGrant {
    email: String,
    password: String,
}

pub async fn token(
    State(state): State<AppState>,
    Query(query): Query<GrantQuery>,
    Json(body): Json<PasswordGrant>,
) -> Response {
    if query.grant_type != "password" {
        return auth_error(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            "unsupported_grant_type",
        );
    }
    let account = match state.accounts().get(&email_key(&body.email)) {
        Some(a) if a.password == body.password => a.value().clone(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_grant",
                    "error_code": "invalid_credentials",
                    "error_description": "Invalid login credentials"
                })),
            )
                .into_response()
        }
    };
    if account.email_confirmed_at.is_none() {
        return auth_error(
            StatusCode::BAD_REQUEST,
            "email_not_confirmed",
            "Email not confirmed",
        );
    }
    Json(session_json(&state, &account)).into_response()
}

// ── Email links ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyQuery {
    token: String,
    #[serde(rename = "type")]
    kind: String,
    redirect_to: Option<String>,
}

pub async fn verify(State(state): State<AppState>, Query(query): Query<VerifyQuery>) -> Response {
    let kind = match query.kind.as_str() {
        "signup" => LinkKind::Signup,
        "recovery" => LinkKind::Recovery,
        _ => return auth_error(StatusCode::BAD_REQUEST, "validation_failed", "unknown type"),
    };
    let expired = || {
        auth_error(
            StatusCode::FORBIDDEN,
            "otp_expired",
            "Email link is invalid or has expired",
        )
    };
    let Some(email) = state.redeem_link(&query.token, kind) else {
        return expired();
    };
    let account = {
        let Some(mut entry) = state.accounts().get_mut(&email) else {
            return expired();
        };
        if kind == LinkKind::Signup && entry.email_confirmed_at.is_none() {
            entry.email_confirmed_at = Some(now_rfc3339());
        }
        entry.value().clone()
    };

    let session = session_json(&state, &account);
    match query.redirect_to {
        Some(target) => {
            let fragment = format!(
                "access_token={}&token_type=bearer&expires_in={SESSION_TTL_SECS}&type={}",
                session["access_token"].as_str().unwrap_or_default(),
                kind.as_str()
            );
            Redirect::to(&format!("{target}#{fragment}")).into_response()
        }
        None => Json(session).into_response(),
    }
}

#[derive(Deserialize)]
pub struct EmailBody {
    email: String,
}

pub async fn recover(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    Json(body): Json<EmailBody>,
) -> Response {
    let key = email_key(&body.email);
    // Unknown addresses get the same reply as known ones.
    if state.accounts().contains_key(&key) {
        send_link(&state, &key, LinkKind::Recovery, query.redirect_to.as_deref());
    }
    Json(json!({})).into_response()
}

#[derive(Deserialize)]
pub struct ResendBody {
    #[serde(rename = "type")]
    kind: String,
    email: String,
}

pub async fn resend(State(state): State<AppState>, Json(body): Json<ResendBody>) -> Response {
    if body.kind != "signup" {
        return auth_error(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            "Only signup verification emails can be resent",
        );
    }
    let key = email_key(&body.email);
    let pending = state
        .accounts()
        .get(&key)
        .is_some_and(|a| a.email_confirmed_at.is_none());
    if pending {
        send_link(&state, &key, LinkKind::Signup, None);
    }
    Json(json!({})).into_response()
}

// ── Current user ────────────────────────────────────────────────────

pub async fn get_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match caller(&state, &headers) {
        Ok(account) => Json(user_json(&account)).into_response(),
        Err(resp) => resp,
    }
}

#[derive(Deserialize)]
pub struct UserUpdate {
    password: Option<String>,
    data: Option<Value>,
}

pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UserUpdate>,
) -> Response {
    let account = match caller(&state, &headers) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let Some(mut entry) = state.accounts().get_mut(&account.email) else {
        return bad_jwt();
    };
    if let Some(password) = body.password {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return weak_password();
        }
        if password == entry.password {
            return auth_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "same_password",
                "New password should be different from the old password.",
            );
        }
        entry.password = password;
        tracing::info!(email = %entry.email, "password changed");
    }
    if let Some(data) = body.data {
        entry.user_metadata = data;
    }
    Json(user_json(&entry)).into_response()
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(token) if state.close_session(token) => StatusCode::NO_CONTENT.into_response(),
        _ => bad_jwt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::router;
    use crate::store::StubOptions;
    use axum::body::Body;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app_with(options: StubOptions) -> (AppState, Router) {
        let state = AppState::new(options);
        (state.clone(), router(state))
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: Value, token: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("apikey", "k")
            .header("content-type", "application/json");
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }
        builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri(uri).header("apikey", "k");
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn signup_body(email: &str, user_id: &str) -> Value {
        json!({
            "email": email,
            "password": "secret1",
            "data": {
                "user_id": user_id,
                "full_name": "Asha Rao",
                "mobile": "9876543210",
                "exam_type": "PO"
            }
        })
    }

    // ── POST /auth/v1/signup ────────────────────────────────────────

    #[tokio::test]
    async fn signup_creates_unconfirmed_account_and_profile_row() {
        let (state, app) = app_with(StubOptions::default());
        let resp = app
            .clone()
            .oneshot(post(
                "/auth/v1/signup?redirect_to=http://localhost:5173/auth/callback",
                signup_body("Asha@Example.com", "123456789"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let user = body_json(resp).await;
        assert!(user["email_confirmed_at"].is_null());
        assert_eq!(user["user_metadata"]["user_id"], "123456789");

        let users = state.tables().get("users").unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["user_id"], 123456789);
        assert_eq!(users[0]["email"], "asha@example.com");
        drop(users);

        let dup = app
            .oneshot(post(
                "/auth/v1/signup",
                signup_body("asha@example.com", "223456789"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(dup.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(dup).await["msg"], "User already registered");
    }

    #[tokio::test]
    async fn signup_with_autoconfirm_returns_a_session() {
        let (_, app) = app_with(StubOptions { autoconfirm: true });
        let resp = app
            .oneshot(post("/auth/v1/signup", signup_body("a@b.co", "123456789"), None))
            .await
            .unwrap();
        let session = body_json(resp).await;
        assert!(session["access_token"].is_string());
        assert!(session["user"]["email_confirmed_at"].is_string());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let (_, app) = app_with(StubOptions::default());
        let mut body = signup_body("a@b.co", "123456789");
        body["password"] = json!("abc");
        let resp = app.oneshot(post("/auth/v1/signup", body, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(resp).await["error_code"], "weak_password");
    }

    // ── POST /auth/v1/token ─────────────────────────────────────────

    #[tokio::test]
    async fn login_requires_confirmation_then_succeeds() {
        let (state, app) = app_with(StubOptions::default());
        app.clone()
            .oneshot(post("/auth/v1/signup", signup_body("a@b.co", "123456789"), None))
            .await
            .unwrap();

        let creds = json!({ "email": "a@b.co", "password": "secret1" });
        let resp = app
            .clone()
            .oneshot(post("/auth/v1/token?grant_type=password", creds.clone(), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error_code"], "email_not_confirmed");

        let token = state.issue_link("a@b.co", LinkKind::Signup);
        let resp = app
            .clone()
            .oneshot(get(
                &format!("/auth/v1/verify?type=signup&token={token}&redirect_to=http://site/cb"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers()["location"].to_str().unwrap();
        assert!(location.starts_with("http://site/cb#access_token="));

        let resp = app
            .oneshot(post("/auth/v1/token?grant_type=password", creds, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["token_type"], "bearer");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_grant() {
        let (_, app) = app_with(StubOptions { autoconfirm: true });
        app.clone()
            .oneshot(post("/auth/v1/signup", signup_body("a@b.co", "123456789"), None))
            .await
            .unwrap();
        let resp = app
            .oneshot(post(
                "/auth/v1/token?grant_type=password",
                json!({ "email": "a@b.co", "password": "nope123" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["error_description"],
            "Invalid login credentials"
        );
    }

    // ── GET/PUT /auth/v1/user, POST /auth/v1/logout ────────────────

    #[tokio::test]
    async fn session_token_reads_and_updates_the_user() {
        let (_, app) = app_with(StubOptions { autoconfirm: true });
        let session = body_json(
            app.clone()
                .oneshot(post("/auth/v1/signup", signup_body("a@b.co", "123456789"), None))
                .await
                .unwrap(),
        )
        .await;
        let token = session["access_token"].as_str().unwrap().to_string();

        let resp = app.clone().oneshot(get("/auth/v1/user", Some(&token))).await.unwrap();
        assert_eq!(body_json(resp).await["email"], "a@b.co");

        let mut req = post(
            "/auth/v1/user",
            json!({ "password": "secret1" }),
            Some(&token),
        );
        *req.method_mut() = axum::http::Method::PUT;
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(body_json(resp).await["error_code"], "same_password");

        let resp = app
            .clone()
            .oneshot(post("/auth/v1/logout", json!({}), Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app.oneshot(get("/auth/v1/user", Some(&token))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn link_for_unknown_account_is_expired() {
        let (state, app) = app_with(StubOptions::default());
        let token = state.issue_link("ghost@b.co", LinkKind::Signup);
        let resp = app
            .oneshot(get(&format!("/auth/v1/verify?type=signup&token={token}"), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["error_code"], "otp_expired");
    }

    #[tokio::test]
    async fn recover_and_resend_never_reveal_accounts() {
        let (_, app) = app_with(StubOptions::default());
        let resp = app
            .clone()
            .oneshot(post("/auth/v1/recover", json!({ "email": "nobody@b.co" }), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = app
            .oneshot(post(
                "/auth/v1/resend",
                json!({ "type": "signup", "email": "nobody@b.co" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
