//! Contract tests for AccountClient flows against the auth API.

mod common;

use common::{no_rows, test_client};
use exn_client::AccountError;
use exn_core::{AccountForm, ExamType, FormField, NoticeKind};
use wiremock::matchers::{any, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signup_form() -> AccountForm {
    AccountForm {
        full_name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        mobile: "9876543210".into(),
        exam_type: Some(ExamType::Clerk),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
        accept_terms: true,
    }
}

fn login_form() -> AccountForm {
    AccountForm {
        email: "asha@example.com".into(),
        password: "secret1".into(),
        ..AccountForm::default()
    }
}

fn auth_user_json() -> serde_json::Value {
    serde_json::json!({
        "id": "550e8400-e29b-41d4-a716-446655440000",
        "email": "asha@example.com",
        "email_confirmed_at": null,
        "user_metadata": {
            "user_id": "123456789",
            "full_name": "Asha Rao",
            "mobile": "9876543210",
            "exam_type": "CLERK"
        }
    })
}

// ── signup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_allocates_id_and_sends_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("select", "user_id"))
        .respond_with(no_rows())
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(query_param("redirect_to", "http://localhost:5173/auth/callback"))
        .and(body_partial_json(serde_json::json!({
            "email": "asha@example.com",
            "password": "secret1",
            "data": { "full_name": "Asha Rao", "mobile": "9876543210", "exam_type": "CLERK" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_user_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let outcome = client.account().sign_up(&signup_form()).await.unwrap();
    assert!(outcome.response.needs_verification());
    assert_eq!(outcome.notice.kind, NoticeKind::Success);
    assert_eq!(
        outcome.notice.message,
        "Account created! Please check your email for verification."
    );

    let requests = mock_server.received_requests().await.unwrap();
    let signup = requests
        .iter()
        .find(|r| r.url.path() == "/auth/v1/signup")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&signup.body).unwrap();
    // The user number travels as a 9-digit string.
    let sent = body["data"]["user_id"].as_str().unwrap();
    assert_eq!(sent.len(), 9);
    assert_eq!(sent, outcome.user_id.to_string());
}

#[tokio::test]
async fn sign_up_invalid_form_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let mut form = signup_form();
    form.email = "not-an-email".into();
    form.mobile = "12345".into();
    form.accept_terms = false;

    match client.account().sign_up(&form).await.unwrap_err() {
        AccountError::Invalid(errors) => {
            assert_eq!(errors.len(), 3);
            assert_eq!(errors.get(FormField::Email), Some("Email is invalid"));
            assert_eq!(
                errors.get(FormField::Mobile),
                Some("Mobile number must be 10 digits")
            );
        }
        other => panic!("expected Invalid, got: {other:?}"),
    }
}

#[tokio::test]
async fn sign_up_gives_up_when_every_id_is_taken() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "user_id": 111111111 })),
        )
        .expect(10)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.account().sign_up(&signup_form()).await.unwrap_err();
    assert_eq!(
        err.notice().message,
        "Error creating account. Please try again."
    );
}

#[tokio::test]
async fn sign_up_already_registered_maps_notice() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(no_rows())
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "code": 422,
            "error_code": "user_already_exists",
            "msg": "User already registered"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.account().sign_up(&signup_form()).await.unwrap_err();
    assert_eq!(
        err.notice().message,
        "Email already registered. Please try logging in."
    );
}

// ── sign in ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_loads_profile_with_user_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "user-jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": auth_user_json()
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.asha@example.com"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "user_id": 123456789,
            "full_name": "Asha Rao",
            "email": "asha@example.com",
            "mobile": "9876543210",
            "exam_type": "CLERK",
            "created_at": "2026-01-15T12:00:00Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let signed_in = client.account().sign_in(&login_form()).await.unwrap();
    assert_eq!(signed_in.session.access_token, "user-jwt");
    assert_eq!(signed_in.profile.user_id.get(), 123_456_789);
    assert_eq!(signed_in.profile.exam_type, ExamType::Clerk);
    assert_eq!(signed_in.notice.message, "Welcome back, Asha Rao!");
}

#[tokio::test]
async fn sign_in_failures_map_to_notices() {
    let cases = [
        (
            serde_json::json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
            "Invalid email or password. Please try again.",
        ),
        (
            serde_json::json!({ "code": 400, "error_code": "email_not_confirmed", "msg": "Email not confirmed" }),
            "Please verify your email first. Check your email and spam folder.",
        ),
        (
            serde_json::json!({ "msg": "Request rate limit reached" }),
            "Login failed. Please try again.",
        ),
    ];

    for (body, expected) in cases {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let err = client.account().sign_in(&login_form()).await.unwrap_err();
        assert_eq!(err.notice().message, expected);
    }
}

#[tokio::test]
async fn sign_in_without_profile_row_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "user-jwt",
            "user": auth_user_json()
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(no_rows())
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.account().sign_in(&login_form()).await.unwrap_err();
    assert_eq!(
        err.notice().message,
        "Error loading user profile. Please try again."
    );
}

// ── recovery, verification, resend ───────────────────────────────────

#[tokio::test]
async fn password_reset_request_links_to_reset_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(query_param("redirect_to", "http://localhost:5173/reset-password"))
        .and(body_partial_json(serde_json::json!({ "email": "asha@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let form = AccountForm {
        email: "asha@example.com".into(),
        ..AccountForm::default()
    };
    let notice = client.account().request_password_reset(&form).await.unwrap();
    assert_eq!(notice.message, "Password reset link sent to your email!");
}

#[tokio::test]
async fn password_update_echoes_service_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer recovery-jwt"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "msg": "New password should be different from the old password."
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let form = AccountForm {
        password: "secret1".into(),
        confirm_password: "secret1".into(),
        ..AccountForm::default()
    };
    let err = client
        .account()
        .update_password("recovery-jwt", &form)
        .await
        .unwrap_err();
    assert_eq!(
        err.notice().message,
        "Error: New password should be different from the old password."
    );
}

#[tokio::test]
async fn password_update_checks_confirmation_first() {
    let mock_server = MockServer::start().await;
    let client = test_client(&mock_server);
    let form = AccountForm {
        password: "secret1".into(),
        confirm_password: "secret2".into(),
        ..AccountForm::default()
    };
    let err = client
        .account()
        .update_password("recovery-jwt", &form)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Invalid(_)));
}

#[tokio::test]
async fn verify_reports_expired_link() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_user_json()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "msg": "invalid JWT"
        })))
        .mount(&mock_server)
        .await;

    let account = test_client(&mock_server).account();
    assert_eq!(
        account.verify(Some("good")).await.message,
        "Your account has been successfully verified!"
    );
    let expired = "Verification link expired. Please request a new one.";
    assert_eq!(account.verify(Some("stale")).await.message, expired);
    assert_eq!(account.verify(None).await.message, expired);
}

#[tokio::test]
async fn resend_sends_signup_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/resend"))
        .and(body_partial_json(serde_json::json!({
            "type": "signup",
            "email": "asha@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let notice = client
        .account()
        .resend_verification("asha@example.com")
        .await
        .unwrap();
    assert_eq!(
        notice.message,
        "Verification email sent again. Please check your spam folder."
    );
}
