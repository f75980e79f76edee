//! Sending backend requests.
//!
//! A transport failure (refused, reset or timed-out connection) is resent
//! with exponential backoff when the request is safe to repeat. Any HTTP
//! response ends the loop: a non-2xx status becomes
//! [`PortalApiError::ApiError`] on the first answer.

use std::future::Future;
use std::time::Duration;

use crate::error::PortalApiError;

/// Extra attempts after the first one for a repeatable request.
const MAX_RESENDS: u32 = 3;

/// Delay before the first resend; doubles for each one after it.
const BACKOFF_BASE: Duration = Duration::from_millis(200);

/// Whether a request may go out again after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resend {
    /// Sending twice has the same effect as sending once.
    Allowed,
    /// Creates a record. A lost response does not mean the request was lost.
    Never,
}

impl Resend {
    fn attempts(self) -> u32 {
        match self {
            Resend::Allowed => MAX_RESENDS + 1,
            Resend::Never => 1,
        }
    }
}

/// Send the request built by `send` and return its 2xx response.
///
/// `endpoint` labels log lines and errors, e.g. `"GET /rest/v1/pdfs"`.
pub(crate) async fn send_checked<F, Fut>(
    endpoint: &str,
    resend: Resend,
    send: F,
) -> Result<reqwest::Response, PortalApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let attempts = resend.attempts();
    let mut attempt = 1;
    let resp = loop {
        match send().await {
            Ok(resp) => break resp,
            Err(source) if attempt < attempts => {
                let delay = BACKOFF_BASE * 2u32.pow(attempt - 1);
                tracing::warn!(
                    endpoint,
                    attempt,
                    "backend unreachable, resending in {delay:?}: {source}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(source) => {
                return Err(PortalApiError::Http {
                    endpoint: endpoint.into(),
                    source,
                })
            }
        }
    };

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(PortalApiError::ApiError {
            endpoint: endpoint.into(),
            status,
            body,
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap()
    }

    /// Count the attempts made against a closed port.
    async fn attempts_against_closed_port(resend: Resend) -> (u32, PortalApiError) {
        let http = http();
        let calls = AtomicU32::new(0);
        let err = send_checked("GET /closed", resend, || {
            calls.fetch_add(1, Ordering::SeqCst);
            // Nothing listens on port 1.
            http.get("http://127.0.0.1:1/").send()
        })
        .await
        .unwrap_err();
        (calls.load(Ordering::SeqCst), err)
    }

    #[tokio::test]
    async fn repeatable_request_is_resent_until_attempts_run_out() {
        let (calls, err) = attempts_against_closed_port(Resend::Allowed).await;
        assert_eq!(calls, MAX_RESENDS + 1);
        assert!(err.is_transport());
        assert!(err.to_string().contains("GET /closed"));
    }

    #[tokio::test]
    async fn record_creating_request_is_sent_once() {
        let (calls, err) = attempts_against_closed_port(Resend::Never).await;
        assert_eq!(calls, 1);
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn error_statuses_are_returned_without_resending() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boom"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let http = http();
        for (route, want) in [("/boom", 503), ("/missing", 404)] {
            let url = format!("{}{route}", mock_server.uri());
            let err = send_checked(route, Resend::Allowed, || http.get(&url).send())
                .await
                .unwrap_err();
            match err {
                PortalApiError::ApiError { status, .. } => assert_eq!(status, want),
                other => panic!("expected ApiError, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn success_passes_through() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/ok", mock_server.uri());
        let http = http();
        let resp = send_checked("GET /ok", Resend::Never, || http.get(&url).send())
            .await
            .unwrap();
        assert_eq!(resp.text().await.unwrap(), "fine");
    }
}
