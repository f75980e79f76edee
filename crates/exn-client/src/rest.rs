//! Table API transport (`/rest/v1/<table>`).
//!
//! Filters use the query-string operator syntax of the table API:
//! `col=eq.value`, `col=ilike.*term*`, `order=col.desc`, `select=a,b`.
//! A single-row read asks for an object response; the service answers
//! `406` with code `PGRST116` when zero or several rows match.

use std::fmt::Display;
use std::sync::Arc;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use zeroize::Zeroizing;

use crate::error::PortalApiError;
use crate::retry::{send_checked, Resend};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MINIMAL: &str = "return=minimal";

/// Row filter and shaping parameters for a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// An empty query: every row, every column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    /// `column = value`.
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.into(), format!("eq.{value}")));
        self
    }

    /// Case-insensitive substring match on `column`.
    ///
    /// Characters the filter syntax reserves (`*`, `%`, `,`, `(`, `)` and
    /// `\`) are sent as the single-character wildcard `_`, so a term holding
    /// them matches any character in those positions.
    pub fn ilike_contains(mut self, column: &str, term: &str) -> Self {
        let term: String = term
            .chars()
            .map(|c| match c {
                '*' | '%' | ',' | '(' | ')' | '\\' => '_',
                c => c,
            })
            .collect();
        self.params.push((column.into(), format!("ilike.*{term}*")));
        self
    }

    /// Sort by `column`.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.params.push(("order".into(), format!("{column}.{dir}")));
        self
    }

    /// The encoded parameters, in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Shared HTTP plumbing for table sub-clients.
#[derive(Clone)]
pub(crate) struct RestTransport {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<Arc<Zeroizing<String>>>,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RestTransport {
    pub(crate) fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            access_token: None,
        }
    }

    /// Same transport, acting as the user that owns `token`.
    pub(crate) fn with_access_token(&self, token: Arc<Zeroizing<String>>) -> Self {
        Self {
            access_token: Some(token),
            ..self.clone()
        }
    }

    fn url(&self, table: &str) -> String {
        format!("{}rest/v1/{table}", self.base_url)
    }

    fn build(&self, method: Method, url: &str, query: &Query) -> reqwest::RequestBuilder {
        let req = self.http.request(method, url).query(query.params());
        match &self.access_token {
            Some(token) => req.bearer_auth(token.as_str()),
            None => req,
        }
    }

    async fn send<F>(
        &self,
        endpoint: &str,
        resend: Resend,
        make: F,
    ) -> Result<reqwest::Response, PortalApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        tracing::debug!(endpoint, "table request");
        send_checked(endpoint, resend, || make().send()).await
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<T, PortalApiError> {
        resp.json().await.map_err(|e| PortalApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    /// All rows of `table` matching `query`.
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, PortalApiError> {
        let endpoint = format!("GET /rest/v1/{table}");
        let url = self.url(table);
        let resp = self
            .send(&endpoint, Resend::Allowed, || {
                self.build(Method::GET, &url, query)
            })
            .await?;
        Self::decode(&endpoint, resp).await
    }

    /// Exactly one row of `table` matching `query`.
    ///
    /// Returns `Ok(None)` when the service reports zero (or several) rows.
    pub(crate) async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Option<T>, PortalApiError> {
        let endpoint = format!("GET /rest/v1/{table} (single)");
        let url = self.url(table);
        let result = self
            .send(&endpoint, Resend::Allowed, || {
                self.build(Method::GET, &url, query)
                    .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            })
            .await;

        match result {
            Ok(resp) => Self::decode(&endpoint, resp).await.map(Some),
            Err(e) if e.is_no_rows() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert `rows` and return what the service stored.
    pub(crate) async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>, PortalApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = format!("POST /rest/v1/{table}");
        let url = self.url(table);
        let resp = self
            .send(&endpoint, Resend::Never, || {
                self.build(Method::POST, &url, &Query::new())
                    .header("Prefer", PREFER_REPRESENTATION)
                    .json(rows)
            })
            .await?;
        Self::decode(&endpoint, resp).await
    }

    /// Insert `rows` without reading them back.
    pub(crate) async fn insert_minimal<B>(&self, table: &str, rows: &B) -> Result<(), PortalApiError>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = format!("POST /rest/v1/{table}");
        let url = self.url(table);
        self.send(&endpoint, Resend::Never, || {
            self.build(Method::POST, &url, &Query::new())
                .header("Prefer", PREFER_MINIMAL)
                .json(rows)
        })
        .await?;
        Ok(())
    }

    /// Apply `patch` to every row matching `query`; returns the updated rows.
    pub(crate) async fn update<B, T>(
        &self,
        table: &str,
        query: &Query,
        patch: &B,
    ) -> Result<Vec<T>, PortalApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = format!("PATCH /rest/v1/{table}");
        let url = self.url(table);
        let resp = self
            .send(&endpoint, Resend::Allowed, || {
                self.build(Method::PATCH, &url, query)
                    .header("Prefer", PREFER_REPRESENTATION)
                    .json(patch)
            })
            .await?;
        Self::decode(&endpoint, resp).await
    }

    /// Delete every row matching `query`.
    pub(crate) async fn delete(&self, table: &str, query: &Query) -> Result<(), PortalApiError> {
        let endpoint = format!("DELETE /rest/v1/{table}");
        let url = self.url(table);
        self.send(&endpoint, Resend::Allowed, || {
            self.build(Method::DELETE, &url, query)
        })
        .await?;
        Ok(())
    }
}
