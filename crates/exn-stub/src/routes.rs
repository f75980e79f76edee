//! Route definitions for the portal backend stub.
//!
//! Implements the table and auth endpoints that `exn-client` actually calls,
//! with status codes and error bodies shaped like the hosted service's, so
//! the client's error mapping behaves the same against either.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::query::TableQuery;
use crate::store::{now_rfc3339, unique_keys, AppState};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Build the complete router with all stub routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/auth/v1/health", get(auth::health))
        .route("/auth/v1/signup", post(auth::signup))
        .route("/auth/v1/token", post(auth::token))
        .route("/auth/v1/verify", get(auth::verify))
        .route("/auth/v1/user", get(auth::get_user).put(auth::update_user))
        .route("/auth/v1/recover", post(auth::recover))
        .route("/auth/v1/resend", post(auth::resend))
        .route("/auth/v1/logout", post(auth::logout))
        // Tables
        .route(
            "/rest/v1/:table",
            get(table_select)
                .post(table_insert)
                .patch(table_update)
                .delete(table_delete),
        )
        .fallback(not_implemented)
        .layer(middleware::from_fn(require_apikey))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

/// Every request must carry the project key header.
async fn require_apikey(req: Request, next: Next) -> Response {
    let present = req
        .headers()
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());
    if !present {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "No API key found in request",
                "hint": "No `apikey` request header or url param was found."
            })),
        )
            .into_response();
    }
    next.run(req).await
}

// ── Helpers ─────────────────────────────────────────────────────────

fn rest_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "code": code,
            "details": null,
            "hint": null,
            "message": message.into()
        })),
    )
        .into_response()
}

fn unknown_table(table: &str) -> Response {
    rest_error(
        StatusCode::NOT_FOUND,
        "42P01",
        format!("relation \"public.{table}\" does not exist"),
    )
}

fn wants_single(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(SINGLE_OBJECT))
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("return=representation"))
}

fn parse_query(params: &[(String, String)]) -> Result<TableQuery, Response> {
    TableQuery::parse(params).map_err(|msg| rest_error(StatusCode::BAD_REQUEST, "PGRST100", msg))
}

/// Rows as the response body the client asked for.
fn respond_rows(headers: &HeaderMap, status: StatusCode, rows: Vec<Value>) -> Response {
    if wants_single(headers) {
        return match <[Value; 1]>::try_from(rows) {
            Ok([row]) => (status, Json(row)).into_response(),
            Err(rows) => not_single(rows.len()),
        };
    }
    (status, Json(Value::Array(rows))).into_response()
}

/// Reply to a single-object read that matched `rows` rows.
fn not_single(rows: usize) -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        Json(json!({
            "code": "PGRST116",
            "details": format!("The result contains {rows} rows"),
            "hint": null,
            "message": "JSON object requested, multiple (or no) rows returned"
        })),
    )
        .into_response()
}

/// Column set of `row` that collides with an existing row, if any.
fn conflict(existing: &[Value], row: &Value, table: &str) -> Option<String> {
    unique_keys(table).iter().find_map(|cols| {
        let clash = existing
            .iter()
            .any(|other| cols.iter().all(|c| row.get(*c).is_some() && row.get(*c) == other.get(*c)));
        clash.then(|| cols.join(", "))
    })
}

// ── Tables ──────────────────────────────────────────────────────────

async fn table_select(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let query = match parse_query(&params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let Some(rows) = state.tables().get(&table) else {
        return unknown_table(&table);
    };
    let matched: Vec<Value> = rows.iter().filter(|r| query.matches(r)).cloned().collect();
    drop(rows);
    respond_rows(&headers, StatusCode::OK, query.shape(matched))
}

async fn table_insert(
    State(state): State<AppState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let incoming = match body {
        Value::Array(rows) => rows,
        row @ Value::Object(_) => vec![row],
        _ => {
            return rest_error(
                StatusCode::BAD_REQUEST,
                "PGRST102",
                "body must be an object or an array of objects",
            )
        }
    };

    let Some(mut rows) = state.tables().get_mut(&table) else {
        return unknown_table(&table);
    };

    let mut created = Vec::with_capacity(incoming.len());
    for row in incoming {
        let Value::Object(mut fields) = row else {
            return rest_error(StatusCode::BAD_REQUEST, "PGRST102", "rows must be objects");
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::from(state.next_row_id()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::from(now_rfc3339()));
        if table == "pdfs" {
            fields.entry("average_rating").or_insert_with(|| json!(0));
            fields.entry("total_ratings").or_insert_with(|| json!(0));
        }
        let row = Value::Object(fields);

        if let Some(cols) = conflict(&rows, &row, &table)
            .or_else(|| conflict(&created, &row, &table))
        {
            return rest_error(
                StatusCode::CONFLICT,
                "23505",
                format!("duplicate key value violates unique constraint on {table} ({cols})"),
            );
        }
        created.push(row);
    }
    rows.extend(created.iter().cloned());
    drop(rows);

    tracing::debug!(table = %table, count = created.len(), "rows inserted");
    if wants_representation(&headers) {
        respond_rows(&headers, StatusCode::CREATED, created)
    } else {
        StatusCode::CREATED.into_response()
    }
}

async fn table_update(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    let query = match parse_query(&params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let Some(mut rows) = state.tables().get_mut(&table) else {
        return unknown_table(&table);
    };

    let mut updated = Vec::new();
    for row in rows.iter_mut().filter(|r| query.matches(r)) {
        if let Some(fields) = row.as_object_mut() {
            for (k, v) in &patch {
                if k != "id" {
                    fields.insert(k.clone(), v.clone());
                }
            }
        }
        updated.push(row.clone());
    }
    drop(rows);

    tracing::debug!(table = %table, count = updated.len(), "rows updated");
    if wants_representation(&headers) {
        respond_rows(&headers, StatusCode::OK, query.shape(updated))
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn table_delete(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let query = match parse_query(&params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let Some(mut rows) = state.tables().get_mut(&table) else {
        return unknown_table(&table);
    };

    let (removed, kept): (Vec<Value>, Vec<Value>) =
        rows.drain(..).partition(|r| query.matches(r));
    *rows = kept;
    drop(rows);

    tracing::debug!(table = %table, count = removed.len(), "rows deleted");
    if wants_representation(&headers) {
        respond_rows(&headers, StatusCode::OK, removed)
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}
