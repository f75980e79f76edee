//! Shared helpers for client contract tests.

#![allow(dead_code)]

use exn_client::{PortalApiConfig, PortalClient};
use wiremock::MockServer;

pub const ANON_KEY: &str = "anon-test-key";

pub fn test_client(mock_server: &MockServer) -> PortalClient {
    let config = PortalApiConfig {
        project_url: format!("{}/", mock_server.uri()).parse().unwrap(),
        anon_key: zeroize::Zeroizing::new(ANON_KEY.into()),
        site_url: "http://localhost:5173/".parse().unwrap(),
        timeout_secs: 5,
    };
    PortalClient::new(config).unwrap()
}

pub fn document_json(id: i64, title: &str, tags: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "Practice material",
        "image_path": "/images/pdf-thumbnail.jpg",
        "tags": tags,
        "size_mb": 2.5,
        "preview_link": "https://drive.example.com/preview",
        "download_link": "https://drive.example.com/download",
        "average_rating": 0,
        "total_ratings": 0,
        "created_at": "2026-01-15T12:00:00Z",
        "updated_at": "2026-01-15T12:00:00Z"
    })
}

pub fn no_rows() -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(406).set_body_json(serde_json::json!({
        "code": "PGRST116",
        "details": "The result contains 0 rows",
        "hint": null,
        "message": "JSON object requested, multiple (or no) rows returned"
    }))
}
