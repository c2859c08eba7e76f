//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatlog_types::{AuthHeaders, REQUIRED_HEADERS};

/// Start a mock server that simulates the GraphQL endpoint.
pub async fn start_gql_mock() -> MockServer {
    MockServer::start().await
}

/// The endpoint URL a client should be pointed at for `server`.
pub fn gql_url(server: &MockServer) -> String {
    format!("{}/gql", server.uri())
}

/// A complete scraped-header bundle with placeholder values.
pub fn auth_headers() -> AuthHeaders {
    let map: HashMap<String, String> = REQUIRED_HEADERS
        .iter()
        .map(|name| ((*name).to_string(), format!("test-{name}")))
        .collect();
    AuthHeaders::from_scraped(map).unwrap()
}

/// Curl text carrying all six required headers.
pub fn curl_text() -> String {
    let mut text = String::from("curl 'https://gql.example.com/gql' \\\n");
    for name in REQUIRED_HEADERS {
        text.push_str(&format!("  -H '{name}: test-{name}' \\\n"));
    }
    text.push_str("  --data-raw '[]'");
    text
}

/// Mount a `GetUserID` response: `Some(id)` resolves, `None` is an unknown
/// login.
pub async fn mount_user_id(server: &MockServer, login: &str, id: Option<&str>) {
    let user = match id {
        Some(id) => json!({ "id": id }),
        None => serde_json::Value::Null,
    };
    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(json!({
            "operationName": "GetUserID",
            "variables": { "login": login }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "user": user } })),
        )
        .mount(server)
        .await;
}

/// Mount a `FilterableVideoTower_Videos` response listing broadcasts
/// newest-first as `(publishedAt, lengthSeconds)` pairs.
pub async fn mount_broadcasts(server: &MockServer, broadcasts: &[(&str, u64)]) {
    let edges: Vec<_> = broadcasts
        .iter()
        .map(|(published_at, length_seconds)| {
            json!({ "node": {
                "publishedAt": published_at,
                "lengthSeconds": length_seconds
            } })
        })
        .collect();
    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(json!({
            "operationName": "FilterableVideoTower_Videos"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": { "videos": { "edges": edges } } }
        })))
        .mount(server)
        .await;
}

/// One chat-log edge.
pub fn chat_edge(sent_at: &str, sender: &str, text: &str, cursor: &str) -> serde_json::Value {
    json!({
        "cursor": cursor,
        "node": {
            "sentAt": sent_at,
            "sender": { "displayName": sender },
            "content": { "text": text }
        }
    })
}

/// Mount a `ViewerCardModLogsMessagesBySender` page for a given cursor.
pub async fn mount_chat_page(
    server: &MockServer,
    cursor: &str,
    edges: Vec<serde_json::Value>,
    has_next_page: bool,
) {
    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(json!({
            "operationName": "ViewerCardModLogsMessagesBySender",
            "variables": { "cursor": cursor }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "logs": { "messages": {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next_page }
            } } }
        })))
        .mount(server)
        .await;
}

/// Mount an integrity-check rejection for every request.
pub async fn mount_integrity_failure(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/gql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "failed integrity check" }]
        })))
        .mount(server)
        .await;
}
