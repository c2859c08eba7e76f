//! GraphQL operation tests against a mock endpoint.

use chatlog_gql::retry::RetryConfig;
use chatlog_gql::{GqlClient, GqlError, chat_log, user, videos};
use chatlog_types::{BroadcastsAgo, Login, UserId};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn client(server: &MockServer) -> GqlClient {
    GqlClient::with_endpoint(common::auth_headers(), common::gql_url(server))
        .with_retry(RetryConfig::none())
}

fn login(raw: &str) -> Login {
    Login::parse(raw).unwrap()
}

#[tokio::test]
async fn user_lookup_resolves_known_login() {
    let server = common::start_gql_mock().await;
    common::mount_user_id(&server, "somechannel", Some("12345")).await;

    let id = user::user_id_by_login(&client(&server), &login("somechannel"))
        .await
        .unwrap();
    assert_eq!(id, Some(UserId::new("12345")));
}

#[tokio::test]
async fn user_lookup_unknown_login_is_none() {
    let server = common::start_gql_mock().await;
    common::mount_user_id(&server, "ghost", None).await;

    let id = user::user_id_by_login(&client(&server), &login("ghost"))
        .await
        .unwrap();
    assert_eq!(id, None);
}

#[tokio::test]
async fn requests_carry_all_scraped_headers() {
    let server = common::start_gql_mock().await;
    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(header("authorization", "test-authorization"))
        .and(header("client-id", "test-client-id"))
        .and(header("client-integrity", "test-client-integrity"))
        .and(header("client-session-id", "test-client-session-id"))
        .and(header("client-version", "test-client-version"))
        .and(header("x-device-id", "test-x-device-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "user": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    user::user_id_by_login(&client(&server), &login("anyone"))
        .await
        .unwrap();
}

#[tokio::test]
async fn requests_carry_persisted_query_envelope() {
    let server = common::start_gql_mock().await;
    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(serde_json::json!({
            "operationName": "GetUserID",
            "extensions": { "persistedQuery": { "version": 1 } },
            "variables": { "lookupType": "ACTIVE" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "user": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    user::user_id_by_login(&client(&server), &login("anyone"))
        .await
        .unwrap();
}

#[tokio::test]
async fn broadcast_window_takes_the_last_listed_archive() {
    let server = common::start_gql_mock().await;
    // Two archives newest-first; asking for 2 broadcasts ago means the
    // endpoint returns both and the older one wins.
    common::mount_broadcasts(
        &server,
        &[
            ("2024-05-02T18:00:00Z", 7200),
            ("2024-05-01T12:00:00Z", 3600),
        ],
    )
    .await;

    let window = videos::broadcast_window(
        &client(&server),
        &login("somechannel"),
        BroadcastsAgo::parse("2").unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(window.start().to_rfc3339(), "2024-05-01T12:00:00+00:00");
    assert_eq!(window.end().to_rfc3339(), "2024-05-01T13:00:00+00:00");
}

#[tokio::test]
async fn broadcast_window_errors_without_archives() {
    let server = common::start_gql_mock().await;
    common::mount_broadcasts(&server, &[]).await;

    let result = videos::broadcast_window(
        &client(&server),
        &login("quietchannel"),
        BroadcastsAgo::parse("1").unwrap(),
    )
    .await;
    assert!(matches!(result, Err(GqlError::NoBroadcasts)));
}

#[tokio::test]
async fn chat_page_decodes_messages_and_cursor() {
    let server = common::start_gql_mock().await;
    common::mount_chat_page(
        &server,
        "",
        vec![
            common::chat_edge("2024-05-01T15:00:00Z", "viewer", "hi", "c1"),
            common::chat_edge("2024-05-01T14:00:00Z", "viewer", "earlier", "c2"),
        ],
        true,
    )
    .await;

    let page = chat_log::chat_log_page(
        &client(&server),
        &UserId::new("100"),
        &UserId::new("200"),
        "",
    )
    .await
    .unwrap();

    assert_eq!(page.messages.len(), 2);
    assert_eq!(page.messages[0].text, "hi");
    assert_eq!(page.messages[1].sender, "viewer");
    // Next cursor is the last edge's cursor.
    assert_eq!(page.next_cursor.as_deref(), Some("c2"));
}

#[tokio::test]
async fn chat_page_final_page_has_no_cursor() {
    let server = common::start_gql_mock().await;
    common::mount_chat_page(
        &server,
        "",
        vec![common::chat_edge(
            "2024-05-01T15:00:00Z",
            "viewer",
            "only",
            "c1",
        )],
        false,
    )
    .await;

    let page = chat_log::chat_log_page(
        &client(&server),
        &UserId::new("100"),
        &UserId::new("200"),
        "",
    )
    .await
    .unwrap();
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn integrity_rejection_maps_to_dedicated_error() {
    let server = common::start_gql_mock().await;
    common::mount_integrity_failure(&server).await;

    let result = user::user_id_by_login(&client(&server), &login("anyone")).await;
    assert!(matches!(result, Err(GqlError::IntegrityCheck)));
}

#[tokio::test]
async fn http_error_surfaces_status() {
    let server = common::start_gql_mock().await;
    Mock::given(method("POST"))
        .and(path("/gql"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .mount(&server)
        .await;

    let result = user::user_id_by_login(&client(&server), &login("anyone")).await;
    match result {
        Err(GqlError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, "nope");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn retryable_status_is_retried_until_success() {
    let server = common::start_gql_mock().await;

    // First response: 500. Mounted as a scoped one-shot so the retry hits
    // the success mock below.
    Mock::given(method("POST"))
        .and(path("/gql"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_user_id(&server, "flaky", Some("9")).await;

    let client = GqlClient::with_endpoint(common::auth_headers(), common::gql_url(&server))
        .with_retry(RetryConfig {
            initial_delay: std::time::Duration::from_millis(1),
            ..RetryConfig::default()
        });

    let id = user::user_id_by_login(&client, &login("flaky")).await.unwrap();
    assert_eq!(id, Some(UserId::new("9")));
}
