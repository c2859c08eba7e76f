//! End-to-end application flows: auth entry, channel management, fetching.

use std::time::Duration;

use chatlog_config::SettingsStore;
use chatlog_engine::{App, ModeChoice};

use crate::common;

fn app_with_endpoint(dir: &tempfile::TempDir, endpoint: String) -> App {
    let store = SettingsStore::at(dir.path().join("settings.json"));
    App::new(store).with_endpoint(endpoint)
}

/// Tick the app until its background operation finishes.
async fn drain(app: &mut App) {
    for _ in 0..500 {
        app.tick();
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("background operation did not finish");
}

fn console_texts(app: &App) -> Vec<String> {
    app.console().map(|line| line.text.clone()).collect()
}

#[tokio::test]
async fn auth_channel_identity_fetch_flow() {
    let server = common::start_gql_mock().await;
    common::mount_user_id(&server, "somechannel", Some("100")).await;
    common::mount_user_id(&server, "me", Some("200")).await;
    common::mount_chat_page(
        &server,
        "",
        vec![
            common::chat_edge("2024-05-01T15:00:00Z", "me", "newest message", "c1"),
            common::chat_edge("2024-05-01T14:00:00Z", "me", "older message", "c2"),
        ],
        false,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with_endpoint(&dir, common::gql_url(&server));

    // Paste auth data.
    assert!(app.apply_curl_text(&common::curl_text()));
    assert!(app.settings.auth.is_some());

    // Register the channel and the identity via lookups.
    app.add_channel("somechannel");
    assert!(app.is_busy());
    drain(&mut app).await;
    assert_eq!(app.settings.channels.len(), 1);

    app.set_identity("me");
    drain(&mut app).await;
    assert_eq!(app.settings.identity.as_ref().unwrap().id.as_str(), "200");

    // Fetch everything.
    app.selected_mode = Some(ModeChoice::All);
    app.confirm();
    assert!(app.fetch_in_progress());
    drain(&mut app).await;

    let texts = console_texts(&app);
    assert!(
        texts.iter().any(|t| t.ends_with("me: newest message")),
        "console: {texts:?}"
    );
    assert!(
        texts.iter().any(|t| t.ends_with("me: older message")),
        "console: {texts:?}"
    );
    assert!(
        !app.console().any(|line| line.is_error),
        "unexpected error lines: {texts:?}"
    );

    // Settings survived on disk across the whole flow.
    let reloaded = SettingsStore::at(dir.path().join("settings.json")).load();
    assert_eq!(reloaded.channels.len(), 1);
    assert!(reloaded.auth.is_some());
    assert!(reloaded.identity.is_some());
}

#[tokio::test]
async fn unknown_channel_reports_not_found() {
    let server = common::start_gql_mock().await;
    common::mount_user_id(&server, "ghost", None).await;

    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with_endpoint(&dir, common::gql_url(&server));
    assert!(app.apply_curl_text(&common::curl_text()));

    app.add_channel("ghost");
    drain(&mut app).await;

    assert_eq!(
        console_texts(&app).first().map(String::as_str),
        Some("Channel 'ghost' not found!")
    );
    assert!(app.settings.channels.is_empty());
}

#[tokio::test]
async fn stop_request_ends_an_endless_fetch() {
    let server = common::start_gql_mock().await;
    common::mount_user_id(&server, "somechannel", Some("100")).await;
    common::mount_user_id(&server, "me", Some("200")).await;
    // Pages that never run out: "" -> c1 -> c1 -> ...
    common::mount_chat_page(
        &server,
        "",
        vec![common::chat_edge("2024-05-01T15:00:00Z", "me", "spam", "c1")],
        true,
    )
    .await;
    common::mount_chat_page(
        &server,
        "c1",
        vec![common::chat_edge("2024-05-01T15:00:00Z", "me", "spam", "c1")],
        true,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with_endpoint(&dir, common::gql_url(&server));
    assert!(app.apply_curl_text(&common::curl_text()));
    app.add_channel("somechannel");
    drain(&mut app).await;
    app.set_identity("me");
    drain(&mut app).await;

    app.selected_mode = Some(ModeChoice::All);
    app.confirm();
    assert!(app.fetch_in_progress());

    // Let it run a little, then ask it to stop.
    for _ in 0..10 {
        app.tick();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    app.stop();
    drain(&mut app).await;

    assert!(!app.fetch_in_progress());
    assert!(
        !app.console().any(|line| line.is_error),
        "stop must not be an error: {:?}",
        console_texts(&app)
    );
}

#[tokio::test]
async fn integrity_failure_reaches_the_console() {
    let server = common::start_gql_mock().await;
    common::mount_integrity_failure(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with_endpoint(&dir, common::gql_url(&server));
    assert!(app.apply_curl_text(&common::curl_text()));

    // Channel and identity are injected directly; the endpoint would reject
    // the lookups too, which is not what this test is about.
    app.settings.add_channel(
        chatlog_types::Login::parse("somechannel").unwrap(),
        chatlog_types::UserId::new("100"),
    );
    app.selected_channel = Some(0);
    app.settings.identity = Some(chatlog_types::Identity {
        login: chatlog_types::Login::parse("me").unwrap(),
        id: chatlog_types::UserId::new("200"),
    });

    app.selected_mode = Some(ModeChoice::All);
    app.confirm();
    drain(&mut app).await;

    let top = app.console().next().unwrap();
    assert!(top.is_error);
    assert_eq!(
        top.text,
        "Failed integrity check! Auth data is probably out of date."
    );
}
