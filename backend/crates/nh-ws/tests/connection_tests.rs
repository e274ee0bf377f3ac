mod common;

use common::{TestServerConfig, WsTestClient, create_test_server, create_test_server_with_config, wait_until};

use std::time::Duration;

use axum::http::StatusCode;

#[tokio::test]
async fn given_server_at_limit_when_new_connection_then_rejected_503() {
    // Given
    let test_server = create_test_server_with_config(TestServerConfig::with_strict_limits());
    let _client1 = WsTestClient::connect(&test_server.server).await;
    let _client2 = WsTestClient::connect(&test_server.server).await;

    // When
    let response = test_server.server.get_websocket("/ws").await;

    // Then
    response.assert_status_service_unavailable();
}

#[tokio::test]
async fn given_server_at_limit_when_client_disconnects_then_slot_freed() {
    // Given
    let test_server = create_test_server_with_config(TestServerConfig::with_strict_limits());
    let client1 = WsTestClient::connect(&test_server.server).await;
    let _client2 = WsTestClient::connect(&test_server.server).await;

    // When
    client1.close().await;
    let registry = test_server.app_state.registry.clone();
    let mut freed = false;
    for _ in 0..200 {
        if registry.total_count().await < 2 {
            freed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Then
    assert!(freed, "connection was not unregistered");
    let mut client3 = WsTestClient::connect(&test_server.server).await;
    client3.subscribe("acme").await;
}

#[tokio::test]
async fn given_origin_allowlist_when_foreign_origin_then_rejected_403() {
    // Given
    let config = TestServerConfig::with_allowed_origins(&["https://app.example.com"]);
    let test_server = create_test_server_with_config(config);

    // When
    let response = test_server
        .server
        .get_websocket("/ws")
        .add_header("Origin", "https://evil.example.com")
        .await;

    // Then
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(test_server.app_state.registry.total_count().await, 0);
}

#[tokio::test]
async fn given_origin_allowlist_when_listed_origin_then_accepted() {
    // Given
    let config = TestServerConfig::with_allowed_origins(&["https://app.example.com"]);
    let test_server = create_test_server_with_config(config);

    // When
    let mut client =
        WsTestClient::connect_with_origin(&test_server.server, "https://app.example.com").await;

    // Then
    client.subscribe("acme").await;
}

#[tokio::test]
async fn given_subscribed_connection_when_server_shuts_down_then_memberships_released() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;
    client.subscribe("acme").await;

    // When
    test_server.app_state.shutdown.shutdown();

    // Then
    let channels = test_server.app_state.channels.clone();
    assert!(wait_until(Duration::from_secs(2), || channels.member_count("acme") == 0).await);
    assert!(!channels.is_upstream_active("acme"));
}
