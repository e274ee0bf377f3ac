mod common;

use common::{TestServerConfig, WsTestClient, create_test_server, create_test_server_with_config};

use std::time::Duration;

use serde_json::json;

#[tokio::test]
async fn given_unknown_channel_when_subscribe_then_not_found() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client
        .request(json!({"type": "subscribe", "channel": "ghost"}))
        .await;

    // Then
    assert_eq!(
        reply,
        json!({"type": "error", "message": "channel not found: ghost"})
    );
    assert_eq!(test_server.app_state.channels.channel_count(), 0);
}

#[tokio::test]
async fn given_subscription_when_subscribe_again_then_already_subscribed() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;
    client.subscribe("acme").await;

    // When
    let reply = client
        .request(json!({"type": "subscribe", "channel": "acme"}))
        .await;

    // Then
    assert_eq!(reply["type"], "success");
    assert_eq!(reply["message"], "already subscribed to acme");
    assert_eq!(test_server.app_state.channels.member_count("acme"), 1);
}

#[tokio::test]
async fn given_subscription_when_unsubscribe_then_no_more_deliveries() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;
    let mut producer = WsTestClient::connect(&test_server.server).await;
    client.subscribe("acme").await;

    // When
    let reply = client
        .request(json!({"type": "unsubscribe", "channel": "acme"}))
        .await;

    // Then
    assert_eq!(reply["message"], "unsubscribed from acme");
    producer.publish("acme", json!(1)).await;
    client.expect_silence(Duration::from_millis(150)).await;
    assert!(!test_server.app_state.channels.is_upstream_active("acme"));
}

#[tokio::test]
async fn given_existing_channel_when_create_then_conflict_and_directory_unchanged() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client
        .request(json!({"type": "create_channel", "channel": "acme"}))
        .await;

    // Then
    assert_eq!(
        reply,
        json!({"type": "error", "message": "channel already exists: acme"})
    );
    let listed = client.request(json!({"type": "list_channels"})).await;
    assert_eq!(listed["channels"], json!(["acme", "beta", "other"]));
}

#[tokio::test]
async fn given_new_channel_when_created_then_listed_and_subscribable() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client
        .request(json!({"type": "create_channel", "channel": "  gamma  ", "owner_id": "owner-1"}))
        .await;

    // Then
    assert_eq!(reply, json!({"type": "success", "message": "channel created: gamma"}));
    let listed = client.request(json!({"type": "list_channels"})).await;
    assert_eq!(listed["type"], "channel_list");
    assert_eq!(listed["channels"], json!(["acme", "beta", "other", "gamma"]));
    client.subscribe("gamma").await;
}

#[tokio::test]
async fn given_unsupported_type_when_sent_then_error_and_connection_usable() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client.request(json!({"type": "shout", "channel": "acme"})).await;

    // Then
    assert_eq!(
        reply,
        json!({"type": "error", "message": "unsupported message type: shout"})
    );
    client.subscribe("acme").await;
}

#[tokio::test]
async fn given_binary_frame_when_sent_then_error_reply() {
    // Given
    let test_server = create_test_server();
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    client.send_binary(vec![1, 2, 3]).await;

    // Then
    let reply = client.receive_json().await;
    assert_eq!(
        reply,
        json!({"type": "error", "message": "binary frames are not supported"})
    );
}

#[tokio::test]
async fn given_small_frame_limit_when_oversized_frame_then_rejected() {
    // Given
    let test_server = create_test_server_with_config(TestServerConfig::with_max_frame_bytes(64));
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client
        .publish("acme", json!({"padding": "x".repeat(128)}))
        .await;

    // Then
    assert_eq!(
        reply,
        json!({"type": "error", "message": "frame exceeds 64 bytes"})
    );
    client.subscribe("acme").await;
}

#[tokio::test]
async fn given_client_publish_disabled_when_publish_then_rejected() {
    // Given
    let config = TestServerConfig {
        allow_client_publish: false,
        ..Default::default()
    };
    let test_server = create_test_server_with_config(config);
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client.publish("acme", json!(1)).await;

    // Then
    assert_eq!(
        reply,
        json!({"type": "error", "message": "publishing is disabled"})
    );
}

#[tokio::test]
async fn given_channel_keys_required_when_subscribe_without_key_then_unauthorized() {
    // Given
    let config = TestServerConfig {
        require_channel_key: true,
        ..Default::default()
    };
    let test_server = create_test_server_with_config(config);
    let mut client = WsTestClient::connect(&test_server.server).await;

    // When
    let reply = client
        .request(json!({"type": "subscribe", "channel": "acme"}))
        .await;

    // Then
    assert_eq!(reply, json!({"type": "error", "message": "unauthorized"}));
    assert_eq!(test_server.app_state.channels.member_count("acme"), 0);
}
