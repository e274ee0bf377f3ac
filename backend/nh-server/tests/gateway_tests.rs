use nh_broker::{BrokerLink, InMemoryBrokerLink};
use nh_config::Config;
use nh_db::{TenantDirectory, TenantRepository};
use nh_server::{build_app_state, build_router, open_pool};
use nh_ws::ShutdownCoordinator;

use std::sync::Arc;
use std::time::Duration;

use axum_test::{TestServer, TestWebSocket};
use serde_json::{Value, json};
use tempfile::TempDir;

async fn create_server() -> (TestServer, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = open_pool(&dir.path().join("tenants.db"))
        .await
        .expect("database opens");

    let directory: Arc<dyn TenantDirectory> = Arc::new(TenantRepository::new(pool));
    let broker: Arc<dyn BrokerLink> = Arc::new(InMemoryBrokerLink::new(Duration::from_millis(500)));
    let state = build_app_state(&Config::default(), directory, broker, ShutdownCoordinator::new());

    let server = TestServer::builder()
        .http_transport()
        .build(build_router(state))
        .expect("Failed to create test server");

    (server, dir)
}

async fn connect(server: &TestServer) -> TestWebSocket {
    server.get_websocket("/ws").await.into_websocket().await
}

async fn request(ws: &mut TestWebSocket, frame: Value) -> Value {
    ws.send_json(&frame).await;
    receive(ws).await
}

async fn receive(ws: &mut TestWebSocket) -> Value {
    tokio::time::timeout(Duration::from_secs(5), ws.receive_json::<Value>())
        .await
        .expect("no frame received within 5s")
}

#[tokio::test]
async fn given_persistent_directory_when_channel_created_then_subscribers_receive_publishes() {
    // Given
    let (server, _dir) = create_server().await;
    let mut admin = connect(&server).await;
    let mut subscriber = connect(&server).await;

    let created = request(
        &mut admin,
        json!({"type": "create_channel", "channel": "acme", "owner_id": "owner-1"}),
    )
    .await;
    assert_eq!(created, json!({"type": "success", "message": "channel created: acme"}));

    let subscribed = request(
        &mut subscriber,
        json!({"type": "subscribe", "channel": "acme"}),
    )
    .await;
    assert_eq!(subscribed["message"], "subscribed to acme");

    // When
    let published = request(
        &mut admin,
        json!({"type": "publish", "channel": "acme", "content": {"alert": "disk full"}}),
    )
    .await;

    // Then
    assert_eq!(published["type"], "success");
    let frame = receive(&mut subscriber).await;
    assert_eq!(frame["type"], "message");
    assert_eq!(frame["channel"], "acme");
    assert_eq!(frame["content"], json!({"alert": "disk full"}));
}

#[tokio::test]
async fn given_persistent_directory_when_listing_then_created_channels_are_returned() {
    // Given
    let (server, _dir) = create_server().await;
    let mut client = connect(&server).await;
    for name in ["zeta", "alpha"] {
        request(&mut client, json!({"type": "create_channel", "channel": name})).await;
    }

    // When
    let listed = request(&mut client, json!({"type": "list_channels"})).await;

    // Then
    assert_eq!(listed, json!({"type": "channel_list", "channels": ["zeta", "alpha"]}));
}

#[tokio::test]
async fn given_router_when_unknown_path_then_not_found() {
    // Given
    let (server, _dir) = create_server().await;

    // When
    let response = server.get("/health").await;

    // Then
    response.assert_status_not_found();
}
