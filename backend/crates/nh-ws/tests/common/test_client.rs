#![allow(dead_code)]

use axum_test::{TestServer, TestWebSocket, WsMessage};
use serde_json::{Value, json};
use std::time::Duration;

/// WebSocket test client wrapper
pub struct WsTestClient {
    ws: TestWebSocket,
}

impl WsTestClient {
    /// Connect to the WebSocket endpoint
    pub async fn connect(server: &TestServer) -> Self {
        let ws = server.get_websocket("/ws").await.into_websocket().await;
        Self { ws }
    }

    /// Connect presenting an `Origin` header
    pub async fn connect_with_origin(server: &TestServer, origin: &str) -> Self {
        let ws = server
            .get_websocket("/ws")
            .add_header("Origin", origin.to_string())
            .await
            .into_websocket()
            .await;
        Self { ws }
    }

    pub async fn send_json(&mut self, frame: &Value) {
        self.ws.send_json(frame).await;
    }

    /// Send text message (for malformed frames)
    pub async fn send_text(&mut self, text: impl std::fmt::Display) {
        self.ws.send_text(text).await;
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) {
        self.ws.send_message(WsMessage::Binary(data.into())).await;
    }

    /// Receive the next JSON frame
    pub async fn receive_json(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.ws.receive_json::<Value>())
            .await
            .expect("no frame received within 5s")
    }

    /// Assert that nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) {
        let received = tokio::time::timeout(window, self.ws.receive_message()).await;
        assert!(received.is_err(), "unexpected frame: {:?}", received);
    }

    /// Send a command and return the reply
    pub async fn request(&mut self, frame: Value) -> Value {
        self.send_json(&frame).await;
        self.receive_json().await
    }

    /// Subscribe and assert the success reply
    pub async fn subscribe(&mut self, channel: &str) {
        let reply = self
            .request(json!({"type": "subscribe", "channel": channel}))
            .await;
        assert_eq!(reply["type"], "success", "subscribe failed: {}", reply);
    }

    pub async fn publish(&mut self, channel: &str, content: Value) -> Value {
        self.request(json!({"type": "publish", "channel": channel, "content": content}))
            .await
    }

    /// Close the WebSocket connection
    pub async fn close(self) {
        self.ws.close().await;
    }
}
