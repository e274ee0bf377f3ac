use crate::{
    ChannelRegistry, ConnectionConfig, ConnectionHandle, ConnectionId, ConnectionRegistry,
    GatewayPolicy, Metrics, ShutdownCoordinator, WebSocketConnection,
};

use nh_broker::NotificationPublisher;
use nh_db::TenantDirectory;

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::Response,
};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

/// Shared application state for WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    pub channels: Arc<ChannelRegistry>,
    pub directory: Arc<dyn TenantDirectory>,
    pub publisher: NotificationPublisher,
    pub registry: ConnectionRegistry,
    pub metrics: Metrics,
    pub shutdown: ShutdownCoordinator,
    pub config: ConnectionConfig,
    pub policy: Arc<GatewayPolicy>,
}

/// WebSocket upgrade handler
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    let origin = headers
        .get(ORIGIN)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    if !state.policy.origin_allowed(origin.as_deref()) {
        warn!("Rejected upgrade from origin {:?}", origin);
        state.metrics.connection_rejected("origin");
        return Err(StatusCode::FORBIDDEN);
    }

    debug!("WebSocket upgrade request from origin {:?}", origin);

    // Register connection (enforces connection limits)
    let (tx, rx) = mpsc::channel::<Message>(state.config.send_buffer_size);
    let connection = ConnectionHandle::new(ConnectionId::new(), tx);

    state
        .registry
        .register(connection.id(), origin)
        .await
        .map_err(|e| {
            error!("Failed to register connection: {}", e);
            state.metrics.connection_rejected("limit");
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    info!("{} Accepted connection", connection.log_prefix());

    let registry = state.registry.clone();
    let connection_id = connection.id();

    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!("Upgrade for connection {connection_id} failed: {e}");
            tokio::spawn(async move { registry.unregister(connection_id).await });
        })
        .on_upgrade(move |socket| handle_socket(socket, connection, rx, state)))
}

/// Handle WebSocket connection after upgrade
async fn handle_socket(
    socket: WebSocket,
    connection: ConnectionHandle,
    outbound: mpsc::Receiver<Message>,
    state: AppState,
) {
    let connection_id = connection.id();
    let shutdown_guard = state.shutdown.subscribe_guard();

    let web_socket = WebSocketConnection::new(
        connection,
        state.config.clone(),
        state.metrics.clone(),
        state.channels.clone(),
        state.directory.clone(),
        state.publisher.clone(),
        state.policy.clone(),
    );

    let result = web_socket.handle(socket, outbound, shutdown_guard).await;

    // Unregister on disconnect
    state.registry.unregister(connection_id).await;

    if let Err(e) = result {
        warn!("Connection {connection_id} ended with error: {e}");
    }
}
