use crate::handlers::dispatcher::dispatch;
use crate::{
    ChannelRegistry, ClientCommand, CloseReason, ConnectionConfig, ConnectionHandle,
    ConnectionState, Delivery, GatewayPolicy, HandlerContext, MessageValidator, Metrics,
    Result as WsErrorResult, ServerFrame, ShutdownGuard, WsError,
};

use nh_broker::NotificationPublisher;
use nh_db::TenantDirectory;

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use error_location::ErrorLocation;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};

/// How long the writer gets to flush queued frames after the connection ends
const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

enum Flow {
    Continue,
    Close,
}

/// Manages a single WebSocket connection
pub struct WebSocketConnection {
    handle: ConnectionHandle,
    config: ConnectionConfig,
    metrics: Metrics,
    channels: Arc<ChannelRegistry>,
    directory: Arc<dyn TenantDirectory>,
    publisher: NotificationPublisher,
    policy: Arc<GatewayPolicy>,
}

impl WebSocketConnection {
    pub fn new(
        handle: ConnectionHandle,
        config: ConnectionConfig,
        metrics: Metrics,
        channels: Arc<ChannelRegistry>,
        directory: Arc<dyn TenantDirectory>,
        publisher: NotificationPublisher,
        policy: Arc<GatewayPolicy>,
    ) -> Self {
        Self {
            handle,
            config,
            metrics,
            channels,
            directory,
            publisher,
            policy,
        }
    }

    /// Handle the WebSocket connection lifecycle.
    ///
    /// `outbound` is the receiving end of the handle's bounded buffer. On
    /// exit the connection has left every channel and is `Closed`.
    pub async fn handle(
        self,
        socket: WebSocket,
        outbound: mpsc::Receiver<Message>,
        mut shutdown_guard: ShutdownGuard,
    ) -> WsErrorResult<()> {
        let prefix = self.handle.log_prefix();
        info!("{} WebSocket connection established", prefix);
        self.metrics.connection_established();

        let (ws_sender, mut ws_receiver) = socket.split();
        let mut send_task = tokio::spawn(write_loop(
            ws_sender,
            outbound,
            self.handle.clone(),
        ));

        let mut state_rx = self.handle.watch_state();
        let mut heartbeat = interval_at(
            Instant::now() + self.config.heartbeat_interval,
            self.config.heartbeat_interval,
        );
        let mut last_seen = Instant::now();
        let mut failure: Option<WsError> = None;

        let reason = loop {
            tokio::select! {
                // Handle incoming frames from the client
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            last_seen = Instant::now();
                            match self.handle_client_message(msg).await {
                                Ok(Flow::Continue) => {}
                                Ok(Flow::Close) => {
                                    info!("{} Received close frame", prefix);
                                    break CloseReason::Normal;
                                }
                                Err(e) => {
                                    let reason = close_reason_for(&e);
                                    failure = Some(e);
                                    break reason;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!("{} WebSocket error: {}", prefix, e);
                            failure = Some(WsError::ConnectionClosed {
                                reason: format!("WebSocket error: {}", e),
                                location: ErrorLocation::from(Location::caller()),
                            });
                            break CloseReason::Transport;
                        }
                        None => {
                            info!("{} Connection closed by client", prefix);
                            break CloseReason::Normal;
                        }
                    }
                }

                // Marked for closure elsewhere, e.g. by a fanout that found the buffer full
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break CloseReason::Normal;
                    }
                    let state = *state_rx.borrow();
                    if let ConnectionState::Closing(reason) = state {
                        if reason == CloseReason::SlowConsumer {
                            failure = Some(WsError::SlowConsumer {
                                location: ErrorLocation::from(Location::caller()),
                            });
                        }
                        break reason;
                    }
                }

                _ = heartbeat.tick() => {
                    if last_seen.elapsed() > self.config.heartbeat_timeout {
                        warn!(
                            "{} No traffic for {:?}, closing",
                            prefix,
                            self.config.heartbeat_timeout
                        );
                        failure = Some(WsError::HeartbeatTimeout {
                            timeout_secs: self.config.heartbeat_timeout.as_secs(),
                            location: ErrorLocation::from(Location::caller()),
                        });
                        break CloseReason::HeartbeatTimeout;
                    }
                    if self.handle.try_deliver(Message::Ping(Default::default()))
                        == Delivery::SlowConsumer
                    {
                        debug!("{} Heartbeat ping found the buffer full", prefix);
                    }
                }

                // Handle graceful shutdown
                _ = shutdown_guard.wait() => {
                    info!("{} Shutting down connection gracefully", prefix);
                    break CloseReason::Shutdown;
                }
            }
        };

        // Cleanup: stop accepting deliveries, drop every membership, then let
        // the writer flush what is already queued.
        self.handle.begin_close(reason);
        let left = self.channels.leave_all(&self.handle).await;
        self.handle.mark_closed();

        if tokio::time::timeout(SEND_DRAIN_TIMEOUT, &mut send_task)
            .await
            .is_err()
        {
            warn!("{} Writer did not finish in {:?}, aborting", prefix, SEND_DRAIN_TIMEOUT);
            send_task.abort();
        }

        self.metrics.connection_closed(reason.as_str());
        info!(
            "{} WebSocket connection closed ({}), left {} channel(s)",
            prefix, reason, left
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Handle a frame from the client
    async fn handle_client_message(&self, msg: Message) -> WsErrorResult<Flow> {
        match msg {
            Message::Text(text) => self.handle_text(text.as_str()).await,
            Message::Binary(data) => {
                debug!(
                    "{} Rejecting binary frame ({} bytes)",
                    self.handle.log_prefix(),
                    data.len()
                );
                self.metrics.frame_received("binary");
                match MessageValidator::reject_binary() {
                    Ok(()) => Ok(Flow::Continue),
                    Err(e) => self.reply_error(&e),
                }
            }
            // Pings are answered by the socket; any traffic counts as liveness
            Message::Ping(_) | Message::Pong(_) => Ok(Flow::Continue),
            Message::Close(_) => Ok(Flow::Close),
        }
    }

    async fn handle_text(&self, text: &str) -> WsErrorResult<Flow> {
        if let Err(e) = MessageValidator::validate_frame_size(text.len(), self.config.max_frame_bytes)
        {
            self.metrics.frame_received("oversized");
            return self.reply_error(&e);
        }

        let command = match ClientCommand::parse(text) {
            Ok(command) => command,
            Err(e) => {
                debug!("{} Rejected frame: {}", self.handle.log_prefix(), e);
                self.metrics.frame_received("invalid");
                return self.reply_error(&e);
            }
        };

        self.metrics.frame_received(command.name());

        match dispatch(command, self.context(), self.config.handler_timeout).await {
            Ok(frame) => self.reply(&frame),
            Err(e) => {
                self.reply_error(&e)?;
                if e.is_fatal() {
                    error!(
                        "{} Fatal handler error, closing connection: {}",
                        self.handle.log_prefix(),
                        e
                    );
                    return Err(e);
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn reply(&self, frame: &ServerFrame) -> WsErrorResult<Flow> {
        match self.handle.try_deliver(frame.to_message()?) {
            Delivery::Delivered => {
                self.metrics.frame_sent(frame.kind());
                Ok(Flow::Continue)
            }
            Delivery::Dropped => Ok(Flow::Continue),
            Delivery::SlowConsumer => Err(WsError::SlowConsumer {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn reply_error(&self, error: &WsError) -> WsErrorResult<Flow> {
        self.reply(&ServerFrame::error(error.client_message()))
    }

    fn context(&self) -> HandlerContext {
        HandlerContext {
            connection: self.handle.clone(),
            channels: self.channels.clone(),
            directory: self.directory.clone(),
            publisher: self.publisher.clone(),
            policy: self.policy.clone(),
            metrics: self.metrics.clone(),
            started_at: std::time::Instant::now(),
        }
    }
}

/// Drain the outbound buffer into the socket until the connection is closed.
async fn write_loop(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Message>,
    handle: ConnectionHandle,
) {
    let mut state_rx = handle.watch_state();

    loop {
        tokio::select! {
            biased;

            msg = outbound.recv() => {
                let Some(msg) = msg else { break };
                if let Err(e) = ws_sender.send(msg).await {
                    debug!("{} Write failed: {}", handle.log_prefix(), e);
                    handle.begin_close(CloseReason::Transport);
                    break;
                }
            }

            closed = async {
                state_rx
                    .wait_for(|state| *state == ConnectionState::Closed)
                    .await
                    .is_ok()
            } => {
                if !closed || outbound.is_empty() {
                    break;
                }
            }
        }
    }

    let _ = ws_sender.close().await;
}

fn close_reason_for(error: &WsError) -> CloseReason {
    match error {
        WsError::SlowConsumer { .. } => CloseReason::SlowConsumer,
        WsError::HeartbeatTimeout { .. } => CloseReason::HeartbeatTimeout,
        WsError::HandlerFault { .. } => CloseReason::HandlerFault,
        _ => CloseReason::Transport,
    }
}
