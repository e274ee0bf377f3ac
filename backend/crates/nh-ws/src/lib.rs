pub mod app_state;
pub mod channel_registry;
pub mod client_frame;
pub mod connection_config;
pub mod connection_handle;
pub mod connection_id;
pub mod connection_registry;
pub mod connection_state;
pub mod error;
pub mod gateway_policy;
pub mod handlers;
pub mod message_validator;
pub mod metrics;
pub mod server_frame;
pub mod shutdown_coordinator;
pub mod shutdown_guard;
pub mod web_socket_connection;

pub use app_state::{AppState, handler};
pub use channel_registry::{ChannelRegistry, JoinOutcome, LeaveOutcome};
pub use client_frame::ClientCommand;
pub use connection_config::ConnectionConfig;
pub use connection_handle::{ConnectionHandle, Delivery};
pub use connection_id::ConnectionId;
pub use connection_registry::{ConnectionInfo, ConnectionRegistry};
pub use connection_state::{CloseReason, ConnectionState};
pub use error::{Result, WsError};
pub use gateway_policy::GatewayPolicy;
pub use handlers::context::HandlerContext;
pub use handlers::dispatcher::dispatch;
pub use message_validator::MessageValidator;
pub use metrics::Metrics;
pub use server_frame::ServerFrame;
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
pub use web_socket_connection::WebSocketConnection;

#[cfg(test)]
mod tests;
