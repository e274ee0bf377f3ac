use crate::{CloseReason, ConnectionId, ConnectionState};

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::extract::ws::Message;
use tokio::sync::{mpsc, watch};

/// Outcome of queueing one frame for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Connection is closing or gone; the frame was discarded
    Dropped,
    /// Buffer was full; the connection has been marked for closure
    SlowConsumer,
}

/// Shared view of one live connection.
///
/// Cloned into every channel the connection joins. Writes never block: a
/// frame is either queued on the bounded outbound buffer or dropped.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: ConnectionId,
    sender: mpsc::Sender<Message>,
    state: watch::Sender<ConnectionState>,
    channels: Mutex<HashSet<String>>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: mpsc::Sender<Message>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Open);
        Self {
            inner: Arc::new(HandleInner {
                id,
                sender,
                state,
                channels: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Log prefix for connection-scoped lines
    pub fn log_prefix(&self) -> String {
        format!("[conn={}]", self.inner.id.short())
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Move an open connection to `Closing`. Returns false if it was
    /// already closing or closed.
    pub fn begin_close(&self, reason: CloseReason) -> bool {
        self.inner.state.send_if_modified(|state| {
            if state.is_open() {
                *state = ConnectionState::Closing(reason);
                true
            } else {
                false
            }
        })
    }

    pub fn mark_closed(&self) {
        self.inner.state.send_replace(ConnectionState::Closed);
    }

    /// Queue a frame without waiting.
    pub fn try_deliver(&self, message: Message) -> Delivery {
        if !self.is_open() {
            return Delivery::Dropped;
        }

        match self.inner.sender.try_send(message) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.begin_close(CloseReason::SlowConsumer);
                Delivery::SlowConsumer
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Dropped,
        }
    }

    /// Record that this connection joined `channel`. Returns false if it
    /// already had.
    pub(crate) fn track_channel(&self, channel: &str) -> bool {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(channel.to_string())
    }

    pub(crate) fn untrack_channel(&self, channel: &str) -> bool {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(channel)
    }

    pub fn is_tracking(&self, channel: &str) -> bool {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(channel)
    }

    /// Channels this connection currently belongs to
    pub fn channels(&self) -> Vec<String> {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}
