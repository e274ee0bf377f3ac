use crate::ShutdownGuard;

use log::info;
use tokio::sync::watch;

/// Process-wide shutdown flag.
///
/// The flag latches: guards created after `shutdown()` observe it immediately,
/// so a connection accepted during shutdown still closes.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    signal: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self { signal }
    }

    /// Trigger shutdown. Repeated calls are no-ops.
    pub fn shutdown(&self) {
        let first = self.signal.send_if_modified(|stopping| !std::mem::replace(stopping, true));
        if first {
            info!(
                "Shutdown signal received, notifying {} connection(s)",
                self.signal.receiver_count()
            );
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.signal.borrow()
    }

    pub fn subscribe_guard(&self) -> ShutdownGuard {
        ShutdownGuard::new(self.signal.subscribe())
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
