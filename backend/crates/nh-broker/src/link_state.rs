use std::time::Duration;

use tokio::sync::watch;

/// Connected/disconnected flag that callers can wait on.
#[derive(Debug)]
pub struct LinkState {
    tx: watch::Sender<bool>,
}

impl LinkState {
    pub fn new(connected: bool) -> Self {
        let (tx, _rx) = watch::channel(connected);
        Self { tx }
    }

    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_connected(&self, connected: bool) {
        self.tx.send_replace(connected);
        metrics::gauge!("nh_broker_connected").set(if connected { 1.0 } else { 0.0 });
    }

    /// Wait until connected. Returns false if `timeout` elapses first.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        matches!(
            tokio::time::timeout(timeout, rx.wait_for(|connected| *connected)).await,
            Ok(Ok(_))
        )
    }
}
