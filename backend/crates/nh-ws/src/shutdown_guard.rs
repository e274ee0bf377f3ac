use tokio::sync::watch;

/// Per-task view of the shutdown flag
pub struct ShutdownGuard {
    signal: watch::Receiver<bool>,
}

impl ShutdownGuard {
    pub(crate) fn new(signal: watch::Receiver<bool>) -> Self {
        Self { signal }
    }

    /// Resolve once shutdown has been triggered. Never resolves if the
    /// coordinator is gone without having triggered it.
    pub async fn wait(&mut self) {
        if self.signal.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn is_signalled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Owned form of [`ShutdownGuard::wait`] for `with_graceful_shutdown`.
    pub async fn signalled(mut self) {
        self.wait().await;
    }
}
