use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const EXPIRED: u8 = 2;

/// Settles the race between a handler applying its effect and the
/// dispatcher replying `request timed out`. Exactly one side wins.
#[derive(Debug, Clone)]
pub struct CommitTicket {
    state: Arc<AtomicU8>,
    timeout: Duration,
}

impl CommitTicket {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PENDING)),
            timeout,
        }
    }

    /// Claim the request for the handler. False once the timeout reply won.
    pub fn commit(&self) -> bool {
        self.settle(COMMITTED)
    }

    /// Claim the request for the timeout reply. False once the handler
    /// committed.
    pub fn expire(&self) -> bool {
        self.settle(EXPIRED)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn settle(&self, to: u8) -> bool {
        match self
            .state
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == to,
        }
    }
}
