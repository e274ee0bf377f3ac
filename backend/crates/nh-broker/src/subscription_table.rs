//! Channel bookkeeping shared by the broker link implementations.

use crate::{DeliveryHandler, SubscriptionSource};

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock, Weak};

use log::{debug, warn};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

/// Handlers per channel plus the set of channels subscribed upstream.
///
/// `ops` serializes subscribe, unsubscribe and resubscribe so an upstream
/// command never races a reconnect. The std locks are only held for map
/// access and never across an await.
pub(crate) struct SubscriptionTable {
    handlers: RwLock<HashMap<String, DeliveryHandler>>,
    upstream: Mutex<HashSet<String>>,
    source: RwLock<Option<Weak<dyn SubscriptionSource>>>,
    ops: AsyncMutex<()>,
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            upstream: Mutex::new(HashSet::new()),
            source: RwLock::new(None),
            ops: AsyncMutex::new(()),
        }
    }

    pub(crate) async fn lock_ops(&self) -> AsyncMutexGuard<'_, ()> {
        self.ops.lock().await
    }

    pub(crate) fn attach_source(&self, source: Weak<dyn SubscriptionSource>) {
        *self.source.write().unwrap_or_else(|p| p.into_inner()) = Some(source);
    }

    pub(crate) fn register(&self, channel: &str, handler: DeliveryHandler) {
        self.handlers
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(channel.to_string(), handler);
    }

    /// Forget a channel. Returns true if it was subscribed upstream.
    pub(crate) fn remove(&self, channel: &str) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(channel);
        self.upstream
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(channel)
    }

    pub(crate) fn mark_active(&self, channel: &str) {
        self.upstream
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(channel.to_string());
    }

    pub(crate) fn is_active(&self, channel: &str) -> bool {
        self.upstream
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(channel)
    }

    /// Upstream connection lost: nothing is subscribed any more.
    pub(crate) fn mark_all_inactive(&self) -> usize {
        let mut upstream = self.upstream.lock().unwrap_or_else(|p| p.into_inner());
        let count = upstream.len();
        upstream.clear();
        count
    }

    pub(crate) fn active_count(&self) -> usize {
        self.upstream
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Channels to re-subscribe after a reconnect.
    ///
    /// Taken from the attached source when there is one, replacing the local
    /// handler map so channels the source no longer reports are dropped.
    /// Without a source the local map is used as-is. Call with `ops` held.
    pub(crate) fn desired_channels(&self) -> Vec<String> {
        let source = self
            .source
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .and_then(Weak::upgrade);
        let reported: Option<HashMap<String, DeliveryHandler>> =
            source.map(|source| source.active_channels().into_iter().collect());

        let mut handlers = self.handlers.write().unwrap_or_else(|p| p.into_inner());

        match reported {
            Some(reported) => {
                for stale in handlers.keys().filter(|c| !reported.contains_key(*c)) {
                    debug!("Dropping stale broker handler for channel {}", stale);
                }
                *handlers = reported;
            }
            None => {
                if !handlers.is_empty() {
                    warn!("No subscription source attached, resubscribing from local handlers");
                }
            }
        }

        handlers.keys().cloned().collect()
    }

    /// Hand a payload to the channel's handler if it is subscribed upstream.
    pub(crate) fn dispatch(&self, channel: &str, payload: &str) -> bool {
        if !self.is_active(channel) {
            return false;
        }

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(channel)
            .cloned();

        match handler {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }
}
