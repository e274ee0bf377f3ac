//! Channel membership and the upstream subscription lifecycle.
//!
//! Each channel lives in its own slot. The slot's async lifecycle lock
//! serializes join, leave and the upstream subscribe/unsubscribe for that
//! channel only; the member mutex linearizes membership changes with the
//! fanout snapshot. Distinct channels never share a lock beyond the sharded
//! map lookup.
//!
//! Lock order is slot lifecycle, then the broker link's internal lock. The
//! subscription source callback runs under the broker's lock, so it only
//! reads the map and the member sets and never touches a lifecycle lock.

use crate::{ConnectionHandle, ConnectionId, Delivery, Metrics, Result as WsErrorResult, ServerFrame};

use nh_broker::{BrokerLink, DeliveryHandler, SubscriptionSource};
use nh_core::{ChannelName, NotificationEnvelope};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use dashmap::DashMap;
use log::{debug, info, warn};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    /// The caller withdrew before membership was applied; nothing changed
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    NotMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// No upstream subscription yet
    Absent,
    Active,
    /// Torn down and removed from the map; joiners must fetch a fresh slot
    Retired,
}

struct ChannelSlot {
    name: String,
    lifecycle: AsyncMutex<Lifecycle>,
    members: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
    /// Set while the upstream subscription is held or being acquired
    wants_upstream: AtomicBool,
}

impl ChannelSlot {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lifecycle: AsyncMutex::new(Lifecycle::Absent),
            members: Mutex::new(HashMap::new()),
            wants_upstream: AtomicBool::new(false),
        }
    }

    fn insert_member(&self, connection: &ConnectionHandle) -> bool {
        let mut members = self.members.lock().unwrap_or_else(|p| p.into_inner());
        if members.contains_key(&connection.id()) {
            return false;
        }
        members.insert(connection.id(), connection.clone());
        true
    }

    /// Returns (removed, now_empty)
    fn remove_member(&self, connection_id: ConnectionId) -> (bool, bool) {
        let mut members = self.members.lock().unwrap_or_else(|p| p.into_inner());
        let removed = members.remove(&connection_id).is_some();
        (removed, members.is_empty())
    }

    fn member_count(&self) -> usize {
        self.members.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn has_member(&self, connection_id: ConnectionId) -> bool {
        self.members
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&connection_id)
    }

    /// Deliver one broker payload to a snapshot of the members.
    ///
    /// Runs on the broker read path: never awaits, never blocks on a socket.
    fn fanout(&self, payload: &str, metrics: &Metrics) {
        let envelope = NotificationEnvelope::from_broker_payload(payload);
        let message = match ServerFrame::notification(&self.name, envelope).to_message() {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping undeliverable payload on channel {}: {}", self.name, e);
                metrics.error_occurred("fanout_encode");
                return;
            }
        };

        let members: Vec<ConnectionHandle> = self
            .members
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .cloned()
            .collect();

        let mut delivered = 0;
        let mut dropped = 0;
        for member in &members {
            match member.try_deliver(message.clone()) {
                Delivery::Delivered => delivered += 1,
                Delivery::Dropped => dropped += 1,
                Delivery::SlowConsumer => {
                    dropped += 1;
                    metrics.slow_consumer();
                    warn!(
                        "{} Slow consumer on channel {}, disconnecting",
                        member.log_prefix(),
                        self.name
                    );
                }
            }
        }

        metrics.fanout(delivered, dropped);
        debug!(
            "Fanout on channel {}: {} delivered, {} dropped",
            self.name, delivered, dropped
        );
    }
}

/// Owns every channel's membership and its upstream subscription.
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<ChannelSlot>>,
    broker: Arc<dyn BrokerLink>,
    metrics: Metrics,
}

impl ChannelRegistry {
    /// Create the registry and attach it to `broker` as the source of truth
    /// for what to re-subscribe after a reconnect.
    pub fn new(broker: Arc<dyn BrokerLink>, metrics: Metrics) -> Arc<Self> {
        let registry = Arc::new(Self {
            channels: DashMap::new(),
            broker,
            metrics,
        });

        let weak: Weak<ChannelRegistry> = Arc::downgrade(&registry);
        let source: Weak<dyn SubscriptionSource> = weak;
        registry.broker.attach_source(source);

        registry
    }

    /// Add `connection` to `channel`.
    ///
    /// The first member opens the upstream subscription. Once this returns
    /// `Ok`, every later publish on the channel reaches the connection.
    pub async fn join(
        &self,
        channel: &ChannelName,
        connection: &ConnectionHandle,
    ) -> WsErrorResult<JoinOutcome> {
        self.join_if(channel, connection, || true).await
    }

    /// Like [`join`](Self::join), but `admit` is asked under the channel's
    /// lifecycle lock right before membership changes. When it returns
    /// false the connection is not added, an upstream subscription opened
    /// for it alone is released, and the outcome is `Abandoned`.
    pub async fn join_if(
        &self,
        channel: &ChannelName,
        connection: &ConnectionHandle,
        admit: impl Fn() -> bool,
    ) -> WsErrorResult<JoinOutcome> {
        let name = channel.as_str();

        let outcome = loop {
            let slot = self.slot(name);
            let mut lifecycle = slot.lifecycle.lock().await;

            match *lifecycle {
                Lifecycle::Retired => {
                    drop(lifecycle);
                    tokio::task::yield_now().await;
                    continue;
                }
                Lifecycle::Absent => {
                    slot.wants_upstream.store(true, Ordering::Release);
                    let handler = self.fanout_handler(&slot);

                    if let Err(e) = self.broker.subscribe(name, handler).await {
                        slot.wants_upstream.store(false, Ordering::Release);
                        *lifecycle = Lifecycle::Retired;
                        self.discard(&slot);
                        warn!("Upstream subscribe for channel {} failed: {}", name, e);
                        return Err(e.into());
                    }

                    *lifecycle = Lifecycle::Active;
                    self.metrics.channel_created();
                    info!("Channel {} active", name);
                }
                Lifecycle::Active => {}
            }

            if !admit() {
                debug!(
                    "{} Join of channel {} abandoned",
                    connection.log_prefix(),
                    name
                );
                if slot.member_count() == 0 {
                    self.retire(&slot, &mut lifecycle).await;
                }
                break JoinOutcome::Abandoned;
            }

            if slot.insert_member(connection) {
                connection.track_channel(name);
                debug!(
                    "{} Joined channel {} ({} member(s))",
                    connection.log_prefix(),
                    name,
                    slot.member_count()
                );
                break JoinOutcome::Joined;
            }
            break JoinOutcome::AlreadyMember;
        };

        // A join that finishes while the connection is shutting down must not
        // outlive the connection's leave_all.
        if outcome == JoinOutcome::Joined && !connection.is_open() {
            self.leave(name, connection).await;
        }

        Ok(outcome)
    }

    /// Remove `connection` from `channel`. The last member closes the
    /// upstream subscription and discards the channel.
    pub async fn leave(&self, channel: &str, connection: &ConnectionHandle) -> LeaveOutcome {
        let slot = match self.channels.get(channel) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                connection.untrack_channel(channel);
                return LeaveOutcome::NotMember;
            }
        };

        let mut lifecycle = slot.lifecycle.lock().await;
        let (removed, now_empty) = slot.remove_member(connection.id());
        connection.untrack_channel(channel);

        if !removed {
            return LeaveOutcome::NotMember;
        }

        debug!("{} Left channel {}", connection.log_prefix(), channel);

        if now_empty && *lifecycle == Lifecycle::Active {
            self.retire(&slot, &mut lifecycle).await;
        }

        LeaveOutcome::Left
    }

    /// Leave every channel the connection belongs to. Returns how many.
    pub async fn leave_all(&self, connection: &ConnectionHandle) -> usize {
        let mut left = 0;
        for channel in connection.channels() {
            if self.leave(&channel, connection).await == LeaveOutcome::Left {
                left += 1;
            }
        }
        left
    }

    pub fn member_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|entry| entry.value().member_count())
            .unwrap_or(0)
    }

    pub fn is_member(&self, channel: &str, connection_id: ConnectionId) -> bool {
        self.channels
            .get(channel)
            .map(|entry| entry.value().has_member(connection_id))
            .unwrap_or(false)
    }

    /// Whether the broker link currently holds a subscription for `channel`.
    pub fn is_upstream_active(&self, channel: &str) -> bool {
        self.broker.is_subscribed(channel)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Names of channels with at least one member, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .iter()
            .filter(|entry| entry.value().member_count() > 0)
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    fn slot(&self, name: &str) -> Arc<ChannelSlot> {
        let entry = self
            .channels
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ChannelSlot::new(name)));
        Arc::clone(entry.value())
    }

    /// Release the upstream subscription of an empty active slot and take
    /// the slot out of the map. Caller holds the slot's lifecycle lock.
    async fn retire(&self, slot: &Arc<ChannelSlot>, lifecycle: &mut Lifecycle) {
        slot.wants_upstream.store(false, Ordering::Release);
        if let Err(e) = self.broker.unsubscribe(&slot.name).await {
            warn!("Upstream unsubscribe for channel {} failed: {}", slot.name, e);
        }
        *lifecycle = Lifecycle::Retired;
        self.discard(slot);
        self.metrics.channel_removed();
        info!("Channel {} removed, no members left", slot.name);
    }

    /// Drop a retired slot from the map unless a newer slot replaced it.
    fn discard(&self, slot: &Arc<ChannelSlot>) {
        self.channels
            .remove_if(&slot.name, |_, current| Arc::ptr_eq(current, slot));
    }

    fn fanout_handler(&self, slot: &Arc<ChannelSlot>) -> DeliveryHandler {
        let slot = Arc::downgrade(slot);
        let metrics = self.metrics.clone();
        Arc::new(move |payload: &str| {
            if let Some(slot) = slot.upgrade() {
                slot.fanout(payload, &metrics);
            }
        })
    }
}

impl SubscriptionSource for ChannelRegistry {
    fn active_channels(&self) -> Vec<(String, DeliveryHandler)> {
        self.channels
            .iter()
            .filter(|entry| entry.value().wants_upstream.load(Ordering::Acquire))
            .map(|entry| (entry.key().clone(), self.fanout_handler(entry.value())))
            .collect()
    }
}
