//! Redis pub/sub broker link.
//!
//! One dedicated pub/sub connection, split into a command sink and a message
//! stream, plus one multiplexed connection for PUBLISH and health checks.
//! A supervisor task owns both and reconnects with backoff when either fails.

use crate::redis_link::supervisor;
use crate::{
    BrokerError, BrokerLink, BrokerOptions, DeliveryHandler, LinkState,
    Result as BrokerErrorResult, SubscriptionSource, SubscriptionTable,
};

use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use redis::AsyncCommands;
use redis::aio::{MultiplexedConnection, PubSubSink};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RedisBrokerLink {
    inner: Arc<RedisLinkInner>,
    closing: watch::Sender<bool>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

pub(crate) struct RedisLinkInner {
    pub(crate) client: redis::Client,
    pub(crate) options: BrokerOptions,
    pub(crate) table: SubscriptionTable,
    pub(crate) state: LinkState,
    sink: RwLock<Option<PubSubSink>>,
    publisher: RwLock<Option<MultiplexedConnection>>,
}

impl RedisBrokerLink {
    /// Start the link and wait (up to the subscribe timeout) for the first
    /// connection. The supervisor keeps retrying in the background if that
    /// wait runs out.
    pub async fn connect(url: &str, options: BrokerOptions) -> BrokerErrorResult<Self> {
        let client = redis::Client::open(url)?;
        let initial_wait = options.subscribe_timeout;

        let inner = Arc::new(RedisLinkInner {
            client,
            options,
            table: SubscriptionTable::new(),
            state: LinkState::new(false),
            sink: RwLock::new(None),
            publisher: RwLock::new(None),
        });

        let (closing, closing_rx) = watch::channel(false);
        let handle = tokio::spawn(supervisor::run(inner.clone(), closing_rx));

        if inner.state.wait_connected(initial_wait).await {
            info!("Broker link connected to Redis");
        } else {
            warn!(
                "Redis not reachable after {:?}, continuing and retrying in background",
                initial_wait
            );
        }

        Ok(Self {
            inner,
            closing,
            supervisor: Mutex::new(Some(handle)),
        })
    }

    fn ensure_open(&self) -> BrokerErrorResult<()> {
        if *self.closing.borrow() {
            return Err(BrokerError::closed());
        }
        Ok(())
    }
}

impl RedisLinkInner {
    fn sink(&self) -> Option<PubSubSink> {
        self.sink.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub(crate) fn publisher(&self) -> Option<MultiplexedConnection> {
        self.publisher
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub(crate) fn install(&self, sink: PubSubSink, publisher: MultiplexedConnection) {
        *self.sink.write().unwrap_or_else(|p| p.into_inner()) = Some(sink);
        *self.publisher.write().unwrap_or_else(|p| p.into_inner()) = Some(publisher);
    }

    /// Drop the connections and mark every channel inactive.
    pub(crate) fn teardown(&self) {
        self.state.set_connected(false);
        self.sink.write().unwrap_or_else(|p| p.into_inner()).take();
        self.publisher
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        let dropped = self.table.mark_all_inactive();
        if dropped > 0 {
            warn!("Broker link down, {} channel(s) marked inactive", dropped);
        }
    }

    /// Subscribe upstream to everything the source reports.
    pub(crate) async fn resubscribe_all(&self) -> BrokerErrorResult<usize> {
        let _ops = self.table.lock_ops().await;
        let channels = self.table.desired_channels();
        let mut count = 0;

        for channel in &channels {
            if self.subscribe_upstream(channel).await? {
                count += 1;
            }
        }

        Ok(count)
    }

    /// Returns true if a SUBSCRIBE was sent. Call with `ops` held.
    async fn subscribe_upstream(&self, channel: &str) -> BrokerErrorResult<bool> {
        if self.table.is_active(channel) {
            return Ok(false);
        }

        let mut sink = self
            .sink()
            .ok_or_else(|| BrokerError::unavailable("no pub/sub connection"))?;
        sink.subscribe(channel).await?;
        self.table.mark_active(channel);
        debug!("Subscribed upstream to {}", channel);
        Ok(true)
    }
}

#[async_trait]
impl BrokerLink for RedisBrokerLink {
    async fn publish(&self, channel: &str, payload: String) -> BrokerErrorResult<()> {
        self.ensure_open()?;

        if !self.inner.state.is_connected() {
            return Err(BrokerError::unavailable("broker link is disconnected"));
        }

        let mut publisher = self
            .inner
            .publisher()
            .ok_or_else(|| BrokerError::unavailable("no publish connection"))?;

        let receivers: i64 = publisher.publish(channel, payload).await?;
        debug!("Published to {} ({} receiver(s))", channel, receivers);
        Ok(())
    }

    async fn subscribe(&self, channel: &str, handler: DeliveryHandler) -> BrokerErrorResult<()> {
        self.ensure_open()?;

        let timeout = self.inner.options.subscribe_timeout;
        if !self.inner.state.wait_connected(timeout).await {
            return Err(BrokerError::unavailable(format!(
                "no upstream connection after {:?}",
                timeout
            )));
        }

        let _ops = self.inner.table.lock_ops().await;
        self.inner.table.register(channel, handler);

        if let Err(e) = self.inner.subscribe_upstream(channel).await {
            self.inner.table.remove(channel);
            return Err(e);
        }

        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> BrokerErrorResult<()> {
        let _ops = self.inner.table.lock_ops().await;

        if !self.inner.table.remove(channel) {
            return Ok(());
        }

        // Inactive channels were already dropped upstream with the connection
        if let Some(mut sink) = self.inner.sink() {
            sink.unsubscribe(channel).await?;
            debug!("Unsubscribed upstream from {}", channel);
        }

        Ok(())
    }

    fn attach_source(&self, source: Weak<dyn SubscriptionSource>) {
        self.inner.table.attach_source(source);
    }

    fn is_connected(&self) -> bool {
        self.inner.state.is_connected()
    }

    fn is_subscribed(&self, channel: &str) -> bool {
        self.inner.table.is_active(channel)
    }

    async fn close(&self) {
        self.closing.send_replace(true);

        if let Some(handle) = self.supervisor.lock().await.take() {
            let abort = handle.abort_handle();
            if tokio::time::timeout(CLOSE_TIMEOUT, handle).await.is_err() {
                warn!("Broker supervisor did not stop in {:?}, aborting", CLOSE_TIMEOUT);
                abort.abort();
            }
        }

        self.inner.teardown();
        info!("Broker link closed");
    }
}
