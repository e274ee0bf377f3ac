//! Connection supervisor for the Redis broker link.

use crate::Backoff;
use crate::Result as BrokerErrorResult;
use crate::redis_link::redis_broker_link::RedisLinkInner;

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, info, warn};
use redis::aio::PubSubStream;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval, sleep};

enum LinkExit {
    Closing,
    Lost(String),
}

/// Connect, pump messages, and reconnect with backoff until closed.
pub(crate) async fn run(inner: Arc<RedisLinkInner>, mut closing: watch::Receiver<bool>) {
    let mut backoff = Backoff::new(inner.options.reconnect.clone());

    loop {
        if *closing.borrow() {
            break;
        }

        match connect(&inner).await {
            Ok(stream) => {
                if backoff.attempts() > 0 {
                    metrics::counter!("nh_broker_reconnects_total").increment(1);
                }
                backoff.reset();

                let exit = pump(&inner, stream, &mut closing).await;
                inner.teardown();

                match exit {
                    LinkExit::Closing => break,
                    LinkExit::Lost(reason) => warn!("Broker connection lost: {}", reason),
                }
            }
            Err(e) => {
                inner.teardown();
                warn!("Broker connect attempt {} failed: {}", backoff.attempts() + 1, e);
            }
        }

        let delay = backoff.next_delay();
        debug!("Reconnecting to broker in {:?}", delay);

        tokio::select! {
            _ = sleep(delay) => {}
            _ = closing.changed() => break,
        }
    }

    inner.teardown();
    debug!("Broker supervisor stopped");
}

async fn connect(inner: &RedisLinkInner) -> BrokerErrorResult<PubSubStream> {
    let pubsub = inner.client.get_async_pubsub().await?;
    let publisher = inner.client.get_multiplexed_async_connection().await?;
    let (sink, stream) = pubsub.split();

    inner.install(sink, publisher);
    let resubscribed = inner.resubscribe_all().await?;
    inner.state.set_connected(true);

    info!(
        "Broker connection established, {} channel(s) resubscribed",
        resubscribed
    );
    Ok(stream)
}

async fn pump(
    inner: &RedisLinkInner,
    mut stream: PubSubStream,
    closing: &mut watch::Receiver<bool>,
) -> LinkExit {
    let mut health = interval(inner.options.health_check_interval);
    health.set_missed_tick_behavior(MissedTickBehavior::Delay);
    health.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            msg = stream.next() => {
                let Some(msg) = msg else {
                    return LinkExit::Lost("pub/sub stream ended".to_string());
                };

                let channel = msg.get_channel_name();
                match msg.get_payload::<String>() {
                    Ok(payload) => {
                        if !inner.table.dispatch(channel, &payload) {
                            debug!("Dropped message for unsubscribed channel {}", channel);
                        }
                    }
                    Err(e) => warn!("Undecodable payload on channel {}: {}", channel, e),
                }
            }

            _ = health.tick() => {
                if let Err(reason) = ping(inner).await {
                    return LinkExit::Lost(reason);
                }
            }

            _ = closing.changed() => return LinkExit::Closing,
        }
    }
}

async fn ping(inner: &RedisLinkInner) -> Result<(), String> {
    let Some(mut conn) = inner.publisher() else {
        return Err("no publish connection".to_string());
    };

    let timeout = inner.options.health_check_interval;
    match tokio::time::timeout(timeout, redis::cmd("PING").query_async::<String>(&mut conn)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(format!("health check failed: {}", e)),
        Err(_) => Err(format!("health check timed out after {:?}", timeout)),
    }
}
