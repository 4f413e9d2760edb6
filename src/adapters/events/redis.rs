//! Redis pub/sub message bus for production deployments.
//!
//! Publishing goes through the shared multiplexed connection. Every
//! subscription gets its own pub/sub connection, owned by a listener task
//! that forwards payloads into a bounded channel. The listener unsubscribes
//! when asked to stop or when its handle is dropped.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSub};
use redis::AsyncCommands;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::chat::ChannelName;
use crate::ports::{BusError, MessageBus, Subscription};

/// Buffered deliveries per subscription before the listener waits.
const DELIVERY_BUFFER: usize = 64;

fn unavailable(e: redis::RedisError) -> BusError {
    BusError::Unavailable(e.to_string())
}

/// Redis-backed message bus.
#[derive(Clone)]
pub struct RedisMessageBus {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisMessageBus {
    /// Create a bus from a client (for pub/sub connections) and a shared
    /// connection (for `PUBLISH`).
    pub fn new(client: redis::Client, conn: MultiplexedConnection) -> Self {
        Self { client, conn }
    }
}

#[async_trait]
impl MessageBus for RedisMessageBus {
    async fn publish(&self, channel: &ChannelName, payload: &str) -> Result<(), BusError> {
        let mut conn = self.conn.clone();

        let receivers: i64 = conn
            .publish(channel.as_str(), payload)
            .await
            .map_err(unavailable)?;

        tracing::trace!(channel = %channel, receivers, "Published");
        Ok(())
    }

    async fn subscribe(&self, channel: &ChannelName) -> Result<Box<dyn Subscription>, BusError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(unavailable)?
            .into_pubsub();
        pubsub
            .subscribe(channel.as_str())
            .await
            .map_err(unavailable)?;

        let (deliveries_tx, deliveries) = mpsc::channel(DELIVERY_BUFFER);
        let (stop, stop_rx) = oneshot::channel();
        let listener = tokio::spawn(listen(pubsub, channel.clone(), deliveries_tx, stop_rx));

        Ok(Box::new(RedisSubscription {
            channel: channel.clone(),
            deliveries,
            stop,
            listener,
        }))
    }
}

impl std::fmt::Debug for RedisMessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisMessageBus").finish_non_exhaustive()
    }
}

/// Owns the pub/sub connection for one subscription.
///
/// Runs until told to stop (or the stop sender is dropped), the delivery
/// receiver goes away, or the connection ends. Unsubscribes on the first
/// two; a dead connection has nothing left to unsubscribe.
async fn listen(
    mut pubsub: PubSub,
    channel: ChannelName,
    deliveries: mpsc::Sender<Result<String, BusError>>,
    mut stop: oneshot::Receiver<()>,
) -> Result<(), BusError> {
    {
        let mut messages = std::pin::pin!(pubsub.on_message());
        loop {
            tokio::select! {
                _ = &mut stop => break,
                message = messages.next() => {
                    let Some(message) = message else {
                        let error = BusError::Unavailable("pub/sub connection closed".to_string());
                        let _ = deliveries.send(Err(error.clone())).await;
                        return Err(error);
                    };
                    match message.get_payload::<String>() {
                        Ok(payload) => {
                            if deliveries.send(Ok(payload)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(channel = %channel, "Skipping non-text payload: {}", e);
                        }
                    }
                }
            }
        }
    }

    pubsub
        .unsubscribe(channel.as_str())
        .await
        .map_err(unavailable)
}

struct RedisSubscription {
    channel: ChannelName,
    deliveries: mpsc::Receiver<Result<String, BusError>>,
    stop: oneshot::Sender<()>,
    listener: JoinHandle<Result<(), BusError>>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    fn channel(&self) -> &ChannelName {
        &self.channel
    }

    async fn next_message(&mut self) -> Result<Option<String>, BusError> {
        self.deliveries.recv().await.transpose()
    }

    async fn unsubscribe(self: Box<Self>) -> Result<(), BusError> {
        let RedisSubscription {
            deliveries,
            stop,
            listener,
            ..
        } = *self;
        drop(deliveries);
        let _ = stop.send(());

        listener
            .await
            .map_err(|e| BusError::Unavailable(format!("listener task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    // Requires a running Redis instance.
    // Run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn publish_reaches_subscriber_and_unsubscribe_completes() {
        let client = redis::Client::open("redis://127.0.0.1/").unwrap();
        let conn = client.get_multiplexed_tokio_connection().await.unwrap();
        let bus = RedisMessageBus::new(client, conn);
        let channel = ChannelName::for_user(&UserId::new("redis-bus-test").unwrap());

        let mut subscription = bus.subscribe(&channel).await.unwrap();
        bus.publish(&channel, "@alice hi").await.unwrap();

        assert_eq!(
            subscription.next_message().await.unwrap(),
            Some("@alice hi".to_string())
        );
        subscription.unsubscribe().await.unwrap();
    }
}
