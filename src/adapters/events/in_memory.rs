//! In-memory message bus implementation for testing.
//!
//! Each channel is a tokio `broadcast` channel, created on first subscribe
//! and removed when its last subscriber unsubscribes.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.
//! Production code should use the Redis message bus adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::chat::ChannelName;
use crate::ports::{BusError, MessageBus, Subscription};

/// In-memory pub/sub bus for testing.
///
/// Features:
/// - Publish capture for assertions
/// - Subscriber and unsubscribe counters per channel
/// - Failure injection (`set_unavailable`, `disconnect_all`)
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryMessageBus::new());
///
/// bus.publish(&channel, "@alice hi").await?;
///
/// assert_eq!(bus.published_to(&channel), vec!["@alice hi"]);
/// ```
pub struct InMemoryMessageBus {
    state: Arc<BusState>,
}

struct BusState {
    channels: RwLock<HashMap<ChannelName, broadcast::Sender<String>>>,
    published: RwLock<Vec<(ChannelName, String)>>,
    unsubscribes: RwLock<HashMap<ChannelName, usize>>,
    unavailable: AtomicBool,
    capacity: usize,
}

impl BusState {
    fn check_available(&self) -> Result<(), BusError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BusError::Unavailable("bus marked unavailable".to_string()));
        }
        Ok(())
    }
}

impl InMemoryMessageBus {
    /// Creates a bus whose channels buffer up to `capacity` undelivered
    /// payloads per subscriber.
    pub fn new_with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(BusState {
                channels: RwLock::new(HashMap::new()),
                published: RwLock::new(Vec::new()),
                unsubscribes: RwLock::new(HashMap::new()),
                unavailable: AtomicBool::new(false),
                capacity,
            }),
        }
    }

    /// Creates a bus with default capacity (128 payloads).
    pub fn new() -> Self {
        Self::new_with_capacity(128)
    }

    // === Test Helpers ===

    /// Every successful publish, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published(&self) -> Vec<(ChannelName, String)> {
        self.state
            .published
            .read()
            .expect("InMemoryMessageBus: published lock poisoned")
            .clone()
    }

    /// Payloads published to one channel, in order.
    pub fn published_to(&self, channel: &ChannelName) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Number of live subscriptions on `channel`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn subscriber_count(&self, channel: &ChannelName) -> usize {
        self.state
            .channels
            .read()
            .expect("InMemoryMessageBus: channels lock poisoned")
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// How many times a subscription on `channel` was unsubscribed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn unsubscribe_count(&self, channel: &ChannelName) -> usize {
        self.state
            .unsubscribes
            .read()
            .expect("InMemoryMessageBus: unsubscribes lock poisoned")
            .get(channel)
            .copied()
            .unwrap_or(0)
    }

    /// Make publish and subscribe fail with `BusError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Simulate losing the bus: mark it unavailable and end every open
    /// subscription with an error.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn disconnect_all(&self) {
        self.set_unavailable(true);
        self.state
            .channels
            .write()
            .expect("InMemoryMessageBus: channels write lock poisoned")
            .clear();
    }

    /// End every subscription on `channel` cleanly.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn close_channel(&self, channel: &ChannelName) {
        self.state
            .channels
            .write()
            .expect("InMemoryMessageBus: channels write lock poisoned")
            .remove(channel);
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, channel: &ChannelName, payload: &str) -> Result<(), BusError> {
        self.state.check_available()?;

        self.state
            .published
            .write()
            .expect("InMemoryMessageBus: published write lock poisoned")
            .push((channel.clone(), payload.to_string()));

        let channels = self
            .state
            .channels
            .read()
            .expect("InMemoryMessageBus: channels lock poisoned");
        if let Some(sender) = channels.get(channel) {
            // No receivers is fine, same as Redis PUBLISH returning 0.
            let _ = sender.send(payload.to_string());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &ChannelName) -> Result<Box<dyn Subscription>, BusError> {
        self.state.check_available()?;

        let receiver = self
            .state
            .channels
            .write()
            .expect("InMemoryMessageBus: channels write lock poisoned")
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(self.state.capacity).0)
            .subscribe();

        Ok(Box::new(InMemorySubscription {
            channel: channel.clone(),
            receiver,
            state: Arc::clone(&self.state),
        }))
    }
}

struct InMemorySubscription {
    channel: ChannelName,
    receiver: broadcast::Receiver<String>,
    state: Arc<BusState>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    fn channel(&self) -> &ChannelName {
        &self.channel
    }

    async fn next_message(&mut self) -> Result<Option<String>, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Ok(Some(payload)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.channel, skipped, "Subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    self.state.check_available()?;
                    return Ok(None);
                }
            }
        }
    }

    async fn unsubscribe(self: Box<Self>) -> Result<(), BusError> {
        let InMemorySubscription {
            channel,
            receiver,
            state,
        } = *self;
        drop(receiver);

        *state
            .unsubscribes
            .write()
            .expect("InMemoryMessageBus: unsubscribes write lock poisoned")
            .entry(channel.clone())
            .or_insert(0) += 1;

        let mut channels = state
            .channels
            .write()
            .expect("InMemoryMessageBus: channels write lock poisoned");
        if channels
            .get(&channel)
            .map(|sender| sender.receiver_count() == 0)
            .unwrap_or(false)
        {
            channels.remove(&channel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn channel(id: &str) -> ChannelName {
        ChannelName::for_user(&UserId::new(id).unwrap())
    }

    #[tokio::test]
    async fn subscriber_receives_published_payload() {
        let bus = InMemoryMessageBus::new();
        let mut subscription = bus.subscribe(&channel("bob")).await.unwrap();

        bus.publish(&channel("bob"), "@alice hi").await.unwrap();

        assert_eq!(
            subscription.next_message().await.unwrap(),
            Some("@alice hi".to_string())
        );
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_recorded_not_failed() {
        let bus = InMemoryMessageBus::new();

        bus.publish(&channel("bob"), "@alice hi").await.unwrap();

        assert_eq!(bus.published_to(&channel("bob")), vec!["@alice hi"]);
        assert_eq!(bus.subscriber_count(&channel("bob")), 0);
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let bus = InMemoryMessageBus::new();
        let _bob = bus.subscribe(&channel("bob")).await.unwrap();
        let _carol = bus.subscribe(&channel("carol")).await.unwrap();

        bus.publish(&channel("bob"), "for bob").await.unwrap();

        assert_eq!(bus.published_to(&channel("carol")), Vec::<String>::new());
        assert_eq!(bus.subscriber_count(&channel("bob")), 1);
        assert_eq!(bus.subscriber_count(&channel("carol")), 1);
    }

    #[tokio::test]
    async fn unsubscribe_counts_and_cleans_up_channel() {
        let bus = InMemoryMessageBus::new();
        let subscription = bus.subscribe(&channel("bob")).await.unwrap();
        assert_eq!(bus.subscriber_count(&channel("bob")), 1);

        subscription.unsubscribe().await.unwrap();

        assert_eq!(bus.unsubscribe_count(&channel("bob")), 1);
        assert_eq!(bus.subscriber_count(&channel("bob")), 0);
    }

    #[tokio::test]
    async fn closed_channel_ends_subscription_cleanly() {
        let bus = InMemoryMessageBus::new();
        let mut subscription = bus.subscribe(&channel("bob")).await.unwrap();

        bus.close_channel(&channel("bob"));

        assert_eq!(subscription.next_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn disconnect_all_fails_open_subscriptions() {
        let bus = InMemoryMessageBus::new();
        let mut subscription = bus.subscribe(&channel("bob")).await.unwrap();

        bus.disconnect_all();

        assert!(matches!(
            subscription.next_message().await,
            Err(BusError::Unavailable(_))
        ));
        assert!(bus.publish(&channel("bob"), "x").await.is_err());
        assert!(bus.subscribe(&channel("bob")).await.is_err());
    }
}
