//! MessageBus port - Interface for the publish/subscribe transport.
//!
//! A session subscribes to its own channel and forwards whatever arrives;
//! other sessions publish into that channel. The bus knows nothing about
//! users, only channel names and string payloads.

use async_trait::async_trait;

use crate::domain::chat::ChannelName;

/// Errors that can occur talking to the message bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Bus unreachable or the connection to it broke.
    #[error("Message bus unavailable: {0}")]
    Unavailable(String),
}

/// Port for the pub/sub transport.
///
/// # Example
///
/// ```ignore
/// let mut subscription = bus.subscribe(&ChannelName::for_user(&me)).await?;
/// while let Some(payload) = subscription.next_message().await? {
///     // forward payload
/// }
/// subscription.unsubscribe().await?;
/// ```
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a payload to every current subscriber of `channel`.
    ///
    /// Publishing to a channel nobody listens on is not an error.
    async fn publish(&self, channel: &ChannelName, payload: &str) -> Result<(), BusError>;

    /// Open a subscription delivering every payload published to `channel`
    /// from now on.
    async fn subscribe(&self, channel: &ChannelName) -> Result<Box<dyn Subscription>, BusError>;
}

/// A live subscription to one channel.
///
/// `unsubscribe` takes the subscription by value, so it can run at most once.
#[async_trait]
pub trait Subscription: Send {
    /// The channel this subscription listens on.
    fn channel(&self) -> &ChannelName;

    /// Wait for the next payload.
    ///
    /// Returns `Ok(None)` once the subscription has ended. Must be cancel
    /// safe: dropping the returned future loses no later delivery.
    async fn next_message(&mut self) -> Result<Option<String>, BusError>;

    /// Stop receiving and release the underlying resources.
    async fn unsubscribe(self: Box<Self>) -> Result<(), BusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that traits are object-safe
    #[allow(dead_code)]
    fn assert_bus_object_safe(_: &dyn MessageBus) {}

    #[allow(dead_code)]
    fn assert_subscription_object_safe(_: &dyn Subscription) {}

    #[test]
    fn bus_error_displays_reason() {
        let err = BusError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Message bus unavailable: connection refused");
    }
}
