//! Session - one user's connection bridged to the message bus.
//!
//! A running session is two tasks:
//!
//! ```text
//!   client ──frames──▶ Inbound ──publish/push──▶ channel_<recipient>
//!                                               history_list_<recipient>
//!   client ◀──frames── Outbound ◀──deliveries── channel_<user>
//! ```
//!
//! Whichever task finishes first decides why the session ended. The other
//! one is cancelled through a shared `CancellationToken` and joined before
//! the session reports `Closed`, so no task outlives its session.
//!
//! Transport and bus failures are how sessions normally end. They are
//! logged at debug level and folded into [`SessionEnded`]; only a panicked
//! flow is logged as an error.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::domain::chat::{decode, validate, ChannelName, Message, Notice};
use crate::domain::foundation::{ConnectionId, UserId};
use crate::ports::{
    BusError, FrameReceiver, FrameSender, HistoryError, HistoryStore, InboundFrame, MessageBus,
    Subscription, TransportError,
};

use super::presence::{PresenceGuard, PresenceRegistry};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection accepted, admission pending.
    Starting,
    /// Both flows running.
    Running,
    /// One flow ended; the other is being cancelled and joined.
    Draining,
    /// Both flows finished and the user is unregistered.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Draining => "draining",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Why a running session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnded {
    /// The client closed the connection.
    PeerClosed,
    /// The connection failed underneath us.
    TransportFailed(String),
    /// Publishing, pushing history or reading the subscription failed.
    BusUnavailable(String),
    /// The bus ended the subscription.
    SubscriptionClosed,
    /// A flow task panicked. Never an expected termination.
    FlowPanicked,
}

impl fmt::Display for SessionEnded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnded::PeerClosed => write!(f, "peer closed the connection"),
            SessionEnded::TransportFailed(reason) => write!(f, "transport failed: {}", reason),
            SessionEnded::BusUnavailable(reason) => write!(f, "bus unavailable: {}", reason),
            SessionEnded::SubscriptionClosed => write!(f, "subscription closed"),
            SessionEnded::FlowPanicked => write!(f, "flow panicked"),
        }
    }
}

impl From<TransportError> for SessionEnded {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Closed => SessionEnded::PeerClosed,
            TransportError::Failed(reason) => SessionEnded::TransportFailed(reason),
        }
    }
}

/// Failure relaying an accepted message.
#[derive(Debug, thiserror::Error)]
enum RelayError {
    #[error(transparent)]
    Publish(#[from] BusError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("relay timed out after {0:?}")]
    TimedOut(Duration),
}

/// How a single flow finished.
#[derive(Debug)]
enum FlowExit {
    Ended(SessionEnded),
    Cancelled,
}

/// Sending half shared by both flows.
type SharedSender<S> = Arc<Mutex<S>>;

/// Upper bound on publishing and recording one accepted message.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(5);

/// An admitted connection, ready to run.
pub struct Session<S, R> {
    connection_id: ConnectionId,
    presence: PresenceGuard,
    sender: SharedSender<S>,
    receiver: R,
    bus: Arc<dyn MessageBus>,
    history: Arc<dyn HistoryStore>,
    registry: Arc<PresenceRegistry>,
    relay_timeout: Duration,
}

impl<S, R> Session<S, R>
where
    S: FrameSender + 'static,
    R: FrameReceiver + 'static,
{
    pub fn new(
        connection_id: ConnectionId,
        presence: PresenceGuard,
        sender: S,
        receiver: R,
        bus: Arc<dyn MessageBus>,
        history: Arc<dyn HistoryStore>,
        registry: Arc<PresenceRegistry>,
    ) -> Self {
        Self {
            connection_id,
            presence,
            sender: Arc::new(Mutex::new(sender)),
            receiver,
            bus,
            history,
            registry,
            relay_timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    /// Bound the publish and history push of each accepted message.
    pub fn with_relay_timeout(mut self, relay_timeout: Duration) -> Self {
        self.relay_timeout = relay_timeout;
        self
    }

    pub fn user_id(&self) -> &UserId {
        self.presence.user_id()
    }

    /// Run both flows until one ends, then drain and close.
    pub async fn run(self) -> SessionEnded {
        let Session {
            connection_id,
            presence,
            sender,
            receiver,
            bus,
            history,
            registry,
            relay_timeout,
        } = self;
        let user_id = presence.user_id().clone();
        let cancel = CancellationToken::new();
        // Flows stop even if this future is dropped before draining.
        let _cancel_on_drop = cancel.clone().drop_guard();

        log_transition(connection_id, &user_id, SessionState::Running);

        let mut outbound = tokio::spawn(outbound_flow(
            connection_id,
            user_id.clone(),
            Arc::clone(&bus),
            Arc::clone(&sender),
            cancel.clone(),
        ));
        let mut inbound = tokio::spawn(inbound_flow(
            connection_id,
            user_id.clone(),
            receiver,
            Arc::clone(&sender),
            bus,
            history,
            registry,
            relay_timeout,
            cancel.clone(),
        ));

        let (first, survivor, survivor_name) = tokio::select! {
            result = &mut outbound => (result, inbound, "inbound"),
            result = &mut inbound => (result, outbound, "outbound"),
        };

        log_transition(connection_id, &user_id, SessionState::Draining);
        cancel.cancel();

        let reason = settle(connection_id, &user_id, first);
        match survivor.await {
            Ok(FlowExit::Cancelled) => {}
            Ok(FlowExit::Ended(other)) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    user_id = %user_id,
                    flow = survivor_name,
                    reason = %other,
                    "Flow ended on its own while draining"
                );
            }
            Err(error) => log_join_error(connection_id, &user_id, survivor_name, &error),
        }

        // The client may already be gone.
        if let Err(error) = sender.lock().await.close().await {
            tracing::trace!(connection_id = %connection_id, "Close after drain: {}", error);
        }

        drop(presence);
        log_transition(connection_id, &user_id, SessionState::Closed);

        reason
    }
}

fn log_transition(connection_id: ConnectionId, user_id: &UserId, state: SessionState) {
    tracing::debug!(
        connection_id = %connection_id,
        user_id = %user_id,
        state = %state,
        "Session state changed"
    );
}

fn settle(
    connection_id: ConnectionId,
    user_id: &UserId,
    result: Result<FlowExit, JoinError>,
) -> SessionEnded {
    match result {
        Ok(FlowExit::Ended(reason)) => reason,
        // Nobody cancels before the first flow finishes.
        Ok(FlowExit::Cancelled) => SessionEnded::PeerClosed,
        Err(error) => {
            log_join_error(connection_id, user_id, "first", &error);
            SessionEnded::FlowPanicked
        }
    }
}

fn log_join_error(connection_id: ConnectionId, user_id: &UserId, flow: &str, error: &JoinError) {
    if error.is_panic() {
        tracing::error!(
            connection_id = %connection_id,
            user_id = %user_id,
            flow,
            "Session flow panicked: {}",
            error
        );
    } else {
        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            flow,
            "Session flow aborted: {}",
            error
        );
    }
}

async fn send_text<S: FrameSender>(
    sender: &SharedSender<S>,
    text: String,
) -> Result<(), TransportError> {
    sender.lock().await.send_text(text).await
}

/// Bus → connection.
///
/// Subscribes to the user's own channel and forwards deliveries verbatim.
/// The subscription, once opened, is unsubscribed exactly once on the way
/// out.
async fn outbound_flow<S: FrameSender>(
    connection_id: ConnectionId,
    user_id: UserId,
    bus: Arc<dyn MessageBus>,
    sender: SharedSender<S>,
    cancel: CancellationToken,
) -> FlowExit {
    let channel = ChannelName::for_user(&user_id);

    let subscribed = tokio::select! {
        biased;
        _ = cancel.cancelled() => return FlowExit::Cancelled,
        subscribed = bus.subscribe(&channel) => subscribed,
    };
    let mut subscription = match subscribed {
        Ok(subscription) => subscription,
        Err(error) => {
            tracing::debug!(
                connection_id = %connection_id,
                channel = %channel,
                "Subscribe failed: {}",
                error
            );
            return FlowExit::Ended(SessionEnded::BusUnavailable(error.to_string()));
        }
    };

    let exit = forward_deliveries(connection_id, subscription.as_mut(), &sender, &cancel).await;

    let channel = subscription.channel().clone();
    if let Err(error) = subscription.unsubscribe().await {
        tracing::debug!(
            connection_id = %connection_id,
            channel = %channel,
            "Unsubscribe failed: {}",
            error
        );
    }

    exit
}

async fn forward_deliveries<S: FrameSender>(
    connection_id: ConnectionId,
    subscription: &mut dyn Subscription,
    sender: &SharedSender<S>,
    cancel: &CancellationToken,
) -> FlowExit {
    loop {
        let delivery = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FlowExit::Cancelled,
            delivery = subscription.next_message() => delivery,
        };
        let payload = match delivery {
            Ok(Some(payload)) => payload,
            Ok(None) => return FlowExit::Ended(SessionEnded::SubscriptionClosed),
            Err(error) => {
                tracing::debug!(connection_id = %connection_id, "Subscription failed: {}", error);
                return FlowExit::Ended(SessionEnded::BusUnavailable(error.to_string()));
            }
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FlowExit::Cancelled,
            sent = send_text(sender, payload) => sent,
        };
        if let Err(error) = sent {
            tracing::debug!(connection_id = %connection_id, "Forward failed: {}", error);
            return FlowExit::Ended(error.into());
        }
    }
}

/// Connection → bus.
///
/// Protocol errors are answered with a notice and the loop continues. An
/// accepted message is published and pushed to history before the next
/// frame is read, which keeps one sender's messages to one recipient in
/// order. Cancellation is observed between messages, never between the
/// publish and the push. The relay timeout bounds that window instead.
#[allow(clippy::too_many_arguments)]
async fn inbound_flow<S: FrameSender, R: FrameReceiver>(
    connection_id: ConnectionId,
    user_id: UserId,
    mut receiver: R,
    sender: SharedSender<S>,
    bus: Arc<dyn MessageBus>,
    history: Arc<dyn HistoryStore>,
    registry: Arc<PresenceRegistry>,
    relay_timeout: Duration,
    cancel: CancellationToken,
) -> FlowExit {
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FlowExit::Cancelled,
            frame = receiver.next_frame() => frame,
        };
        let verdict = match frame {
            Ok(Some(InboundFrame::Text(raw))) => accept(&user_id, &raw, &registry),
            Ok(Some(InboundFrame::Unsupported)) => Err(Notice::InvalidMessage),
            Ok(None) => return FlowExit::Ended(SessionEnded::PeerClosed),
            Err(error) => {
                tracing::debug!(connection_id = %connection_id, "Receive failed: {}", error);
                return FlowExit::Ended(error.into());
            }
        };

        let message = match verdict {
            Ok(message) => message,
            Err(notice) => {
                tracing::trace!(connection_id = %connection_id, notice = %notice, "Frame refused");
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return FlowExit::Cancelled,
                    sent = send_text(&sender, notice.as_str().to_string()) => sent,
                };
                if let Err(error) = sent {
                    tracing::debug!(connection_id = %connection_id, "Notice failed: {}", error);
                    return FlowExit::Ended(error.into());
                }
                continue;
            }
        };

        if let Err(error) = relay(bus.as_ref(), history.as_ref(), &message, relay_timeout).await {
            tracing::debug!(
                connection_id = %connection_id,
                recipient = %message.recipient(),
                "Relay failed: {}",
                error
            );
            return FlowExit::Ended(SessionEnded::BusUnavailable(error.to_string()));
        }
    }
}

/// Check a raw frame and build the message to relay, or the notice to
/// send back.
///
/// The activity check is a snapshot. The recipient may disconnect right
/// after it (live delivery is lost, history still gets the entry) or
/// connect right after a refusal. Both are accepted best-effort behavior.
pub(crate) fn accept(
    sender: &UserId,
    raw: &str,
    registry: &PresenceRegistry,
) -> Result<Message, Notice> {
    if !validate(raw) {
        return Err(Notice::InvalidMessage);
    }
    let (recipient, body) = decode(raw).ok_or(Notice::InvalidMessage)?;
    // An empty recipient token can never belong to an active user.
    let recipient = UserId::new(recipient).map_err(|_| Notice::UserNotActive)?;
    if !registry.is_active(&recipient) {
        return Err(Notice::UserNotActive);
    }
    Ok(Message::new(sender.clone(), recipient, body))
}

async fn relay(
    bus: &dyn MessageBus,
    history: &dyn HistoryStore,
    message: &Message,
    timeout: Duration,
) -> Result<(), RelayError> {
    let payload = message.to_wire();
    let effects = async {
        bus.publish(&message.channel(), &payload).await?;
        history.push(&message.history_key(), &payload).await?;
        Ok::<(), RelayError>(())
    };
    tokio::time::timeout(timeout, effects)
        .await
        .map_err(|_| RelayError::TimedOut(timeout))?
}
