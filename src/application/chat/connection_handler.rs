//! ConnectionHandler - admission of new connections and session lifecycle.
//!
//! The single entry point for a freshly accepted connection. It is the only
//! code that registers a user in the presence registry, and the presence
//! guard it hands to the session is the only thing that unregisters them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::chat::Notice;
use crate::domain::foundation::{ConnectionId, UserId};
use crate::ports::{FrameReceiver, FrameSender, HistoryStore, MessageBus};

use super::presence::PresenceRegistry;
use super::session::{Session, SessionEnded, SessionState, DEFAULT_RELAY_TIMEOUT};

/// Result of handling one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The user already had a session; the connection was turned away.
    Rejected,
    /// The session ran and has closed.
    Ended(SessionEnded),
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Rejected => write!(f, "rejected"),
            SessionOutcome::Ended(reason) => write!(f, "ended: {}", reason),
        }
    }
}

/// Admits connections and runs their sessions.
pub struct ConnectionHandler {
    bus: Arc<dyn MessageBus>,
    history: Arc<dyn HistoryStore>,
    presence: Arc<PresenceRegistry>,
    relay_timeout: Duration,
}

impl ConnectionHandler {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        history: Arc<dyn HistoryStore>,
        presence: Arc<PresenceRegistry>,
    ) -> Self {
        Self {
            bus,
            history,
            presence,
            relay_timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    /// Bound the publish and history push of every accepted message.
    pub fn with_relay_timeout(mut self, relay_timeout: Duration) -> Self {
        self.relay_timeout = relay_timeout;
        self
    }

    /// The registry this handler admits into.
    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    /// Handle an accepted connection for `user_id` until it closes.
    ///
    /// The transport handshake has already happened. If the user is active
    /// elsewhere the new connection receives the "already active" notice and
    /// is closed; the existing session is untouched.
    pub async fn on_connect<S, R>(&self, mut sender: S, receiver: R, user_id: UserId) -> SessionOutcome
    where
        S: FrameSender + 'static,
        R: FrameReceiver + 'static,
    {
        let connection_id = ConnectionId::new();
        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            state = %SessionState::Starting,
            "Session state changed"
        );

        let Some(guard) = self.presence.admit(&user_id) else {
            if let Err(error) = sender.send_text(Notice::UserAlreadyActive.to_string()).await {
                tracing::debug!(connection_id = %connection_id, "Rejection notice failed: {}", error);
            }
            if let Err(error) = sender.close().await {
                tracing::trace!(connection_id = %connection_id, "Close after rejection: {}", error);
            }
            tracing::info!(
                connection_id = %connection_id,
                user_id = %user_id,
                "Unavailable user_id"
            );
            return SessionOutcome::Rejected;
        };

        tracing::info!(
            connection_id = %connection_id,
            user_id = %user_id,
            active_users = self.presence.active_count(),
            "Connected"
        );

        let session = Session::new(
            connection_id,
            guard,
            sender,
            receiver,
            Arc::clone(&self.bus),
            Arc::clone(&self.history),
            Arc::clone(&self.presence),
        )
        .with_relay_timeout(self.relay_timeout);
        let reason = session.run().await;

        tracing::info!(
            connection_id = %connection_id,
            user_id = %user_id,
            reason = %reason,
            "Disconnected"
        );
        SessionOutcome::Ended(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_displays_reason() {
        assert_eq!(SessionOutcome::Rejected.to_string(), "rejected");
        assert_eq!(
            SessionOutcome::Ended(SessionEnded::PeerClosed).to_string(),
            "ended: peer closed the connection"
        );
    }
}
