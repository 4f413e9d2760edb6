//! Wire codec for relayed messages.
//!
//! Clients address a message as `@<recipient> <body>`. The relay rewrites
//! the prefix before publishing, so the recipient sees `@<sender> <body>`.
//! [`decode`] and [`encode`] are therefore not inverses: one extracts the
//! recipient, the other embeds the sender.

use super::naming::{ChannelName, HistoryKey};
use crate::domain::foundation::UserId;

const ADDRESS_PREFIX: char = '@';
const SEPARATOR: char = ' ';

/// Syntactic pre-check of a raw client frame.
///
/// True iff the frame starts with `@` and contains a space. Says nothing
/// about whether the addressed user exists.
pub fn validate(raw: &str) -> bool {
    raw.starts_with(ADDRESS_PREFIX) && raw.contains(SEPARATOR)
}

/// Splits a validated frame into `(recipient, body)` on the first space.
///
/// Returns `None` for frames that fail [`validate`]. The body may be empty
/// (`"@bob "`) and may itself contain spaces.
pub fn decode(raw: &str) -> Option<(&str, &str)> {
    raw.strip_prefix(ADDRESS_PREFIX)?.split_once(SEPARATOR)
}

/// Produces the relayed form `@<sender> <body>`.
pub fn encode(sender: &UserId, body: &str) -> String {
    format!("{}{}{}{}", ADDRESS_PREFIX, sender, SEPARATOR, body)
}

/// A message accepted for relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: UserId,
    recipient: UserId,
    body: String,
}

impl Message {
    pub fn new(sender: UserId, recipient: UserId, body: impl Into<String>) -> Self {
        Self {
            sender,
            recipient,
            body: body.into(),
        }
    }

    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    pub fn recipient(&self) -> &UserId {
        &self.recipient
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The string published to the recipient's channel and stored in
    /// their history.
    pub fn to_wire(&self) -> String {
        encode(&self.sender, &self.body)
    }

    /// Channel the recipient's session listens on.
    pub fn channel(&self) -> ChannelName {
        ChannelName::for_user(&self.recipient)
    }

    /// History list the message is appended to.
    pub fn history_key(&self) -> HistoryKey {
        HistoryKey::for_user(&self.recipient)
    }
}
