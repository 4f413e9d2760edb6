//! Deterministic mapping from users to bus channels and history keys.

use std::fmt;

use crate::domain::foundation::UserId;

const CHANNEL_PREFIX: &str = "channel_";
const HISTORY_PREFIX: &str = "history_list_";

/// Pub/sub topic carrying messages for exactly one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn for_user(user_id: &UserId) -> Self {
        Self(format!("{}{}", CHANNEL_PREFIX, user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage key of a user's recent-message list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey(String);

impl HistoryKey {
    pub fn for_user(user_id: &UserId) -> Self {
        Self(format!("{}{}", HISTORY_PREFIX, user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn channel_name_is_prefixed_user_id() {
        assert_eq!(ChannelName::for_user(&user("alice")).as_str(), "channel_alice");
    }

    #[test]
    fn history_key_is_prefixed_user_id() {
        assert_eq!(
            HistoryKey::for_user(&user("alice")).as_str(),
            "history_list_alice"
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        assert_eq!(
            ChannelName::for_user(&user("bob")),
            ChannelName::for_user(&user("bob"))
        );
        assert_ne!(
            ChannelName::for_user(&user("bob")),
            ChannelName::for_user(&user("carol"))
        );
    }

    #[test]
    fn display_matches_as_str() {
        let key = HistoryKey::for_user(&user("dave"));
        assert_eq!(key.to_string(), key.as_str());
    }
}
