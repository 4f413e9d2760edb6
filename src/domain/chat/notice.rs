//! Fixed notices the server sends back over a client's own connection.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Frame failed the `@<id> <body>` syntax check.
    InvalidMessage,
    /// Addressed user has no active session.
    UserNotActive,
    /// Connection rejected because the id already has a session.
    UserAlreadyActive,
}

impl Notice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notice::InvalidMessage => "ERROR: Invalid message",
            Notice::UserNotActive => "ERROR: User is not active",
            Notice::UserAlreadyActive => "ERROR: User is already active",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_use_exact_wire_text() {
        assert_eq!(Notice::InvalidMessage.as_str(), "ERROR: Invalid message");
        assert_eq!(Notice::UserNotActive.as_str(), "ERROR: User is not active");
        assert_eq!(
            Notice::UserAlreadyActive.to_string(),
            "ERROR: User is already active"
        );
    }
}
