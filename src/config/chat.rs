//! Chat behavior configuration

use serde::Deserialize;

use super::error::ValidationError;

const MAX_HISTORY_LENGTH: usize = 1000;

/// Chat configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Number of most recent messages returned by a history read
    #[serde(default = "default_history_length")]
    pub history_length: usize,
}

impl ChatConfig {
    /// Validate chat configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.history_length == 0 || self.history_length > MAX_HISTORY_LENGTH {
            return Err(ValidationError::InvalidHistoryLength {
                max: MAX_HISTORY_LENGTH,
            });
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_length: default_history_length(),
        }
    }
}

fn default_history_length() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.history_length, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_history_length() {
        let config = ChatConfig { history_length: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_history_length_too_large() {
        let config = ChatConfig {
            history_length: MAX_HISTORY_LENGTH + 1,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidHistoryLength { max: 1000 })
        ));
    }
}
