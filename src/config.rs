//! Registry and coordinator configuration.

use serde::Deserialize;

/// Default time a finished session is kept before it is reaped.
pub const DEFAULT_FINISHED_RETENTION_SECS: i64 = 300;

/// Default upper bound on nickname length, in characters.
pub const DEFAULT_MAX_NICKNAME_LEN: usize = 24;

/// Default upper bound on a chat message, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 500;

/// Tunables for the session registry and room coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Seconds a finished session survives before `reap_finished` drops it
    pub finished_retention_secs: i64,

    /// Longest nickname accepted at join
    pub max_nickname_len: usize,

    /// Longest chat message relayed to a room
    pub max_message_len: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            finished_retention_secs: DEFAULT_FINISHED_RETENTION_SECS,
            max_nickname_len: DEFAULT_MAX_NICKNAME_LEN,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl RegistryConfig {
    /// Parse from JSON. Missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn finished_retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.finished_retention_secs.max(0))
    }

    /// Check a nickname is non-blank and within the length limit.
    pub fn accepts_nickname(&self, nickname: &str) -> bool {
        let trimmed = nickname.trim();
        !trimmed.is_empty() && trimmed.chars().count() <= self.max_nickname_len
    }

    /// Check a chat message is non-blank and within the length limit.
    pub fn accepts_message(&self, message: &str) -> bool {
        let trimmed = message.trim();
        !trimmed.is_empty() && trimmed.chars().count() <= self.max_message_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = RegistryConfig::from_json_str(r#"{"maxNicknameLen": 8}"#).unwrap();
        assert_eq!(config.max_nickname_len, 8);
        assert_eq!(config.finished_retention_secs, DEFAULT_FINISHED_RETENTION_SECS);

        let config = RegistryConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn test_accepts_nickname() {
        let config = RegistryConfig {
            max_nickname_len: 4,
            ..Default::default()
        };
        assert!(config.accepts_nickname("ana"));
        assert!(!config.accepts_nickname("   "));
        assert!(!config.accepts_nickname("toolong"));
    }

    #[test]
    fn test_accepts_message() {
        let config = RegistryConfig {
            max_message_len: 5,
            ..Default::default()
        };
        assert!(config.accepts_message("  gg  "));
        assert!(!config.accepts_message(""));
        assert!(!config.accepts_message("good game"));
    }

    #[test]
    fn test_negative_retention_clamped() {
        let config = RegistryConfig {
            finished_retention_secs: -5,
            ..Default::default()
        };
        assert_eq!(config.finished_retention(), chrono::Duration::zero());
    }
}
