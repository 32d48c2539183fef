use crate::error::{Result, TransportError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_URL: &str = "ws://127.0.0.1:8780";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Settings for connecting to a remote vibrator HAL service
///
/// Every field has a default, so a partial JSON document such as
/// `{"url": "ws://10.0.0.2:8780"}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorConfig {
    /// WebSocket URL of the HAL service
    pub url: String,

    /// Upper bound on a single connection attempt, in milliseconds
    pub connect_timeout_ms: u64,

    /// Upper bound on waiting for a response, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ConnectorConfig {
    /// Default settings pointed at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ConnectorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reject settings that can never produce a working connection
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(TransportError::InvalidConfig("url is empty".to_string()));
        }
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(TransportError::InvalidConfig(format!(
                "url must use ws:// or wss://, got {}",
                self.url
            )));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(TransportError::InvalidConfig(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = ConnectorConfig::from_json(r#"{"url": "ws://10.0.0.2:9000"}"#).unwrap();
        assert_eq!(config.url, "ws://10.0.0.2:9000");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_bad_scheme_and_zero_timeouts() {
        assert!(matches!(
            ConnectorConfig::from_json(r#"{"url": "http://localhost"}"#),
            Err(TransportError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConnectorConfig::from_json(r#"{"requestTimeoutMs": 0}"#),
            Err(TransportError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConnectorConfig::from_json("not json"),
            Err(TransportError::Json(_))
        ));
    }

    #[test]
    fn default_is_valid() {
        assert!(ConnectorConfig::default().validate().is_ok());
    }
}
