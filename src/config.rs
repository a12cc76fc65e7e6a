// Client configuration
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://secure.slicify.com/Service/BookingService.asmx";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Everything the client needs, fixed at construction.
///
/// Credentials are mandatory; every other field has a default matching the
/// public booking service. The password never appears in `Debug` output.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_ms: u64,
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: String::new(),
            password: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll: PollConfig::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .field("poll", &self.poll)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON document. Missing fields fall back
    /// to their defaults; the result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let config: ClientConfig =
            serde_json::from_str(json).map_err(|e| ClientError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.username.is_empty() {
            return Err(ClientError::ConfigError("username must be set".to_string()));
        }
        if self.password.is_empty() {
            return Err(ClientError::ConfigError("password must be set".to_string()));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::ConfigError(format!("invalid base url: {}", e)))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ClientError::ConfigError(format!(
                "unsupported url scheme: {}",
                url.scheme()
            )));
        }

        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        self.poll.validate()
    }
}

/// Controls how `wait_ready` polls the booking status.
///
/// The defaults poll every 10 seconds forever.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
    /// Give up after this long. `None` waits until the booking is ready or closed.
    pub max_wait_ms: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            max_wait_ms: None,
        }
    }
}

impl PollConfig {
    pub fn fixed(interval: Duration) -> Self {
        let interval_ms = millis(interval);
        Self {
            initial_interval_ms: interval_ms,
            max_interval_ms: interval_ms,
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.backoff_multiplier = multiplier;
        self.max_interval_ms = millis(max_interval);
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(millis(max_wait));
        self
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    // Exponential backoff capped at max_interval_ms, with optional jitter
    pub fn interval_for(&self, attempt: u32) -> Duration {
        let base_ms = (self.initial_interval_ms as f64
            * self.backoff_multiplier.powf(attempt as f64))
        .min(self.max_interval_ms as f64);

        if self.jitter_factor <= 0.0 {
            return Duration::from_millis(base_ms as u64);
        }

        let jitter = rand::random::<f64>() * self.jitter_factor * base_ms;
        let interval_ms = base_ms * (1.0 - self.jitter_factor / 2.0) + jitter;

        Duration::from_millis(interval_ms as u64)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.initial_interval_ms == 0 {
            return Err(ClientError::ConfigError(
                "poll initial_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_interval_ms < self.initial_interval_ms {
            return Err(ClientError::ConfigError(
                "poll max_interval_ms must not be below initial_interval_ms".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ClientError::ConfigError(
                "poll backoff_multiplier must be a finite value >= 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ClientError::ConfigError(
                "poll jitter_factor must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

// Saturates instead of wrapping for durations beyond u64 milliseconds
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.poll.interval_for(0), Duration::from_secs(10));
        assert_eq!(config.poll.interval_for(25), Duration::from_secs(10));
        assert_eq!(config.poll.max_wait(), None);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let result = ClientConfig::default().validate();
        assert!(matches!(result, Err(ClientError::ConfigError(_))));

        let result = ClientConfig::new("user", "").validate();
        assert!(matches!(result, Err(ClientError::ConfigError(_))));

        assert!(ClientConfig::new("user", "secret").validate().is_ok());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let config = ClientConfig::new("user", "hunter2");
        let debug = format!("{:?}", config);
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let json = r#"{
            "username": "alice",
            "password": "secret",
            "poll": { "initial_interval_ms": 500, "max_interval_ms": 4000, "backoff_multiplier": 2.0 }
        }"#;

        let config = ClientConfig::from_json(json).unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.poll.initial_interval_ms, 500);
        assert_eq!(config.poll.jitter_factor, 0.0);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let json = r#"{ "username": "a", "password": "b", "retries": 3 }"#;
        assert!(matches!(
            ClientConfig::from_json(json),
            Err(ClientError::ConfigError(_))
        ));
    }

    #[test_case("not a url"; "#1 unparsable")]
    #[test_case("ftp://secure.slicify.com/Service"; "#2 wrong scheme")]
    fn test_invalid_base_url(base_url: &str) {
        let config = ClientConfig::new("user", "secret").with_base_url(base_url);
        assert!(matches!(
            config.validate(),
            Err(ClientError::ConfigError(_))
        ));
    }

    #[test]
    fn test_backoff_growth_is_capped() {
        let poll = PollConfig::fixed(Duration::from_millis(100))
            .with_backoff(2.0, Duration::from_millis(1000));

        assert_eq!(poll.interval_for(0), Duration::from_millis(100));
        assert_eq!(poll.interval_for(1), Duration::from_millis(200));
        assert_eq!(poll.interval_for(3), Duration::from_millis(800));
        assert_eq!(poll.interval_for(4), Duration::from_millis(1000));
        assert_eq!(poll.interval_for(10), Duration::from_millis(1000));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let poll = PollConfig::fixed(Duration::MAX).with_max_wait(Duration::MAX);
        assert_eq!(poll.initial_interval_ms, u64::MAX);
        assert_eq!(poll.max_interval_ms, u64::MAX);
        assert_eq!(poll.max_wait_ms, Some(u64::MAX));

        let poll = PollConfig::fixed(Duration::from_millis(10))
            .with_backoff(2.0, Duration::from_secs(u64::MAX));
        assert_eq!(poll.max_interval_ms, u64::MAX);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let mut poll = PollConfig::fixed(Duration::from_millis(1000));
        poll.jitter_factor = 0.2;

        for attempt in 0..50 {
            let interval = poll.interval_for(attempt);
            assert!(interval >= Duration::from_millis(900));
            assert!(interval <= Duration::from_millis(1100));
        }
    }

    #[test_case(PollConfig { initial_interval_ms: 0, ..Default::default() }; "#1 zero interval")]
    #[test_case(PollConfig { max_interval_ms: 10, ..Default::default() }; "#2 cap below initial")]
    #[test_case(PollConfig { backoff_multiplier: 0.5, ..Default::default() }; "#3 shrinking backoff")]
    #[test_case(PollConfig { backoff_multiplier: f64::NAN, ..Default::default() }; "#4 nan backoff")]
    #[test_case(PollConfig { jitter_factor: 1.5, ..Default::default() }; "#5 jitter too large")]
    fn test_invalid_poll_config(poll: PollConfig) {
        assert!(poll.validate().is_err());
    }
}
