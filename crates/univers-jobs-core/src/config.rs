//! Client configuration.
//!
//! | env | default |
//! |---|---|
//! | `UNIVERS_API_BASE` | `http://localhost:8000/api` |
//! | `UNIVERS_REQUEST_TIMEOUT_MS` | `30000` |
//! | `UNIVERS_POLL_INTERVAL_MS` | `2000` |

use std::time::Duration;

use thiserror::Error;

pub const ENV_API_BASE: &str = "UNIVERS_API_BASE";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "UNIVERS_REQUEST_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "UNIVERS_POLL_INTERVAL_MS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed delay between two status checks of the same job.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub poll: PollConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(base) = lookup(ENV_API_BASE)
            && !base.trim().is_empty()
        {
            config.api = config.api.with_base_url(base.trim());
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            config.api.request_timeout = parse_millis(ENV_REQUEST_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll.interval = parse_millis(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        Ok(config)
    }
}

/// Positive millisecond count.
pub fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let ms: u64 = raw.trim().parse().map_err(|_| invalid("not a number"))?;
    if ms == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_backend_setup() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll.interval, Duration::from_millis(2000));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_API_BASE, "https://univers.example.com/api/"),
            (ENV_REQUEST_TIMEOUT_MS, "5000"),
            (ENV_POLL_INTERVAL_MS, "750"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "https://univers.example.com/api");
        assert_eq!(config.api.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.poll.interval, Duration::from_millis(750));
    }

    #[rstest]
    #[case::not_a_number("soon")]
    #[case::zero("0")]
    #[case::negative("-5")]
    fn bad_interval_is_rejected(#[case] raw: &str) {
        let err = Config::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_MS, raw)])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: ENV_POLL_INTERVAL_MS, .. }
        ));
    }
}
