//! Oracle connection settings and retry policy.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_API_KEY: &str = "REDINK_API_KEY";
pub const ENV_BASE_URL: &str = "REDINK_API_BASE";
pub const ENV_MODEL: &str = "REDINK_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "REDINK_TIMEOUT_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "REDINK_MAX_ATTEMPTS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("REDINK_API_KEY is required (set it in the environment or a .env file)")]
    MissingApiKey,
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Bounded retries with exponential backoff.
///
/// The delay before attempt `n + 1` is `multiplier × 2^(n-1)`, clamped to
/// `[min_delay, max_delay]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_millis(800),
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(factor)
            .clamp(self.min_delay, self.max_delay)
    }
}

/// Everything needed to reach an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl OracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Read settings through `lookup`, falling back to defaults for everything
    /// but the API key. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY).ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key.trim());

        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model.trim().to_string();
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_positive(ENV_TIMEOUT_SECS, &value)?.into());
        }
        if let Some(value) = get(ENV_MAX_ATTEMPTS) {
            config.retry.max_attempts = parse_positive(ENV_MAX_ATTEMPTS, &value)?;
        }
        Ok(config)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_retry_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(800));
        assert_eq!(policy.delay(2), Duration::from_millis(1600));
        assert_eq!(policy.delay(3), Duration::from_millis(3200));
        assert_eq!(policy.delay(4), Duration::from_secs(4));
        assert_eq!(policy.delay(40), Duration::from_secs(4));
    }

    #[test]
    fn retry_delay_respects_minimum() {
        let policy = RetryPolicy {
            multiplier: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
    }

    #[test]
    fn missing_api_key() {
        let err = OracleConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = OracleConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn defaults_apply() {
        let config = OracleConfig::from_lookup(lookup(&[(ENV_API_KEY, "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn overrides_apply() {
        let config = OracleConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_BASE_URL, "http://localhost:8080/v1"),
            (ENV_MODEL, "local-model"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_MAX_ATTEMPTS, "1"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn invalid_numbers_rejected() {
        let err = OracleConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MAX_ATTEMPTS, "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_ATTEMPTS));

        let err = OracleConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_TIMEOUT_SECS, .. }));
    }
}
