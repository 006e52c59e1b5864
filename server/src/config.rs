//! Server configuration.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::Duration;
use cnrates_fx::UpstreamConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unusable value.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidVar { key: String, value: String },

    /// The assembled configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Third-party exchange API settings carried over from earlier deployments.
///
/// Loaded and reported at startup but not used by any rate source.
#[derive(Clone)]
pub struct LegacyApiConfig {
    pub primary_rate_api: String,
    pub secondary_rate_api: String,
    pub backup_rate_api: String,
    pub offshore_rate_api: String,
    pub api_key: Option<String>,
}

impl Default for LegacyApiConfig {
    fn default() -> Self {
        Self {
            primary_rate_api: "https://api.exchangerate-api.com/v4/latest/USD".to_string(),
            secondary_rate_api: "https://api.exchangerate.host/latest".to_string(),
            backup_rate_api: "https://open.er-api.com/v6/latest/USD".to_string(),
            offshore_rate_api: "https://api.apilayer.com/exchangerates_data/latest".to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for LegacyApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyApiConfig")
            .field("primary_rate_api", &self.primary_rate_api)
            .field("secondary_rate_api", &self.secondary_rate_api)
            .field("backup_rate_api", &self.backup_rate_api)
            .field("offshore_rate_api", &self.offshore_rate_api)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Log level.
    pub log_level: String,
    /// How long a combined snapshot is served from cache.
    pub cache_ttl: Duration,
    /// Upstream endpoints and deadlines.
    pub upstream: UpstreamConfig,
    /// Unused legacy API settings.
    pub legacy: LegacyApiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 5000,
            log_level: "info".to_string(),
            cache_ttl: cnrates_common::constants::cache_window(),
            upstream: UpstreamConfig::default(),
            legacy: LegacyApiConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("CNRATES_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("CNRATES_LISTEN_PORT") {
            config.listen_port = parse_var("CNRATES_LISTEN_PORT", &port)?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(secs) = lookup("CNRATES_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::try_seconds(parse_var("CNRATES_CACHE_TTL_SECS", &secs)?)
                .ok_or_else(|| ConfigError::InvalidVar {
                    key: "CNRATES_CACHE_TTL_SECS".to_string(),
                    value: secs.clone(),
                })?;
        }

        let upstream = &mut config.upstream;
        if let Some(url) = lookup("CNRATES_ONSHORE_PRIMARY_URL") {
            upstream.onshore_primary_url = url;
        }
        if let Some(url) = lookup("CNRATES_ONSHORE_FALLBACK_URL") {
            upstream.onshore_fallback_url = url;
        }
        if let Some(url) = lookup("CNRATES_OFFSHORE_PRIMARY_URL") {
            upstream.offshore_primary_url = url;
        }
        if let Some(url) = lookup("CNRATES_OFFSHORE_FALLBACK_URL") {
            upstream.offshore_fallback_url = url;
        }
        if let Some(secs) = lookup("CNRATES_UPSTREAM_TIMEOUT_SECS") {
            let timeout = StdDuration::from_secs(parse_var("CNRATES_UPSTREAM_TIMEOUT_SECS", &secs)?);
            upstream.onshore_timeout = timeout;
            upstream.offshore_fallback_timeout = timeout;
            upstream.offshore_primary_timeout = upstream.offshore_primary_timeout.min(timeout);
        }

        let legacy = &mut config.legacy;
        if let Some(url) = lookup("EXCHANGE_API_PRIMARY") {
            legacy.primary_rate_api = url;
        }
        if let Some(url) = lookup("EXCHANGE_API_SECONDARY") {
            legacy.secondary_rate_api = url;
        }
        if let Some(url) = lookup("EXCHANGE_API_BACKUP") {
            legacy.backup_rate_api = url;
        }
        if let Some(url) = lookup("EXCHANGE_API_OFFSHORE") {
            legacy.offshore_rate_api = url;
        }
        legacy.api_key = lookup("EXCHANGE_API_KEY").filter(|key| !key.is_empty());

        Ok(config)
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_port == 0 {
            return Err(ConfigError::Invalid("Listen port cannot be 0".to_string()));
        }

        if self.cache_ttl <= Duration::zero() {
            return Err(ConfigError::Invalid("Cache TTL must be positive".to_string()));
        }

        self.upstream.validate().map_err(ConfigError::Invalid)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl, Duration::minutes(5));
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = tokio_test::assert_ok!(ServerConfig::from_lookup(lookup(&[
            ("CNRATES_LISTEN_PORT", "8080"),
            ("CNRATES_CACHE_TTL_SECS", "60"),
            ("CNRATES_OFFSHORE_FALLBACK_URL", "http://127.0.0.1:9000/juhe"),
            ("CNRATES_UPSTREAM_TIMEOUT_SECS", "3"),
            ("EXCHANGE_API_KEY", "secret"),
        ])));

        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.cache_ttl, Duration::seconds(60));
        assert_eq!(config.upstream.offshore_fallback_url, "http://127.0.0.1:9000/juhe");
        assert_eq!(config.upstream.onshore_timeout, StdDuration::from_secs(3));
        assert_eq!(config.upstream.offshore_primary_timeout, StdDuration::from_secs(3));
        assert_eq!(config.legacy.api_key.as_deref(), Some("secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_var() {
        let err = ServerConfig::from_lookup(lookup(&[("CNRATES_LISTEN_PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidVar {
                key: "CNRATES_LISTEN_PORT".to_string(),
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn test_cache_ttl_out_of_range() {
        let err = ServerConfig::from_lookup(lookup(&[(
            "CNRATES_CACHE_TTL_SECS",
            "9223372036854775807",
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidVar {
                key: "CNRATES_CACHE_TTL_SECS".to_string(),
                value: "9223372036854775807".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ServerConfig::default();
        config.listen_port = 0;
        assert!(config.validate().is_err());

        let config = ServerConfig::from_lookup(lookup(&[("CNRATES_CACHE_TTL_SECS", "0")])).unwrap();
        assert!(config.validate().is_err());

        let config =
            ServerConfig::from_lookup(lookup(&[("CNRATES_ONSHORE_PRIMARY_URL", "chinamoney")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_legacy_api_key_is_redacted() {
        let config = ServerConfig::from_lookup(lookup(&[("EXCHANGE_API_KEY", "secret")])).unwrap();
        let debug = format!("{:?}", config.legacy);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
