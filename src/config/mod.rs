use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// What to do when the key-value store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Carry on as if the store had nothing (cache miss, unlimited request).
    #[default]
    FailOpen,
    /// Surface the store error to the caller.
    Propagate,
}

impl FromStr for FailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "fail_open" | "open" => Ok(FailurePolicy::FailOpen),
            "propagate" | "fail-closed" => Ok(FailurePolicy::Propagate),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub cache_default_expiration_secs: u64,
    pub cache_failure_policy: FailurePolicy,
    pub cache_single_flight: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            api_base_uri: "/api".to_string(),
            database_url: None,
            database_max_connections: 10,
            redis_url: None,
            cache_default_expiration_secs: 300,
            cache_failure_policy: FailurePolicy::FailOpen,
            cache_single_flight: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            server_host: non_empty("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(&non_empty, "SERVER_PORT", defaults.server_port)?,
            api_base_uri: non_empty("API_BASE_URI")
                .map(|uri| normalize_base_uri(&uri))
                .unwrap_or(defaults.api_base_uri),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_or(
                &non_empty,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            redis_url: non_empty("REDIS_URL"),
            cache_default_expiration_secs: parse_or(
                &non_empty,
                "CACHE_DEFAULT_EXPIRATION_SECS",
                defaults.cache_default_expiration_secs,
            )?,
            cache_failure_policy: parse_or(
                &non_empty,
                "CACHE_FAILURE_POLICY",
                defaults.cache_failure_policy,
            )?,
            cache_single_flight: parse_or(
                &non_empty,
                "CACHE_SINGLE_FLIGHT",
                defaults.cache_single_flight,
            )?,
        })
    }

    /// Expiration applied to cache writes that don't name one.
    pub fn cache_default_expiration(&self) -> Option<Duration> {
        match self.cache_default_expiration_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn normalize_base_uri(uri: &str) -> String {
    let trimmed = uri.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.api_base_uri, "/api");
        assert!(config.redis_url.is_none());
        assert_eq!(config.cache_failure_policy, FailurePolicy::FailOpen);
        assert!(config.cache_single_flight);
        assert_eq!(config.cache_default_expiration(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("SERVER_PORT", "8080"),
            ("API_BASE_URI", "v1/"),
            ("REDIS_URL", "redis://127.0.0.1/"),
            ("CACHE_FAILURE_POLICY", "propagate"),
            ("CACHE_SINGLE_FLIGHT", "false"),
            ("CACHE_DEFAULT_EXPIRATION_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.api_base_uri, "/v1");
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
        assert_eq!(config.cache_failure_policy, FailurePolicy::Propagate);
        assert!(!config.cache_single_flight);
        assert_eq!(config.cache_default_expiration(), None);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = config_from(&[("CACHE_FAILURE_POLICY", "sometimes")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CACHE_FAILURE_POLICY", .. }));

        assert!(config_from(&[("SERVER_PORT", "http")]).is_err());
    }
}
