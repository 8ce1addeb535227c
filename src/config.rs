use crate::errors::{AppError, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub rate_limit: RateLimitConfig,
    pub imagekit: ImageKitConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

/// What the middleware does when the counter store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Let the request through without a decision
    Open,
    /// Reject the request with 503
    Closed,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Closed
    }
}

/// Where rate limit counters live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// Shared across instances
    Redis,
    /// Local to this process
    Memory,
}

impl Default for CounterBackend {
    fn default() -> Self {
        CounterBackend::Redis
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum allowed hits per window
    pub limit: u64,
    pub window_seconds: u64,
    /// Namespace for counter keys in the shared store
    pub key_prefix: String,
    pub analytics_enabled: bool,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    pub store_timeout_ms: u64,
    #[serde(default)]
    pub backend: CounterBackend,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            window_seconds: 60,
            key_prefix: "@upstash/ratelimit".to_string(),
            analytics_enabled: true,
            failure_policy: FailurePolicy::Closed,
            store_timeout_ms: 1000,
            backend: CounterBackend::Redis,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageKitConfig {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
    pub upload_endpoint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let environment = env::var("LIBRARY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(
                config::File::with_name(&format!("config/{}", environment)).required(false),
            )
            // e.g., LIBRARY__RATE_LIMIT__LIMIT=20
            .add_source(
                config::Environment::with_prefix("LIBRARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Configuration(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Configuration("Invalid port number".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(AppError::Configuration(
                "Database URL is required".to_string(),
            ));
        }

        if self.redis.url.is_empty() {
            return Err(AppError::Configuration(
                "Redis URL is required".to_string(),
            ));
        }

        if self.rate_limit.limit == 0 {
            return Err(AppError::Configuration(
                "Rate limit must be greater than zero".to_string(),
            ));
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(AppError::Configuration(
                "Rate limit window must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::load().expect("Failed to load config");
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = Config::load().expect("Failed to load config");
        config.rate_limit.limit = 0;
        assert!(config.validate().is_err());

        config.rate_limit.limit = 10;
        config.rate_limit.window_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_rate_limit_matches_deployment() {
        let config = RateLimitConfig::default();
        assert_eq!(config.limit, 10);
        assert_eq!(config.window(), Duration::from_secs(60));
        assert_eq!(config.failure_policy, FailurePolicy::Closed);
    }

    #[test]
    fn test_failure_policy_deserialize() {
        let policy: FailurePolicy = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(policy, FailurePolicy::Open);
    }

    #[test]
    fn test_counter_backend_deserialize() {
        let backend: CounterBackend = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(backend, CounterBackend::Memory);
        assert_eq!(RateLimitConfig::default().backend, CounterBackend::Redis);
    }
}
