//! # Redis Configuration
//!
//! Connection settings for the cart store, loaded from the environment.

use cart_core::CartError;
use std::env;
use std::time::Duration;

/// Default Redis port; the service always connects on it
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Redis connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Redis host
    pub host: String,

    /// Redis port
    pub port: u16,

    /// Logical database
    pub db: i64,

    /// Per-command timeout in seconds (also bounds connecting)
    pub timeout_secs: u64,
}

impl RedisConfig {
    /// Load configuration from environment variables.
    ///
    /// - `REDIS_HOST` (default `localhost`)
    /// - `REDIS_TIMEOUT_SECS` (default `5`)
    pub fn from_env() -> Result<Self, CartError> {
        dotenvy::dotenv().ok();

        let host = env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string());
        let timeout_secs = match env::var("REDIS_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                CartError::Configuration(format!("REDIS_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            Err(_) => default_timeout(),
        };

        let config = Self {
            host,
            timeout_secs,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Builder: set host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Connection URL (`redis://host:port/db`)
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), CartError> {
        if self.host.trim().is_empty() {
            return Err(CartError::Configuration("REDIS_HOST is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(CartError::Configuration(
                "REDIS_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_REDIS_PORT,
            db: 0,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}
