//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! The API key is loaded from the environment and is optional: without it
//! the service still starts and reports `stripe_configured: false`.

use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// - `STRIPE_API_KEY` (optional; empty counts as unset)
    /// - `STRIPE_API_BASE_URL` (optional, default `https://api.stripe.com`)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("STRIPE_API_KEY").ok();
        let mut config = Self::new(secret_key);
        if let Ok(url) = env::var("STRIPE_API_BASE_URL") {
            config.api_base_url = url;
        }

        if let Some(key) = &config.secret_key {
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                tracing::warn!("STRIPE_API_KEY does not look like a Stripe secret key");
            }
        }
        config
    }

    /// Create config with an explicit key (for testing)
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            secret_key: secret_key.filter(|k| !k.trim().is_empty()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Check whether a key is present
    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key
            .as_deref()
            .map(|k| k.starts_with("sk_test_") || k.starts_with("rk_test_"))
            .unwrap_or(false)
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> Option<String> {
        self.secret_key.as_ref().map(|k| format!("Bearer {}", k))
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}
