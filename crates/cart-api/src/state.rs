//! # Application State
//!
//! Shared state for the Axum application: configuration, the cart
//! operations, and metrics. Store and gateway clients are injected here
//! and wrapped with instrumentation; nothing is process-global.

use crate::instrument::{InstrumentedGateway, InstrumentedStore};
use crate::metrics::Metrics;
use cart_core::{
    BoxedCartStore, BoxedPaymentGateway, BoxedPriceResolver, CartError, CartResult, CartService,
    CatalogPriceResolver, CheckoutConfig, CheckoutUrls, CheckoutWorkflow, Currency,
    FixedPriceResolver, Price, ProductCatalog, StatusReporter,
};
use cart_redis::{RedisCartStore, RedisConfig};
use cart_stripe::StripeCheckoutGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for default redirect URLs
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Checkout currency
    pub currency: Currency,
    /// Redirect after successful payment
    pub success_url: String,
    /// Redirect after cancelled payment
    pub cancel_url: String,
    /// Open zero-amount sessions for empty carts
    pub allow_empty_cart: bool,
    /// Placeholder unit price when no catalog is configured
    pub item_price: f64,
    /// TOML product catalog; when set, prices come from it
    pub catalog_path: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> CartResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CartResult<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080)?;
        let base_url = lookup("BASE_URL").unwrap_or_else(|| format!("http://localhost:{}", port));
        let defaults = CheckoutUrls::from_base(&base_url);

        let currency = match lookup("CHECKOUT_CURRENCY") {
            Some(code) => code.parse()?,
            None => Currency::USD,
        };

        let item_price: f64 = parse_or(&lookup, "CART_ITEM_PRICE", 10.0)?;
        if !item_price.is_finite() || item_price < 0.0 {
            return Err(CartError::Configuration(format!(
                "CART_ITEM_PRICE must be a non-negative number, got {}",
                item_price
            )));
        }

        Ok(Self {
            host,
            port,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            currency,
            success_url: lookup("CHECKOUT_SUCCESS_URL").unwrap_or(defaults.success_url),
            cancel_url: lookup("CHECKOUT_CANCEL_URL").unwrap_or(defaults.cancel_url),
            allow_empty_cart: parse_flag(&lookup, "CHECKOUT_ALLOW_EMPTY_CART")?,
            item_price,
            catalog_path: lookup("PRODUCT_CATALOG").filter(|p| !p.trim().is_empty()),
            base_url,
        })
    }

    /// Address to bind to (`host:port`)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig::new(
            self.currency,
            CheckoutUrls::new(&self.success_url, &self.cancel_url),
        )
        .with_allow_empty_cart(self.allow_empty_cart)
    }

    /// Catalog resolver if a catalog is configured, fixed price otherwise
    pub fn price_resolver(&self) -> CartResult<BoxedPriceResolver> {
        match &self.catalog_path {
            Some(path) => {
                let catalog = ProductCatalog::from_file(path)?;
                tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
                Ok(Arc::new(CatalogPriceResolver::new(catalog)))
            }
            None => Ok(Arc::new(FixedPriceResolver::new(Price::new(
                self.item_price,
                self.currency,
            )))),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let urls = CheckoutUrls::from_base("http://localhost:8080");
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            environment: "development".to_string(),
            currency: Currency::USD,
            success_url: urls.success_url,
            cancel_url: urls.cancel_url,
            allow_empty_cart: false,
            item_price: 10.0,
            catalog_path: None,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> CartResult<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CartError::Configuration(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> CartResult<bool> {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "" | "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(CartError::Configuration(format!(
            "{} must be true or false, got {}",
            key, v
        ))),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Add-to-cart
    pub cart: CartService,
    /// Checkout workflow
    pub checkout: CheckoutWorkflow,
    /// Status reporter
    pub status: StatusReporter,
    /// Prometheus metrics
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState backed by Redis and Stripe
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let redis = RedisConfig::from_env()?;

        let store: BoxedCartStore = Arc::new(RedisCartStore::new(&redis)?);
        let gateway: BoxedPaymentGateway = Arc::new(StripeCheckoutGateway::from_env()?);
        let prices = config.price_resolver()?;

        tracing::info!("Redis: {}", redis.url());
        if !gateway.is_configured() {
            tracing::warn!("STRIPE_API_KEY not set, checkout will fail until it is configured");
        }

        Self::from_parts(config, store, gateway, prices)
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: AppConfig,
        store: BoxedCartStore,
        gateway: BoxedPaymentGateway,
        prices: BoxedPriceResolver,
    ) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new()?);

        let store: BoxedCartStore = Arc::new(InstrumentedStore::new(store, metrics.clone()));
        let gateway: BoxedPaymentGateway =
            Arc::new(InstrumentedGateway::new(gateway, metrics.clone()));

        Ok(Self {
            cart: CartService::new(store.clone()),
            checkout: CheckoutWorkflow::new(
                store.clone(),
                prices,
                gateway.clone(),
                config.checkout_config(),
            ),
            status: StatusReporter::new(store, gateway),
            metrics,
            config,
        })
    }
}
