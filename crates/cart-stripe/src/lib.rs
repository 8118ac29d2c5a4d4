//! # cart-stripe
//!
//! Stripe payment gateway for redis-cart-rs.
//!
//! **StripeCheckoutGateway** creates hosted Checkout Sessions through the
//! Checkout Sessions API. The API key is optional at startup; without it
//! the gateway reports itself unconfigured and every checkout fails with
//! `GatewayError::NotConfigured`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_stripe::StripeCheckoutGateway;
//! use cart_core::PaymentGateway;
//!
//! // Create gateway from environment (STRIPE_API_KEY)
//! let gateway = StripeCheckoutGateway::from_env()?;
//!
//! let session = gateway.create_session(&request).await?;
//!
//! // Redirect user to session.checkout_url
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::StripeCheckoutGateway;
pub use config::StripeConfig;
