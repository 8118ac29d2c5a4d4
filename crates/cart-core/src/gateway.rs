//! # Payment Gateway Trait
//!
//! Boundary to the hosted-checkout provider. Implementations: Stripe
//! (cart-stripe). The workflow hands the gateway one total and receives a
//! session carrying the redirect URL.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentGateway (trait)                   │
//! │  ├── create_session()                                       │
//! │  ├── is_configured()                                        │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┴─────────────────┐
//!  ┌───────┴───────┐                   ┌───────┴───────┐
//!  │StripeCheckout │                   │ Instrumented  │
//!  │   Gateway     │                   │   Gateway     │
//!  └───────────────┘                   └───────────────┘
//! ```

use crate::error::CartResult;
use crate::product::Price;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Line-item name used for the single aggregated checkout line
pub const DEFAULT_SESSION_DESCRIPTION: &str = "Cart Checkout";

/// What the workflow asks the gateway to charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Our reference for this checkout (UUID)
    pub reference: String,

    /// Total to charge, in minor units
    pub amount: Price,

    /// Name shown on the hosted page
    pub description: String,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if the customer cancels
    pub cancel_url: String,

    /// Idempotency key (prevents duplicate sessions on client retries)
    pub idempotency_key: String,
}

/// A checkout session created by a payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to redirect customer to for payment
    pub checkout_url: String,

    /// Amount the session charges
    pub amount: Price,

    /// When the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(
        session_id: impl Into<String>,
        provider: impl Into<String>,
        checkout_url: impl Into<String>,
        amount: Price,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            provider: provider.into(),
            checkout_url: checkout_url.into(),
            amount,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Check if session has not yet expired
    pub fn is_active(&self) -> bool {
        self.expires_at.map(|exp| exp > Utc::now()).unwrap_or(true)
    }
}

/// Hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for the requested amount.
    ///
    /// Every failure is reported as `CartError::Gateway`.
    async fn create_session(&self, request: &SessionRequest) -> CartResult<CheckoutSession>;

    /// True if a credential is present. Does not validate it.
    fn is_configured(&self) -> bool;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Redirect URLs handed to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// `{base_url}/checkout/success` and `{base_url}/checkout/cancel`
    pub fn from_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            success_url: format!("{}/checkout/success", base),
            cancel_url: format!("{}/checkout/cancel", base),
        }
    }

    pub fn new(success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::from_base("http://localhost:8080")
    }
}
