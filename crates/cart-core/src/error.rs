//! # Cart Error Types
//!
//! Typed error handling for the cart and checkout workflow.
//! All cart operations return `Result<T, CartError>`.

use thiserror::Error;

/// Failure creating a checkout session with the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No credential configured for the gateway
    #[error("Payment gateway is not configured")]
    NotConfigured,

    /// Network/HTTP error communicating with the gateway
    #[error("Network error: {0}")]
    Network(String),

    /// Gateway answered with a non-success status
    #[error("Gateway rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Gateway answered with a body we could not understand
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Amount refused before it was sent
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
}

/// Core error type for all cart operations
#[derive(Debug, Error)]
pub enum CartError {
    /// Connectivity or command failure against the key-value store
    #[error("Store error during {operation}: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    /// Checkout session creation failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Cart entry in the store is corrupt
    #[error("Malformed cart entry {key}: {reason}")]
    MalformedEntry { key: String, reason: String },

    /// Price resolver has no price for this item
    #[error("Unknown item: {item_id}")]
    UnknownItem { item_id: String },

    /// Price arithmetic or currency mismatch
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// Add-to-cart quantity must be positive
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Item id empty or containing the key separator
    #[error("Invalid item id: {item_id:?}")]
    InvalidItemId { item_id: String },

    /// Checkout attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Session was created but the cart could not be cleared.
    /// The checkout URL is still usable; the cart needs manual reconciliation.
    #[error("Checkout session {session_id} created but cart was not cleared: {message}")]
    PartialCompletion {
        session_id: String,
        checkout_url: String,
        message: String,
    },

    /// Configuration errors (missing or invalid values)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CartError {
    /// Build a store error for the named operation
    pub fn store(operation: &'static str, message: impl ToString) -> Self {
        CartError::Store {
            operation,
            message: message.to_string(),
        }
    }

    /// True for failures that the store itself reported
    pub fn is_store_failure(&self) -> bool {
        matches!(self, CartError::Store { .. })
    }

    /// True for failures that the payment gateway reported
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, CartError::Gateway(_))
    }

    /// Stable, enumerated code safe to return to clients
    pub fn code(&self) -> &'static str {
        match self {
            CartError::Store { .. } => "store_unavailable",
            CartError::Gateway(GatewayError::NotConfigured) => "gateway_not_configured",
            CartError::Gateway(_) => "gateway_unavailable",
            CartError::MalformedEntry { .. } => "malformed_cart_entry",
            CartError::UnknownItem { .. } => "unknown_item",
            CartError::InvalidPrice { .. } => "invalid_price",
            CartError::InvalidQuantity { .. } => "invalid_quantity",
            CartError::InvalidItemId { .. } => "invalid_item_id",
            CartError::EmptyCart => "empty_cart",
            CartError::PartialCompletion { .. } => "partial_completion",
            CartError::Configuration(_) => "configuration_error",
        }
    }

    /// Client-facing message. Never contains store or gateway internals.
    pub fn public_message(&self) -> &'static str {
        match self {
            CartError::Store { .. } => "Cart storage is unavailable",
            CartError::Gateway(GatewayError::NotConfigured) => "Payment gateway is not configured",
            CartError::Gateway(_) => "Payment gateway could not create a checkout session",
            CartError::MalformedEntry { .. } => "Cart contains a malformed entry",
            CartError::UnknownItem { .. } => "Cart contains an unknown item",
            CartError::InvalidPrice { .. } => "Cart total could not be computed",
            CartError::InvalidQuantity { .. } => "Quantity must be a positive integer",
            CartError::InvalidItemId { .. } => "Item id must be non-empty and must not contain ':'",
            CartError::EmptyCart => "Cart is empty",
            CartError::PartialCompletion { .. } => {
                "Checkout session created but the cart could not be cleared"
            }
            CartError::Configuration(_) => "Service is misconfigured",
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CartError::Store { .. } => 500,
            CartError::Gateway(_) => 502,
            CartError::MalformedEntry { .. } => 500,
            CartError::UnknownItem { .. } => 404,
            CartError::InvalidPrice { .. } => 400,
            CartError::InvalidQuantity { .. } => 400,
            CartError::InvalidItemId { .. } => 400,
            CartError::EmptyCart => 400,
            CartError::PartialCompletion { .. } => 500,
            CartError::Configuration(_) => 500,
        }
    }
}

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;
