//! # Request Handlers
//!
//! Axum request handlers for the cart API.

use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cart_core::CartError;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Item to add
    pub item_id: String,
    /// Quantity to add; must be positive
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Checkout response
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Redirect URL for the hosted payment page
    pub checkout_url: String,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub redis_connected: bool,
    pub stripe_configured: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
            checkout_url: None,
        }
    }

    pub fn with_checkout_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_url = Some(url.into());
        self
    }
}

impl From<&CartError> for ErrorResponse {
    fn from(err: &CartError) -> Self {
        let response = Self::new(err.code(), err.public_message());
        match err {
            CartError::PartialCompletion { checkout_url, .. } => {
                response.with_checkout_url(checkout_url.clone())
            }
            _ => response,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Handlers
// =============================================================================

/// Service status. Always 200; store and gateway state are reported in the body.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let report = state.status.status().await;

    Json(StatusResponse {
        status: "ok",
        timestamp: report
            .timestamp
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        redis_connected: report.store_reachable,
        stripe_configured: report.gateway_configured,
    })
}

/// Add an item to the cart
#[instrument(skip(state, request), fields(item_id = %request.item_id, quantity = request.quantity))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.cart.add_to_cart(&request.item_id, request.quantity).await {
        Ok(quantity) => {
            info!("Cart now holds {} of {}", quantity, request.item_id);
            Ok(Json(MessageResponse {
                message: "Item added to cart".to_string(),
            }))
        }
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to add to cart: {}", e);
            } else {
                warn!("Rejected add to cart: {}", e);
            }
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err((status, Json(ErrorResponse::from(&e))))
        }
    }
}

/// Check out the whole cart
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<Json<CheckoutResponse>, ApiError> {
    match state.checkout.checkout().await {
        Ok(session) => {
            info!(
                "Created checkout session {} for {}",
                session.session_id,
                session.amount.display()
            );
            Ok(Json(CheckoutResponse {
                checkout_url: session.checkout_url,
            }))
        }
        Err(e) => {
            error!("Checkout failed: {}", e);
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&e))))
        }
    }
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
