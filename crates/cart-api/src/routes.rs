//! # Routes
//!
//! Axum router configuration for the cart API.

use crate::handlers;
use crate::metrics::{track_http, METRICS_PATH};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
///   - GET  /status         - Store and gateway status
///   - POST /cart/add       - Add an item to the cart
///   - POST /cart/checkout  - Check out the cart
///   - GET  /metrics        - Prometheus metrics
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cart_routes = Router::new()
        .route("/add", post(handlers::add_to_cart))
        .route("/checkout", post(handlers::checkout));

    Router::new()
        .route("/status", get(handlers::status))
        .nest("/cart", cart_routes)
        .route(METRICS_PATH, get(handlers::metrics))
        // Route layer so MatchedPath is available to the metrics middleware
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_http,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
