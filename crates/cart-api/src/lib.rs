//! # cart-api
//!
//! HTTP API layer for redis-cart-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Cart and checkout endpoints backed by Redis and Stripe
//! - Prometheus metrics for store, gateway and HTTP traffic
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/status` | Store and gateway status |
//! | POST | `/cart/add` | Add an item to the cart |
//! | POST | `/cart/checkout` | Create checkout session for the cart |
//! | GET | `/metrics` | Prometheus metrics |

pub mod handlers;
pub mod instrument;
pub mod metrics;
pub mod routes;
pub mod state;

pub use metrics::Metrics;
pub use routes::create_router;
pub use state::{AppConfig, AppState};
