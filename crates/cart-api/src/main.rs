//! # Redis-Cart RS
//!
//! Cart and checkout service backed by Redis and Stripe.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export REDIS_HOST=localhost
//! export STRIPE_API_KEY=sk_test_...
//!
//! # Run the server
//! cart-server
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.bind_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Checkout currency: {}", state.config.currency);

    let app = routes::create_router(state);

    info!("Redis-Cart starting on http://{}", addr);

    if !is_prod {
        info!("Status: GET http://{}/status", addr);
        info!("Add to cart: POST http://{}/cart/add", addr);
        info!("Checkout: POST http://{}/cart/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

fn print_banner() {
    println!(
        r#"
  Redis-Cart RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Cart and checkout service
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
