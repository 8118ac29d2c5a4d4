//! # cart-core
//!
//! Core types and traits for the redis-cart checkout service.
//!
//! This crate provides:
//! - `CartStore` trait for the key-value store holding cart entries
//! - `PaymentGateway` trait for hosted checkout providers
//! - `PriceResolver` trait with fixed-price and catalog implementations
//! - `CartService`, `CartAggregator`, `CheckoutWorkflow`, `StatusReporter`
//! - `CartError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartService, CheckoutConfig, CheckoutWorkflow, FixedPriceResolver, Price, Currency};
//!
//! let cart = CartService::new(store.clone());
//! cart.add_to_cart("item1", 2).await?;
//!
//! let prices = Arc::new(FixedPriceResolver::new(Price::new(10.0, Currency::USD)));
//! let checkout = CheckoutWorkflow::new(store, prices, gateway, CheckoutConfig::default());
//! let session = checkout.checkout().await?;
//!
//! // Redirect user to session.checkout_url
//! ```

pub mod aggregator;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod pricing;
pub mod product;
pub mod status;
pub mod store;

// Re-exports for convenience
pub use aggregator::CartAggregator;
pub use cart::{
    cart_key, cart_prefix, item_id_from_key, validate_item_id, CartEntry, CartService,
    CartSummary, LineItem, CART_NAMESPACE, KEY_SEPARATOR, QUANTITY_FIELD,
};
pub use checkout::{CheckoutConfig, CheckoutWorkflow};
pub use error::{CartError, CartResult, GatewayError};
pub use gateway::{
    BoxedPaymentGateway, CheckoutSession, CheckoutUrls, PaymentGateway, SessionRequest,
    DEFAULT_SESSION_DESCRIPTION,
};
pub use pricing::{
    BoxedPriceResolver, CatalogPriceResolver, FixedPriceResolver, PriceResolver, ResolvedItem,
};
pub use product::{Currency, Price, Product, ProductCatalog};
pub use status::{StatusReport, StatusReporter, DEFAULT_PROBE_TIMEOUT};
pub use store::{BoxedCartStore, CartStore, InMemoryCartStore};
