//! # cart-redis
//!
//! Redis implementation of the `CartStore` trait.
//!
//! ```rust,ignore
//! use cart_redis::{RedisCartStore, RedisConfig};
//!
//! let store = RedisCartStore::new(&RedisConfig::from_env()?)?;
//! store.ping().await?;
//! ```

pub mod config;
pub mod store;

pub use config::{RedisConfig, DEFAULT_REDIS_PORT};
pub use store::RedisCartStore;
