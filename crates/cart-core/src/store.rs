//! # Cart Store Trait
//!
//! Key-value store boundary for cart state. The store is the single
//! source of truth; the service keeps no cart state between requests.
//!
//! Implementations: `RedisCartStore` (cart-redis) for production and
//! [`InMemoryCartStore`] for tests and local development.

use crate::error::{CartError, CartResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Hash-per-key store operations used by the cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Atomically add `delta` to an integer field, creating key and field
    /// from zero when absent. Returns the new value.
    async fn increment(&self, key: &str, field: &str, delta: i64) -> CartResult<i64>;

    /// Enumerate every key starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> CartResult<Vec<String>>;

    /// Read all fields of a key. A missing key yields an empty map.
    async fn fields(&self, key: &str) -> CartResult<HashMap<String, String>>;

    /// Delete the given keys. Returns how many existed.
    async fn delete(&self, keys: &[String]) -> CartResult<u64>;

    /// Atomically subtract each `(key, amount)` from `field` and delete the
    /// keys left at or below zero. Returns how many keys were deleted.
    ///
    /// Increments applied after the amounts were read survive, and keys
    /// not listed are untouched.
    async fn settle(&self, field: &str, charges: &[(String, i64)]) -> CartResult<u64>;

    /// Lightweight liveness probe.
    async fn ping(&self) -> CartResult<()>;

    /// Backend name (for logging).
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared cart store (dynamic dispatch)
pub type BoxedCartStore = Arc<dyn CartStore>;

/// In-memory cart store for testing and single-process development.
///
/// Can be switched offline to simulate an unreachable store.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    entries: RwLock<BTreeMap<String, HashMap<String, String>>>,
    offline: AtomicBool,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Write a raw field value, bypassing increment semantics.
    pub async fn put_field(&self, key: &str, field: &str, value: &str) {
        self.entries
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_online(&self, operation: &'static str) -> CartResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CartError::store(operation, "connection refused"));
        }
        Ok(())
    }
}

fn parse_counter(operation: &'static str, value: Option<&String>) -> CartResult<i64> {
    match value {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| CartError::store(operation, "hash value is not an integer")),
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn increment(&self, key: &str, field: &str, delta: i64) -> CartResult<i64> {
        self.check_online("hincrby")?;
        let mut entries = self.entries.write().await;
        let hash = entries.entry(key.to_string()).or_default();
        let current = parse_counter("hincrby", hash.get(field))?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| CartError::store("hincrby", "increment or decrement would overflow"))?;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> CartResult<Vec<String>> {
        self.check_online("scan")?;
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn fields(&self, key: &str) -> CartResult<HashMap<String, String>> {
        self.check_online("hgetall")?;
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, keys: &[String]) -> CartResult<u64> {
        self.check_online("del")?;
        let mut entries = self.entries.write().await;
        Ok(keys
            .iter()
            .filter(|key| entries.remove(key.as_str()).is_some())
            .count() as u64)
    }

    async fn settle(&self, field: &str, charges: &[(String, i64)]) -> CartResult<u64> {
        self.check_online("settle")?;
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        for (key, amount) in charges {
            let remaining = match entries.get_mut(key.as_str()) {
                Some(hash) => {
                    let next = parse_counter("settle", hash.get(field))? - amount;
                    hash.insert(field.to_string(), next.to_string());
                    next
                }
                None => 0,
            };
            if remaining <= 0 && entries.remove(key.as_str()).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn ping(&self) -> CartResult<()> {
        self.check_online("ping")
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
