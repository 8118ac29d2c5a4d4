//! Redis-backed cart store.
//!
//! One hash per cart entry. Increments use `HINCRBY`, enumeration uses
//! `SCAN MATCH` and settling a checkout runs a Lua script so the whole
//! snapshot is applied atomically.
//!
//! The connection is opened lazily and re-opened after connection-level
//! failures, so the service starts (and reports status) with Redis down.

use crate::config::RedisConfig;
use async_trait::async_trait;
use cart_core::{CartError, CartResult, CartStore};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult, Script};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Subtract ARGV[i + 1] from field ARGV[1] of KEYS[i]; delete emptied keys.
const SETTLE_SCRIPT: &str = r#"
local removed = 0
for i, key in ipairs(KEYS) do
  local remaining = redis.call('HINCRBY', key, ARGV[1], -tonumber(ARGV[i + 1]))
  if remaining <= 0 then
    redis.call('DEL', key)
    removed = removed + 1
  end
end
return removed
"#;

pub struct RedisCartStore {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
    settle_script: Script,
}

impl RedisCartStore {
    /// Create a store. Does not connect.
    pub fn new(config: &RedisConfig) -> CartResult<Self> {
        config.validate()?;
        let client = redis::Client::open(config.url())
            .map_err(|e| CartError::Configuration(format!("invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            conn: Mutex::new(None),
            timeout: config.timeout(),
            settle_script: Script::new(SETTLE_SCRIPT),
        })
    }

    async fn connection(&self, operation: &'static str) -> CartResult<MultiplexedConnection> {
        let mut cached = self.conn.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }

        let conn = tokio::time::timeout(self.timeout, self.client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| CartError::store(operation, "timed out connecting to Redis"))?
            .map_err(|e| CartError::store(operation, e))?;

        info!("Connected to Redis");
        *cached = Some(conn.clone());
        Ok(conn)
    }

    async fn forget_connection(&self) {
        self.conn.lock().await.take();
    }

    /// Run one command on a shared connection under the configured timeout.
    async fn run<T, F, Fut>(&self, operation: &'static str, command: F) -> CartResult<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self.connection(operation).await?;

        match tokio::time::timeout(self.timeout, command(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_connection_dropped() || e.is_io_error() || e.is_connection_refusal() {
                    warn!(operation, error = %e, "Redis connection lost");
                    self.forget_connection().await;
                }
                Err(CartError::store(operation, e))
            }
            Err(_) => {
                self.forget_connection().await;
                Err(CartError::store(
                    operation,
                    format!("timed out after {}s", self.timeout.as_secs()),
                ))
            }
        }
    }
}

#[async_trait]
impl CartStore for RedisCartStore {
    async fn increment(&self, key: &str, field: &str, delta: i64) -> CartResult<i64> {
        self.run("hincrby", |mut conn| async move {
            conn.hincr::<_, _, _, i64>(key, field, delta).await
        })
        .await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> CartResult<Vec<String>> {
        let pattern = format!("{}*", prefix);
        let mut keys = self
            .run("scan", |mut conn| async move {
                let mut iter = conn.scan_match::<_, String>(pattern).await?;
                let mut keys = Vec::new();
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
                Ok(keys)
            })
            .await?;

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        debug!(prefix, count = keys.len(), "Scanned keys");
        Ok(keys)
    }

    async fn fields(&self, key: &str) -> CartResult<HashMap<String, String>> {
        self.run("hgetall", |mut conn| async move {
            conn.hgetall::<_, HashMap<String, String>>(key).await
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> CartResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys = keys.to_vec();
        self.run("del", |mut conn| async move { conn.del::<_, u64>(keys).await })
            .await
    }

    async fn settle(&self, field: &str, charges: &[(String, i64)]) -> CartResult<u64> {
        if charges.is_empty() {
            return Ok(0);
        }

        let mut invocation = self.settle_script.prepare_invoke();
        invocation.arg(field);
        for (key, amount) in charges {
            invocation.key(key.as_str()).arg(*amount);
        }

        let removed = self
            .run("settle", |mut conn| async move {
                invocation.invoke_async::<_, u64>(&mut conn).await
            })
            .await?;

        debug!(charged = charges.len(), removed, "Settled cart snapshot");
        Ok(removed)
    }

    async fn ping(&self) -> CartResult<()> {
        self.run("ping", |mut conn| async move {
            redis::cmd("PING").query_async::<_, String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCartStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
