//! # Status Reporting
//!
//! Liveness of the store and configuration presence of the gateway.
//! Never fails: an unreachable or slow store is reported as `false`.

use crate::gateway::BoxedPaymentGateway;
use crate::store::BoxedCartStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default upper bound for the store probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub store_reachable: bool,
    pub gateway_configured: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct StatusReporter {
    store: BoxedCartStore,
    gateway: BoxedPaymentGateway,
    probe_timeout: Duration,
}

impl StatusReporter {
    pub fn new(store: BoxedCartStore, gateway: BoxedPaymentGateway) -> Self {
        Self {
            store,
            gateway,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Builder: set store probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub async fn status(&self) -> StatusReport {
        let store_reachable = match tokio::time::timeout(self.probe_timeout, self.store.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(store = self.store.backend_name(), error = %e, "Store probe failed");
                false
            }
            Err(_) => {
                warn!(
                    store = self.store.backend_name(),
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "Store probe timed out"
                );
                false
            }
        };

        let report = StatusReport {
            store_reachable,
            gateway_configured: self.gateway.is_configured(),
            timestamp: Utc::now(),
        };
        debug!(?report, "Status");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CartResult, GatewayError};
    use crate::gateway::{CheckoutSession, PaymentGateway, SessionRequest};
    use crate::store::{CartStore, InMemoryCartStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StubGateway {
        configured: bool,
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_session(&self, _request: &SessionRequest) -> CartResult<CheckoutSession> {
            Err(GatewayError::NotConfigured.into())
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    /// Store whose ping never answers
    struct HangingStore;

    #[async_trait]
    impl CartStore for HangingStore {
        async fn increment(&self, _key: &str, _field: &str, _delta: i64) -> CartResult<i64> {
            Ok(0)
        }
        async fn keys_with_prefix(&self, _prefix: &str) -> CartResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn fields(&self, _key: &str) -> CartResult<HashMap<String, String>> {
            Ok(HashMap::new())
        }
        async fn delete(&self, _keys: &[String]) -> CartResult<u64> {
            Ok(0)
        }
        async fn settle(&self, _field: &str, _charges: &[(String, i64)]) -> CartResult<u64> {
            Ok(0)
        }
        async fn ping(&self) -> CartResult<()> {
            std::future::pending().await
        }
        fn backend_name(&self) -> &'static str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn test_reachable_and_configured() {
        let reporter = StatusReporter::new(
            Arc::new(InMemoryCartStore::new()),
            Arc::new(StubGateway { configured: true }),
        );
        let report = reporter.status().await;
        assert!(report.store_reachable);
        assert!(report.gateway_configured);
    }

    #[tokio::test]
    async fn test_store_down_is_false_not_error() {
        let store = Arc::new(InMemoryCartStore::new());
        store.set_offline(true);
        let reporter = StatusReporter::new(store, Arc::new(StubGateway { configured: false }));

        let report = reporter.status().await;
        assert!(!report.store_reachable);
        assert!(!report.gateway_configured);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_times_out() {
        let reporter = StatusReporter::new(
            Arc::new(HangingStore),
            Arc::new(StubGateway { configured: true }),
        )
        .with_probe_timeout(Duration::from_millis(50));

        assert!(!reporter.status().await.store_reachable);
    }
}
