//! # Instrumented Boundaries
//!
//! Decorators that time every call across the store and gateway traits
//! and feed the results into [`Metrics`]. The core crate never sees them.

use crate::metrics::Metrics;
use async_trait::async_trait;
use cart_core::{
    BoxedCartStore, BoxedPaymentGateway, CartResult, CartStore, CheckoutSession, PaymentGateway,
    SessionRequest,
};
use std::collections::HashMap;
use std::sync::Arc;

/// `CartStore` wrapper recording store latency and failures
pub struct InstrumentedStore {
    inner: BoxedCartStore,
    metrics: Arc<Metrics>,
}

impl InstrumentedStore {
    pub fn new(inner: BoxedCartStore, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl CartStore for InstrumentedStore {
    async fn increment(&self, key: &str, field: &str, delta: i64) -> CartResult<i64> {
        self.metrics
            .observe_store(self.inner.increment(key, field, delta))
            .await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> CartResult<Vec<String>> {
        self.metrics
            .observe_store(self.inner.keys_with_prefix(prefix))
            .await
    }

    async fn fields(&self, key: &str) -> CartResult<HashMap<String, String>> {
        self.metrics.observe_store(self.inner.fields(key)).await
    }

    async fn delete(&self, keys: &[String]) -> CartResult<u64> {
        self.metrics.observe_store(self.inner.delete(keys)).await
    }

    async fn settle(&self, field: &str, charges: &[(String, i64)]) -> CartResult<u64> {
        self.metrics
            .observe_store(self.inner.settle(field, charges))
            .await
    }

    async fn ping(&self) -> CartResult<()> {
        self.metrics.observe_store(self.inner.ping()).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

/// `PaymentGateway` wrapper recording gateway latency and failures
pub struct InstrumentedGateway {
    inner: BoxedPaymentGateway,
    metrics: Arc<Metrics>,
}

impl InstrumentedGateway {
    pub fn new(inner: BoxedPaymentGateway, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl PaymentGateway for InstrumentedGateway {
    async fn create_session(&self, request: &SessionRequest) -> CartResult<CheckoutSession> {
        self.metrics
            .observe_gateway(self.inner.create_session(request))
            .await
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
