//! # Checkout Workflow
//!
//! Aggregate the cart, open a gateway session for the total, then settle
//! the snapshot in the store. Steps run strictly in order with no rollback:
//!
//! 1. aggregate (fails → nothing happened)
//! 2. create session (fails → cart untouched)
//! 3. settle snapshot (fails → `PartialCompletion`, session URL still usable)

use crate::aggregator::CartAggregator;
use crate::cart::QUANTITY_FIELD;
use crate::error::{CartError, CartResult};
use crate::gateway::{
    BoxedPaymentGateway, CheckoutSession, CheckoutUrls, SessionRequest, DEFAULT_SESSION_DESCRIPTION,
};
use crate::pricing::BoxedPriceResolver;
use crate::product::Currency;
use crate::store::BoxedCartStore;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Checkout behaviour knobs
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Currency for totals and sessions
    pub currency: Currency,
    /// Redirect URLs for the hosted page
    pub urls: CheckoutUrls,
    /// Name of the single aggregated line on the hosted page
    pub description: String,
    /// Open a zero-amount session for an empty cart instead of failing
    pub allow_empty_cart: bool,
}

impl CheckoutConfig {
    pub fn new(currency: Currency, urls: CheckoutUrls) -> Self {
        Self {
            currency,
            urls,
            description: DEFAULT_SESSION_DESCRIPTION.to_string(),
            allow_empty_cart: false,
        }
    }

    /// Builder: set empty-cart policy
    pub fn with_allow_empty_cart(mut self, allow: bool) -> Self {
        self.allow_empty_cart = allow;
        self
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::new(Currency::USD, CheckoutUrls::default())
    }
}

#[derive(Clone)]
pub struct CheckoutWorkflow {
    aggregator: CartAggregator,
    store: BoxedCartStore,
    gateway: BoxedPaymentGateway,
    config: CheckoutConfig,
}

impl CheckoutWorkflow {
    pub fn new(
        store: BoxedCartStore,
        prices: BoxedPriceResolver,
        gateway: BoxedPaymentGateway,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            aggregator: CartAggregator::new(store.clone(), prices, config.currency),
            store,
            gateway,
            config,
        }
    }

    pub fn aggregator(&self) -> &CartAggregator {
        &self.aggregator
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Run a checkout and return the created session.
    #[instrument(skip(self), fields(provider = self.gateway.provider_name()))]
    pub async fn checkout(&self) -> CartResult<CheckoutSession> {
        let summary = self.aggregator.aggregate().await?;

        if summary.is_empty() && !self.config.allow_empty_cart {
            return Err(CartError::EmptyCart);
        }

        let reference = Uuid::new_v4().to_string();
        let request = SessionRequest {
            reference: reference.clone(),
            amount: summary.total,
            description: self.config.description.clone(),
            success_url: self.config.urls.success_url.clone(),
            cancel_url: self.config.urls.cancel_url.clone(),
            idempotency_key: reference,
        };

        info!(
            reference = %request.reference,
            entries = summary.entries.len(),
            total = %summary.total.display(),
            "Creating checkout session"
        );

        let session = self.gateway.create_session(&request).await?;

        let charges: Vec<(String, i64)> = summary
            .entries
            .iter()
            .map(|entry| (entry.key(), entry.quantity))
            .collect();

        if let Err(e) = self.store.settle(QUANTITY_FIELD, &charges).await {
            error!(
                session_id = %session.session_id,
                error = %e,
                "Checkout session created but cart was not cleared"
            );
            return Err(CartError::PartialCompletion {
                session_id: session.session_id,
                checkout_url: session.checkout_url,
                message: e.to_string(),
            });
        }

        info!(session_id = %session.session_id, "Checkout complete");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::PaymentGateway;
    use crate::pricing::FixedPriceResolver;
    use crate::product::Price;
    use crate::store::{CartStore, InMemoryCartStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingGateway {
        fail: bool,
        requests: Mutex<Vec<SessionRequest>>,
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn create_session(&self, request: &SessionRequest) -> CartResult<CheckoutSession> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GatewayError::Rejected {
                    status: 400,
                    message: "amount_too_small".into(),
                }
                .into());
            }
            Ok(CheckoutSession::new(
                "cs_test_1",
                "recording",
                "https://pay.example.com/cs_test_1",
                request.amount,
            ))
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    /// Store whose settle step fails, everything else delegates
    struct SettleFailsStore {
        inner: InMemoryCartStore,
        fail_settle: AtomicBool,
    }

    #[async_trait]
    impl CartStore for SettleFailsStore {
        async fn increment(&self, key: &str, field: &str, delta: i64) -> CartResult<i64> {
            self.inner.increment(key, field, delta).await
        }
        async fn keys_with_prefix(&self, prefix: &str) -> CartResult<Vec<String>> {
            self.inner.keys_with_prefix(prefix).await
        }
        async fn fields(&self, key: &str) -> CartResult<HashMap<String, String>> {
            self.inner.fields(key).await
        }
        async fn delete(&self, keys: &[String]) -> CartResult<u64> {
            self.inner.delete(keys).await
        }
        async fn settle(&self, field: &str, charges: &[(String, i64)]) -> CartResult<u64> {
            if self.fail_settle.load(Ordering::SeqCst) {
                return Err(CartError::store("settle", "connection reset"));
            }
            self.inner.settle(field, charges).await
        }
        async fn ping(&self) -> CartResult<()> {
            self.inner.ping().await
        }
        fn backend_name(&self) -> &'static str {
            "settle-fails"
        }
    }

    fn workflow(
        store: BoxedCartStore,
        gateway: Arc<RecordingGateway>,
        config: CheckoutConfig,
    ) -> CheckoutWorkflow {
        CheckoutWorkflow::new(
            store,
            Arc::new(FixedPriceResolver::new(Price::new(10.0, Currency::USD))),
            gateway,
            config,
        )
    }

    #[tokio::test]
    async fn test_checkout_charges_total_and_clears_cart() {
        let store = Arc::new(InMemoryCartStore::new());
        store.increment("cart:item1", "quantity", 2).await.unwrap();
        store.increment("cart:item2", "quantity", 3).await.unwrap();
        let gateway = Arc::new(RecordingGateway::default());

        let checkout = workflow(store.clone(), gateway.clone(), CheckoutConfig::default());
        let session = checkout.checkout().await.unwrap();

        assert_eq!(session.checkout_url, "https://pay.example.com/cs_test_1");
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount.amount, 5000);
        assert_eq!(requests[0].description, "Cart Checkout");
        assert_eq!(requests[0].idempotency_key, requests[0].reference);

        let after = checkout.aggregator().aggregate().await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_cart_untouched() {
        let store = Arc::new(InMemoryCartStore::new());
        store.increment("cart:item1", "quantity", 2).await.unwrap();
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..Default::default()
        });

        let checkout = workflow(store.clone(), gateway, CheckoutConfig::default());
        let err = checkout.checkout().await.unwrap_err();

        assert!(err.is_gateway_failure());
        let after = checkout.aggregator().aggregate().await.unwrap();
        assert_eq!(after.entries, vec![crate::cart::CartEntry::new("item1", 2)]);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_by_default() {
        let gateway = Arc::new(RecordingGateway::default());
        let checkout = workflow(
            Arc::new(InMemoryCartStore::new()),
            gateway.clone(),
            CheckoutConfig::default(),
        );

        assert!(matches!(checkout.checkout().await, Err(CartError::EmptyCart)));
        assert!(gateway.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_allowed_opens_zero_session() {
        let gateway = Arc::new(RecordingGateway::default());
        let checkout = workflow(
            Arc::new(InMemoryCartStore::new()),
            gateway.clone(),
            CheckoutConfig::default().with_allow_empty_cart(true),
        );

        let session = checkout.checkout().await.unwrap();
        assert_eq!(session.amount.amount, 0);
        assert_eq!(gateway.requests.lock().unwrap()[0].amount.amount, 0);
    }

    #[tokio::test]
    async fn test_settle_failure_is_partial_completion() {
        let store = Arc::new(SettleFailsStore {
            inner: InMemoryCartStore::new(),
            fail_settle: AtomicBool::new(true),
        });
        store.increment("cart:item1", "quantity", 1).await.unwrap();

        let checkout = workflow(
            store.clone(),
            Arc::new(RecordingGateway::default()),
            CheckoutConfig::default(),
        );

        match checkout.checkout().await {
            Err(CartError::PartialCompletion {
                session_id,
                checkout_url,
                ..
            }) => {
                assert_eq!(session_id, "cs_test_1");
                assert_eq!(checkout_url, "https://pay.example.com/cs_test_1");
            }
            other => panic!("expected partial completion, got {:?}", other),
        }
        assert_eq!(store.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_failure_before_gateway() {
        let store = Arc::new(InMemoryCartStore::new());
        store.set_offline(true);
        let gateway = Arc::new(RecordingGateway::default());

        let checkout = workflow(store, gateway.clone(), CheckoutConfig::default());
        assert!(checkout.checkout().await.unwrap_err().is_store_failure());
        assert!(gateway.requests.lock().unwrap().is_empty());
    }
}
