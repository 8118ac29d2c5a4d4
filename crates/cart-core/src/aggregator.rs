//! # Cart Aggregation
//!
//! Reads every cart entry from the store, prices it, and sums a total.
//! Read-only against the store.

use crate::cart::{cart_prefix, item_id_from_key, CartEntry, CartSummary, LineItem, QUANTITY_FIELD};
use crate::error::{CartError, CartResult};
use crate::pricing::BoxedPriceResolver;
use crate::product::{Currency, Price};
use crate::store::BoxedCartStore;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct CartAggregator {
    store: BoxedCartStore,
    prices: BoxedPriceResolver,
    currency: Currency,
}

impl CartAggregator {
    pub fn new(store: BoxedCartStore, prices: BoxedPriceResolver, currency: Currency) -> Self {
        Self {
            store,
            prices,
            currency,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Snapshot and price the cart. Line items are ordered by item id.
    #[instrument(skip(self), fields(store = self.store.backend_name(), prices = self.prices.resolver_name()))]
    pub async fn aggregate(&self) -> CartResult<CartSummary> {
        let mut keys = self.store.keys_with_prefix(&cart_prefix()).await?;
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        let mut line_items = Vec::with_capacity(keys.len());
        let mut total = Price::zero(self.currency);

        for key in keys {
            let fields = self.store.fields(&key).await?;
            if fields.is_empty() {
                // removed between SCAN and HGETALL
                warn!(%key, "Cart entry vanished during aggregation");
                continue;
            }

            let entry = parse_entry(&key, fields.get(QUANTITY_FIELD))?;
            let resolved = self.prices.resolve(&entry.item_id).await?;
            if resolved.unit_price.currency != self.currency {
                return Err(CartError::InvalidPrice {
                    message: format!(
                        "{} is priced in {}, checkout is in {}",
                        entry.item_id, resolved.unit_price.currency, self.currency
                    ),
                });
            }

            let line = LineItem {
                item_id: entry.item_id.clone(),
                name: resolved.name,
                unit_price: resolved.unit_price,
                quantity: entry.quantity,
            };
            total = total.checked_add(&line.total()?)?;

            entries.push(entry);
            line_items.push(line);
        }

        debug!(entries = entries.len(), total = %total.display(), "Aggregated cart");

        Ok(CartSummary {
            entries,
            line_items,
            total,
        })
    }
}

fn parse_entry(key: &str, quantity: Option<&String>) -> CartResult<CartEntry> {
    let malformed = |reason: &str| CartError::MalformedEntry {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let item_id = item_id_from_key(key)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| malformed("key has no item id"))?;
    let raw = quantity.ok_or_else(|| malformed("missing quantity field"))?;
    let quantity = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| malformed("quantity is not an integer"))?;
    if quantity < 1 {
        return Err(malformed("quantity must be at least 1"));
    }

    Ok(CartEntry::new(item_id, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{CatalogPriceResolver, FixedPriceResolver};
    use crate::product::{Product, ProductCatalog};
    use crate::store::{CartStore, InMemoryCartStore};
    use std::sync::Arc;

    fn aggregator(store: Arc<InMemoryCartStore>) -> CartAggregator {
        CartAggregator::new(
            store,
            Arc::new(FixedPriceResolver::new(Price::new(10.0, Currency::USD))),
            Currency::USD,
        )
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let summary = aggregator(Arc::new(InMemoryCartStore::new()))
            .aggregate()
            .await
            .unwrap();

        assert!(summary.is_empty());
        assert!(summary.line_items.is_empty());
        assert_eq!(summary.total.amount, 0);
    }

    #[tokio::test]
    async fn test_total_in_minor_units() {
        let store = Arc::new(InMemoryCartStore::new());
        store.increment("cart:item2", "quantity", 3).await.unwrap();
        store.increment("cart:item1", "quantity", 2).await.unwrap();

        let summary = aggregator(store).aggregate().await.unwrap();

        assert_eq!(summary.total.amount, 5000);
        assert_eq!(summary.total.as_decimal(), 50.0);
        assert_eq!(summary.item_count(), 5);
        assert_eq!(
            summary.entries,
            vec![CartEntry::new("item1", 2), CartEntry::new("item2", 3)]
        );
        assert_eq!(summary.line_items[0].name, "Item item1");
    }

    #[tokio::test]
    async fn test_ignores_other_namespaces() {
        let store = Arc::new(InMemoryCartStore::new());
        store.increment("cart:item1", "quantity", 1).await.unwrap();
        store.increment("carts:item9", "quantity", 9).await.unwrap();

        let summary = aggregator(store).aggregate().await.unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert_eq!(summary.total.amount, 1000);
    }

    #[tokio::test]
    async fn test_missing_quantity_is_malformed() {
        let store = Arc::new(InMemoryCartStore::new());
        store.put_field("cart:item1", "qty", "2").await;

        let err = aggregator(store).aggregate().await.unwrap_err();
        assert!(matches!(err, CartError::MalformedEntry { ref key, .. } if key == "cart:item1"));
    }

    #[tokio::test]
    async fn test_non_numeric_quantity_is_malformed() {
        let store = Arc::new(InMemoryCartStore::new());
        store.put_field("cart:item1", "quantity", "two").await;

        let err = aggregator(store).aggregate().await.unwrap_err();
        assert_eq!(err.code(), "malformed_cart_entry");
    }

    #[tokio::test]
    async fn test_zero_quantity_is_malformed() {
        let store = Arc::new(InMemoryCartStore::new());
        store.put_field("cart:item1", "quantity", "0").await;

        assert!(aggregator(store).aggregate().await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_item_from_catalog() {
        let store = Arc::new(InMemoryCartStore::new());
        store.increment("cart:item1", "quantity", 1).await.unwrap();
        store.increment("cart:ghost", "quantity", 1).await.unwrap();

        let catalog = ProductCatalog::new().with_product(Product::new(
            "item1",
            "Widget",
            Price::new(3.0, Currency::USD),
        ));
        let aggregator = CartAggregator::new(
            store,
            Arc::new(CatalogPriceResolver::new(catalog)),
            Currency::USD,
        );

        let err = aggregator.aggregate().await.unwrap_err();
        assert!(matches!(err, CartError::UnknownItem { ref item_id } if item_id == "ghost"));
    }

    #[tokio::test]
    async fn test_currency_mismatch() {
        let store = Arc::new(InMemoryCartStore::new());
        store.increment("cart:item1", "quantity", 1).await.unwrap();

        let aggregator = CartAggregator::new(
            store,
            Arc::new(FixedPriceResolver::new(Price::new(10.0, Currency::EUR))),
            Currency::USD,
        );
        assert!(matches!(
            aggregator.aggregate().await,
            Err(CartError::InvalidPrice { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(InMemoryCartStore::new());
        store.set_offline(true);
        assert!(aggregator(store).aggregate().await.unwrap_err().is_store_failure());
    }
}
