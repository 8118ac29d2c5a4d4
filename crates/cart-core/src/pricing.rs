//! # Price Resolution
//!
//! Pluggable unit-price lookup for cart items. The aggregator only sees
//! the [`PriceResolver`] trait, so a real catalog service can replace the
//! placeholder fixed price without touching aggregation.

use crate::error::{CartError, CartResult};
use crate::product::{Price, ProductCatalog};
use async_trait::async_trait;
use std::sync::Arc;

/// A priced item as seen by the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub name: String,
    pub unit_price: Price,
}

/// Looks up the unit price of an item.
#[async_trait]
pub trait PriceResolver: Send + Sync {
    /// Resolve an item, failing with `UnknownItem` if it cannot be priced.
    async fn resolve(&self, item_id: &str) -> CartResult<ResolvedItem>;

    /// Resolver name (for logging).
    fn resolver_name(&self) -> &'static str;
}

/// Type alias for a shared price resolver (dynamic dispatch)
pub type BoxedPriceResolver = Arc<dyn PriceResolver>;

/// Same price for every item, named `Item {id}`.
#[derive(Debug, Clone)]
pub struct FixedPriceResolver {
    price: Price,
}

impl FixedPriceResolver {
    pub fn new(price: Price) -> Self {
        Self { price }
    }
}

#[async_trait]
impl PriceResolver for FixedPriceResolver {
    async fn resolve(&self, item_id: &str) -> CartResult<ResolvedItem> {
        Ok(ResolvedItem {
            name: format!("Item {}", item_id),
            unit_price: self.price,
        })
    }

    fn resolver_name(&self) -> &'static str {
        "fixed"
    }
}

/// Prices items from a [`ProductCatalog`]. Inactive products are unknown.
#[derive(Debug, Clone)]
pub struct CatalogPriceResolver {
    catalog: ProductCatalog,
}

impl CatalogPriceResolver {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PriceResolver for CatalogPriceResolver {
    async fn resolve(&self, item_id: &str) -> CartResult<ResolvedItem> {
        self.catalog
            .get(item_id)
            .filter(|product| product.active)
            .map(|product| ResolvedItem {
                name: product.name.clone(),
                unit_price: product.price,
            })
            .ok_or_else(|| CartError::UnknownItem {
                item_id: item_id.to_string(),
            })
    }

    fn resolver_name(&self) -> &'static str {
        "catalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Currency, Product};

    #[tokio::test]
    async fn test_fixed_price() {
        let resolver = FixedPriceResolver::new(Price::new(10.0, Currency::USD));
        let item = resolver.resolve("item7").await.unwrap();
        assert_eq!(item.name, "Item item7");
        assert_eq!(item.unit_price.amount, 1000);
    }

    #[tokio::test]
    async fn test_catalog_lookup() {
        let mut retired = Product::new("old", "Old", Price::new(1.0, Currency::USD));
        retired.active = false;
        let catalog = ProductCatalog::new()
            .with_product(Product::new("item1", "Widget", Price::new(4.5, Currency::USD)))
            .with_product(retired);
        let resolver = CatalogPriceResolver::new(catalog);

        let widget = resolver.resolve("item1").await.unwrap();
        assert_eq!(widget.name, "Widget");
        assert_eq!(widget.unit_price.amount, 450);

        assert!(matches!(
            resolver.resolve("old").await,
            Err(CartError::UnknownItem { .. })
        ));
        assert!(matches!(
            resolver.resolve("missing").await,
            Err(CartError::UnknownItem { .. })
        ));
    }
}
