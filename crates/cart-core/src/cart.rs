//! # Cart Types
//!
//! Cart entries as stored, line items as priced at checkout, and the
//! add-to-cart operation.
//!
//! Each distinct item lives in its own hash at `cart:{item_id}` with a
//! single integer field `quantity`. Item ids must not contain `:`; the item
//! id of a key is everything after the first separator.

use crate::error::{CartError, CartResult};
use crate::product::Price;
use crate::store::BoxedCartStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Key namespace for cart entries
pub const CART_NAMESPACE: &str = "cart";

/// Separator between namespace and item id
pub const KEY_SEPARATOR: char = ':';

/// Hash field holding the item quantity
pub const QUANTITY_FIELD: &str = "quantity";

/// Prefix shared by every cart key (`cart:`)
pub fn cart_prefix() -> String {
    format!("{}{}", CART_NAMESPACE, KEY_SEPARATOR)
}

/// Store key for an item
pub fn cart_key(item_id: &str) -> String {
    format!("{}{}{}", CART_NAMESPACE, KEY_SEPARATOR, item_id)
}

/// Item id encoded in a store key, if the key is in the cart namespace
pub fn item_id_from_key(key: &str) -> Option<&str> {
    key.split_once(KEY_SEPARATOR)
        .filter(|(namespace, _)| *namespace == CART_NAMESPACE)
        .map(|(_, item_id)| item_id)
}

/// Reject ids the key scheme cannot round-trip
pub fn validate_item_id(item_id: &str) -> CartResult<()> {
    if item_id.is_empty() || item_id.contains(KEY_SEPARATOR) {
        return Err(CartError::InvalidItemId {
            item_id: item_id.to_string(),
        });
    }
    Ok(())
}

/// One stored cart entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item_id: String,
    pub quantity: i64,
}

impl CartEntry {
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }

    /// Store key of this entry
    pub fn key(&self) -> String {
        cart_key(&self.item_id)
    }
}

/// A priced line in a checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item ID
    pub item_id: String,

    /// Display name
    pub name: String,

    /// Unit price
    pub unit_price: Price,

    /// Quantity
    pub quantity: i64,
}

impl LineItem {
    /// Calculate the total price for this line item
    pub fn total(&self) -> CartResult<Price> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// Result of aggregating the cart
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    /// Entries as read from the store; this is what a checkout settles
    pub entries: Vec<CartEntry>,

    /// Priced lines, ordered by item id
    pub line_items: Vec<LineItem>,

    /// Sum of all line totals, in minor units
    pub total: Price,
}

impl CartSummary {
    /// Check if the cart had no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of units across all lines
    pub fn item_count(&self) -> i64 {
        self.line_items.iter().map(|item| item.quantity).sum()
    }
}

/// Cart mutations
#[derive(Clone)]
pub struct CartService {
    store: BoxedCartStore,
}

impl CartService {
    pub fn new(store: BoxedCartStore) -> Self {
        Self { store }
    }

    /// Add `quantity` units of an item; returns the new stored quantity.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, item_id: &str, quantity: i64) -> CartResult<i64> {
        validate_item_id(item_id)?;
        if quantity < 1 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let total = self
            .store
            .increment(&cart_key(item_id), QUANTITY_FIELD, quantity)
            .await?;

        debug!(total, "Incremented cart entry");
        Ok(total)
    }
}
