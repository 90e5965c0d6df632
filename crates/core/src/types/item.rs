//! The line item record and derived totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One product reference plus quantity within a collection.
///
/// The display fields (`name`, `price`, `image`) are snapshotted at add time
/// and are not kept live-synced with the product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier; unique within a collection.
    pub id: ProductId,
    /// Quantity, always >= 1.
    pub quantity: u32,
    /// Product name snapshot.
    pub name: String,
    /// Unit price snapshot; `None` when the price was unknown at add time.
    pub price: Option<Decimal>,
    /// Image reference snapshot.
    pub image: Option<String>,
}

impl LineItem {
    /// Create a line item. A zero quantity is floored to 1.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id,
            quantity: quantity.max(1),
            name: name.into(),
            price: None,
            image: None,
        }
    }

    /// Set the unit price snapshot.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the image reference snapshot.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Price times quantity for this line; a missing price contributes zero.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.unwrap_or_default() * Decimal::from(self.quantity)
    }
}

/// Sum of `price × quantity` over all items.
#[must_use]
pub fn collection_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}
