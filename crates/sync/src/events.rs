//! Notification side-channel for successful mutations.
//!
//! Subscribing is optional; the controller drops events when nobody listens.
//! A UI layer can map these to toasts or badge updates.

use tiendita_core::ProductId;

/// Emitted by the controller after a mutation settles successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    /// An item was added or merged into the collection.
    ItemAdded { id: ProductId },
    /// An item's quantity was replaced.
    QuantityChanged { id: ProductId, quantity: u32 },
    /// An item was removed.
    ItemRemoved { id: ProductId },
    /// The collection was emptied.
    Cleared,
}
