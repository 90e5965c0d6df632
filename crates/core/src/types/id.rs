//! Newtype IDs for type-safe entity references.
//!
//! `ProductId` deliberately wraps a [`NonZeroU32`]: the product identifier is
//! the merge key for line collections, and a zero identifier would be an
//! accidental sentinel that silently collides entries. Making zero
//! unrepresentable moves that check to the wire boundary, where malformed
//! entries are dropped during conversion.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error constructing a [`ProductId`] from a raw value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductIdError {
    /// The raw value was zero or negative.
    #[error("product id must be a positive integer, got {0}")]
    NotPositive(i64),
}

/// Type-safe product identifier.
///
/// Guaranteed non-zero; construct via [`ProductId::new`] or `TryFrom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(NonZeroU32);

impl ProductId {
    /// Create a product ID from a raw value, returning `None` for zero.
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Get the underlying u32 value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NonZeroU32> for ProductId {
    fn from(id: NonZeroU32) -> Self {
        Self(id)
    }
}

impl TryFrom<u32> for ProductId {
    type Error = ProductIdError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::new(id).ok_or(ProductIdError::NotPositive(i64::from(id)))
    }
}

impl TryFrom<i64> for ProductId {
    type Error = ProductIdError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        u32::try_from(id)
            .ok()
            .and_then(Self::new)
            .ok_or(ProductIdError::NotPositive(id))
    }
}

/// Type-safe user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// Create a new ID from an i32 value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the underlying i32 value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_rejects_zero() {
        assert!(ProductId::new(0).is_none());
        assert_eq!(
            ProductId::try_from(0u32),
            Err(ProductIdError::NotPositive(0))
        );
    }

    #[test]
    fn product_id_rejects_negative_i64() {
        assert_eq!(
            ProductId::try_from(-5i64),
            Err(ProductIdError::NotPositive(-5))
        );
    }

    #[test]
    fn product_id_roundtrips_serde_as_plain_number() {
        let id = ProductId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn product_id_serde_rejects_zero() {
        assert!(serde_json::from_str::<ProductId>("0").is_err());
    }
}
