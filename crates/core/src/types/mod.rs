//! Core types for Tiendita.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item;

pub use id::{ProductId, ProductIdError, UserId};
pub use item::{LineItem, collection_total};
