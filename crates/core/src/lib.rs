//! Tiendita Core - Shared types library.
//!
//! This crate provides the common types used across Tiendita components:
//! - `sync` - Cart and favorites synchronization service
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and the line item record
//! - [`normalize`] - Line collection normalization (dedup and quantity merge)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod normalize;
pub mod types;

pub use normalize::normalize;
pub use types::*;
