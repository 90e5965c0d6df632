//! Tiendita Sync - Cart and favorites synchronization service.
//!
//! Keeps a per-user collection (cart or favorites) in step with the remote
//! store: mutations apply optimistically to local state, the server round-trip
//! runs in the background, and the server's canonical list replaces local
//! state when the response arrives.
//!
//! # Architecture
//!
//! - [`client::StoreClient`] - authenticated REST calls for one collection
//! - [`controller::SyncController`] - local state, optimistic mutations,
//!   in-flight markers, generation-based reconciliation
//! - [`auth::AuthSession`] - handle to the external auth collaborator
//! - [`service::SyncService`] - composition root owning one controller per
//!   collection kind
//!
//! # Example
//!
//! ```rust,ignore
//! use tiendita_sync::{AuthSession, BearerToken, SyncConfig, SyncService};
//!
//! let config = SyncConfig::from_env()?;
//! let auth = AuthSession::new();
//! let service = SyncService::new(&config, auth.clone())?;
//!
//! auth.sign_in(UserId::new(1), BearerToken::new("jwt...").unwrap());
//! service.cart().refresh().await?;
//! service.cart().add(item).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod service;

pub use auth::{AuthSession, BearerToken, Identity};
pub use client::{CollectionKind, StoreClient};
pub use config::{ConfigError, SyncConfig};
pub use controller::{Phase, SkipReason, SyncController, SyncOutcome};
pub use error::{Operation, StoreError, SyncError};
pub use events::CollectionEvent;
pub use service::SyncService;
