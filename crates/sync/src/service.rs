//! Composition root for the synchronization service.
//!
//! Owns one controller per collection kind and wires the auth change
//! notification into both. Pass [`SyncService`] (or individual controllers)
//! by reference to whichever component needs them - there is no ambient
//! global state.

use crate::auth::AuthSession;
use crate::client::{CollectionKind, StoreClient};
use crate::config::SyncConfig;
use crate::controller::SyncController;
use crate::error::StoreError;

/// Cart and favorites controllers over a shared identity.
///
/// Cheaply cloneable; all clones share the same controllers.
#[derive(Clone)]
pub struct SyncService {
    auth: AuthSession,
    cart: SyncController,
    favorites: SyncController,
}

impl SyncService {
    /// Build the service from configuration and the auth handle.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn new(config: &SyncConfig, auth: AuthSession) -> Result<Self, StoreError> {
        let cart = SyncController::new(
            StoreClient::new(config, CollectionKind::Cart)?,
            auth.clone(),
        );
        let favorites = SyncController::new(
            StoreClient::new(config, CollectionKind::Favorites)?,
            auth.clone(),
        );

        Ok(Self {
            auth,
            cart,
            favorites,
        })
    }

    /// The cart controller.
    #[must_use]
    pub const fn cart(&self) -> &SyncController {
        &self.cart
    }

    /// The favorites controller.
    #[must_use]
    pub const fn favorites(&self) -> &SyncController {
        &self.favorites
    }

    /// The auth handle this service observes.
    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Drive identity transitions: on every change both collections reset,
    /// and when a new identity is present they reload from the server.
    ///
    /// Run this on a task for the lifetime of the service:
    ///
    /// ```rust,ignore
    /// tokio::spawn({
    ///     let service = service.clone();
    ///     async move { service.watch_identity().await }
    /// });
    /// ```
    pub async fn watch_identity(&self) {
        let mut changes = self.auth.subscribe();

        while changes.changed().await.is_ok() {
            self.cart.handle_identity_change();
            self.favorites.handle_identity_change();

            if self.auth.identity().is_some() {
                // Load failures are already logged and leave the collection
                // empty; the next explicit refresh can retry.
                if let Err(e) = self.cart.refresh().await {
                    tracing::debug!(error = %e, "cart reload after sign-in failed");
                }
                if let Err(e) = self.favorites.refresh().await {
                    tracing::debug!(error = %e, "favorites reload after sign-in failed");
                }
            }
        }
    }
}
