//! Handle to the external authentication collaborator.
//!
//! Token issuance lives elsewhere; this module only holds the current
//! `(user id, bearer token)` pair and publishes a change notification so the
//! composition root can reset collections when the identity transitions.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;

use tiendita_core::UserId;

/// A non-empty bearer token.
///
/// Wraps [`SecretString`] so the token never appears in `Debug` output.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Create a token, returning `None` for the empty string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(SecretString::from(token)))
        }
    }

    /// Expose the raw token for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// The current authenticated identity.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Owner of the server-side collections.
    pub user_id: UserId,
    token: BearerToken,
}

impl Identity {
    /// Create an identity from a user ID and token.
    #[must_use]
    pub const fn new(user_id: UserId, token: BearerToken) -> Self {
        Self { user_id, token }
    }

    /// The bearer token for this identity.
    #[must_use]
    pub const fn token(&self) -> &BearerToken {
        &self.token
    }
}

/// Shared handle to the current identity.
///
/// Cheaply cloneable; all clones observe the same identity. Readers re-derive
/// the token on every request via [`AuthSession::identity`] - nothing caches a
/// token across identity changes.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthSessionInner>,
}

struct AuthSessionInner {
    identity: RwLock<Option<Identity>>,
    // Epoch counter published on every transition; receivers only care that
    // the value changed.
    changes: watch::Sender<u64>,
}

impl AuthSession {
    /// Create a session with no identity.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(AuthSessionInner {
                identity: RwLock::new(None),
                changes,
            }),
        }
    }

    /// Install a new identity, notifying subscribers.
    pub fn sign_in(&self, user_id: UserId, token: BearerToken) {
        *self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Identity::new(user_id, token));
        self.notify();
    }

    /// Drop the current identity, notifying subscribers.
    pub fn sign_out(&self) {
        *self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.notify();
    }

    /// Snapshot of the current identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to identity transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|epoch| *epoch += 1);
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}
