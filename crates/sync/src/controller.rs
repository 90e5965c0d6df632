//! Optimistic sync controller.
//!
//! Owns the local collection state. Mutations apply locally first, then
//! settle against the server's canonical response:
//!
//! ```text
//! UI action -> optimistic local mutation + syncing marker
//!           -> store client request
//!           -> canonical list installed (success)
//!              or snapshot restored (failure)
//!           -> marker cleared
//! ```
//!
//! Mutations are fire-and-forget with respect to each other - nothing queues
//! or serializes overlapping calls. A generation counter guards against
//! cross-identity application: every request captures the generation at
//! dispatch, and a settlement only applies while the captured generation is
//! still current. Identity changes bump the generation, so a response that
//! arrives after a sign-out is discarded rather than applied to the next
//! user's collection.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::instrument;

use tiendita_core::{LineItem, ProductId, collection_total, normalize};

use crate::auth::AuthSession;
use crate::client::StoreClient;
use crate::error::{Operation, StoreError, SyncError};
use crate::events::CollectionEvent;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Collection lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No data held; initial state and the state after sign-out.
    Empty,
    /// Initial fetch in flight.
    Loading,
    /// Canonical data held.
    Ready,
}

/// Why an operation settled without touching the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No bearer token present; local state untouched, no request issued.
    Unauthenticated,
    /// Quantity was not a positive integer.
    InvalidQuantity,
}

/// How an operation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server's canonical state was installed locally.
    Applied,
    /// The operation was a no-op; no request was issued.
    Skipped(SkipReason),
    /// The response arrived after an identity change and was discarded.
    Discarded,
}

struct CollectionState {
    phase: Phase,
    items: Vec<LineItem>,
    syncing: HashSet<ProductId>,
    generation: u64,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            phase: Phase::Empty,
            items: Vec::new(),
            syncing: HashSet::new(),
            generation: 0,
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Empty;
        self.items.clear();
        self.syncing.clear();
    }
}

/// Optimistic sync controller for one collection.
///
/// Cheaply cloneable; all clones share the same state. Construct one per
/// collection kind at the composition root and pass it by reference - there
/// is no ambient singleton.
#[derive(Clone)]
pub struct SyncController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    client: StoreClient,
    auth: AuthSession,
    state: Mutex<CollectionState>,
    events: broadcast::Sender<CollectionEvent>,
}

impl ControllerInner {
    // The lock is only held for short synchronous sections, never across an
    // await point.
    fn state(&self) -> MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears syncing markers when the operation settles, by any path.
///
/// Carries the generation captured at dispatch: a guard from a previous
/// identity must not erase markers the current identity set for the same
/// identifiers.
struct MarkerGuard {
    inner: Arc<ControllerInner>,
    ids: Vec<ProductId>,
    generation: u64,
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        let mut state = self.inner.state();
        if state.generation != self.generation {
            return;
        }
        for id in &self.ids {
            state.syncing.remove(id);
        }
    }
}

impl SyncController {
    /// Create a controller on top of a store client and the auth handle.
    #[must_use]
    pub fn new(client: StoreClient, auth: AuthSession) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(ControllerInner {
                client,
                auth,
                state: Mutex::new(CollectionState::new()),
                events,
            }),
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Snapshot of the local collection (always normalized).
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.inner.state().items.clone()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state().phase
    }

    /// Whether a mutation for this identifier is in flight.
    #[must_use]
    pub fn is_syncing(&self, id: ProductId) -> bool {
        self.inner.state().syncing.contains(&id)
    }

    /// Identifiers with a mutation currently in flight.
    #[must_use]
    pub fn syncing_ids(&self) -> HashSet<ProductId> {
        self.inner.state().syncing.clone()
    }

    /// Number of lines in the local collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state().items.len()
    }

    /// Whether the local collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state().items.is_empty()
    }

    /// Derived cart total: sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        collection_total(&self.inner.state().items)
    }

    /// Subscribe to successful-mutation events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reset to `Empty` and invalidate all in-flight requests.
    ///
    /// Call this when the authenticated identity transitions; responses
    /// dispatched under the previous identity settle as
    /// [`SyncOutcome::Discarded`].
    pub fn handle_identity_change(&self) {
        let mut state = self.inner.state();
        state.generation += 1;
        state.reset();
    }

    /// Load the collection from the server.
    ///
    /// On failure the local collection resets to empty - a load failure is
    /// treated as "collection unknown", and empty is the chosen stand-in.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if the request fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<SyncOutcome, SyncError> {
        let Some(identity) = self.inner.auth.identity() else {
            self.inner.state().reset();
            return Ok(SyncOutcome::Skipped(SkipReason::Unauthenticated));
        };

        let generation = {
            let mut state = self.inner.state();
            state.phase = Phase::Loading;
            state.generation
        };

        let result = self.inner.client.fetch_all(identity.token()).await;

        let mut state = self.inner.state();
        if state.generation != generation {
            return Ok(SyncOutcome::Discarded);
        }

        match result {
            Ok(items) => {
                state.items = normalize(items);
                state.phase = Phase::Ready;
                Ok(SyncOutcome::Applied)
            }
            Err(source) => {
                state.reset();
                tracing::error!(error = %source, "failed to load collection");
                Err(SyncError::Fetch(source))
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item, merging quantities with any existing line for the same
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Request`] if the request fails; the optimistic
    /// update is rolled back first.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub async fn add(&self, item: LineItem) -> Result<SyncOutcome, SyncError> {
        let Some(identity) = self.inner.auth.identity() else {
            return Ok(SyncOutcome::Skipped(SkipReason::Unauthenticated));
        };

        let id = item.id;
        let (generation, snapshot) = self.begin_mutation(&[id], |items| {
            let mut merged = std::mem::take(items);
            merged.push(item.clone());
            *items = normalize(merged);
        });
        let _guard = self.marker_guard(vec![id], generation);

        let result = self
            .inner
            .client
            .add_or_update(identity.token(), &item)
            .await;

        self.settle(
            Operation::Add,
            generation,
            snapshot,
            result.map(Some),
            CollectionEvent::ItemAdded { id },
        )
    }

    /// Replace the quantity for one identifier.
    ///
    /// A zero quantity is rejected as a no-op: no state change and no request
    /// (negative quantities are unrepresentable).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Request`] if the request fails; the optimistic
    /// update is rolled back first.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_quantity(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<SyncOutcome, SyncError> {
        if quantity == 0 {
            return Ok(SyncOutcome::Skipped(SkipReason::InvalidQuantity));
        }

        let Some(identity) = self.inner.auth.identity() else {
            return Ok(SyncOutcome::Skipped(SkipReason::Unauthenticated));
        };

        let (generation, snapshot) = self.begin_mutation(&[id], |items| {
            if let Some(line) = items.iter_mut().find(|line| line.id == id) {
                line.quantity = quantity;
            }
        });
        let _guard = self.marker_guard(vec![id], generation);

        let result = self
            .inner
            .client
            .update_quantity(identity.token(), id, quantity)
            .await;

        self.settle(
            Operation::UpdateQuantity,
            generation,
            snapshot,
            result.map(Some),
            CollectionEvent::QuantityChanged { id, quantity },
        )
    }

    /// Remove one identifier.
    ///
    /// The request is issued even when the identifier is not present locally;
    /// the server's canonical response settles either way.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Request`] if the request fails; the optimistic
    /// update is rolled back first.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove(&self, id: ProductId) -> Result<SyncOutcome, SyncError> {
        let Some(identity) = self.inner.auth.identity() else {
            return Ok(SyncOutcome::Skipped(SkipReason::Unauthenticated));
        };

        let (generation, snapshot) = self.begin_mutation(&[id], |items| {
            items.retain(|line| line.id != id);
        });
        let _guard = self.marker_guard(vec![id], generation);

        let result = self.inner.client.remove_one(identity.token(), id).await;

        self.settle(
            Operation::Remove,
            generation,
            snapshot,
            result.map(Some),
            CollectionEvent::ItemRemoved { id },
        )
    }

    /// Empty the collection.
    ///
    /// The local collection is emptied immediately, before the remote
    /// response resolves, and every current identifier is marked as syncing.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Request`] if the request fails; the optimistic
    /// update is rolled back first.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<SyncOutcome, SyncError> {
        let Some(identity) = self.inner.auth.identity() else {
            return Ok(SyncOutcome::Skipped(SkipReason::Unauthenticated));
        };

        let ids: Vec<ProductId> = {
            let state = self.inner.state();
            state.items.iter().map(|line| line.id).collect()
        };

        let (generation, snapshot) = self.begin_mutation(&ids, Vec::clear);
        let _guard = self.marker_guard(ids, generation);

        let result = self.inner.client.clear_all(identity.token()).await;

        // No envelope required on clear; success keeps the optimistic empty.
        self.settle(
            Operation::Clear,
            generation,
            snapshot,
            result.map(|()| None),
            CollectionEvent::Cleared,
        )
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Snapshot the items, apply the optimistic mutation, and mark the given
    /// identifiers as syncing. Returns the generation captured at dispatch and
    /// the pre-mutation snapshot.
    fn begin_mutation(
        &self,
        ids: &[ProductId],
        mutate: impl FnOnce(&mut Vec<LineItem>),
    ) -> (u64, Vec<LineItem>) {
        let mut state = self.inner.state();
        let snapshot = state.items.clone();
        mutate(&mut state.items);
        state.syncing.extend(ids.iter().copied());
        (state.generation, snapshot)
    }

    fn marker_guard(&self, ids: Vec<ProductId>, generation: u64) -> MarkerGuard {
        MarkerGuard {
            inner: Arc::clone(&self.inner),
            ids,
            generation,
        }
    }

    /// Apply a settled mutation: install the canonical list on success (when
    /// the server echoes one), or restore the pre-mutation snapshot on
    /// failure. Outcomes for a stale generation are discarded wholesale.
    fn settle(
        &self,
        operation: Operation,
        generation: u64,
        snapshot: Vec<LineItem>,
        result: Result<Option<Vec<LineItem>>, StoreError>,
        event: CollectionEvent,
    ) -> Result<SyncOutcome, SyncError> {
        let mut state = self.inner.state();
        if state.generation != generation {
            tracing::debug!(%operation, "discarding settlement from a previous identity");
            return Ok(SyncOutcome::Discarded);
        }

        match result {
            Ok(canonical) => {
                if let Some(items) = canonical {
                    state.items = normalize(items);
                }
                state.phase = Phase::Ready;
                drop(state);
                let _ = self.inner.events.send(event);
                Ok(SyncOutcome::Applied)
            }
            Err(source) => {
                state.items = snapshot;
                tracing::warn!(
                    %operation,
                    error = %source,
                    "mutation failed, optimistic update rolled back"
                );
                Err(SyncError::Request { operation, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use tiendita_core::UserId;

    use super::*;
    use crate::auth::BearerToken;
    use crate::client::CollectionKind;
    use crate::config::SyncConfig;

    // Points at a closed port; unauthenticated paths must not reach it.
    fn offline_controller() -> (SyncController, AuthSession) {
        let config = SyncConfig::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(1),
        );
        let client = StoreClient::new(&config, CollectionKind::Cart).unwrap();
        let auth = AuthSession::new();
        (SyncController::new(client, auth.clone()), auth)
    }

    fn item(id: u32, quantity: u32) -> LineItem {
        LineItem::new(ProductId::new(id).unwrap(), format!("product-{id}"), quantity)
    }

    #[tokio::test]
    async fn unauthenticated_add_is_a_local_noop() {
        let (controller, _auth) = offline_controller();

        let outcome = controller.add(item(1, 1)).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::Unauthenticated));
        assert!(controller.is_empty());
        assert!(controller.syncing_ids().is_empty());
        assert_eq!(controller.phase(), Phase::Empty);
    }

    #[tokio::test]
    async fn zero_quantity_update_is_rejected_before_auth_check() {
        let (controller, auth) = offline_controller();
        auth.sign_in(UserId::new(1), BearerToken::new("jwt").unwrap());

        let outcome = controller
            .update_quantity(ProductId::new(1).unwrap(), 0)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::InvalidQuantity));
        assert!(controller.is_empty());
    }

    #[tokio::test]
    async fn unauthenticated_refresh_resets_to_empty() {
        let (controller, _auth) = offline_controller();

        let outcome = controller.refresh().await.unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::Unauthenticated));
        assert_eq!(controller.phase(), Phase::Empty);
    }

    #[tokio::test]
    async fn identity_change_resets_state() {
        let (controller, _auth) = offline_controller();

        controller.handle_identity_change();

        assert_eq!(controller.phase(), Phase::Empty);
        assert!(controller.is_empty());
        assert!(controller.syncing_ids().is_empty());
    }

    #[test]
    fn total_over_empty_collection_is_zero() {
        let (controller, _auth) = offline_controller();
        assert_eq!(controller.total(), Decimal::ZERO);
    }
}
