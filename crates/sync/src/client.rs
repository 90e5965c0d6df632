//! Authenticated remote store client.
//!
//! One client instance serves one collection kind (cart or favorites); both
//! sides of the REST surface share the same envelope shape, so the kind only
//! selects the URL path segment.
//!
//! Cart and favorites endpoints are never cached - the server's response is
//! the canonical state after every mutation.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tiendita_core::{LineItem, ProductId};

use crate::auth::BearerToken;
use crate::config::SyncConfig;
use crate::error::{Operation, StoreError};

/// Which per-user collection this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Cart,
    Favorites,
}

impl CollectionKind {
    /// URL path segment for this collection.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Favorites => "favorites",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// Response envelope: the canonical item list lives under `products`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    products: Vec<WireLineItem>,
}

/// Fixed wire record for one line item.
///
/// Unknown fields are rejected at this boundary; entries with a non-positive
/// identifier are dropped during conversion, and a missing quantity defaults
/// to 1.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireLineItem {
    id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl WireLineItem {
    fn into_line_item(self) -> Option<LineItem> {
        let id = ProductId::try_from(self.id).ok()?;
        let mut item = LineItem::new(id, self.name.unwrap_or_default(), self.quantity.unwrap_or(1));
        item.price = self.price;
        item.image = self.image;
        Some(item)
    }
}

impl From<&LineItem> for WireLineItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: i64::from(item.id.get()),
            quantity: Some(item.quantity),
            name: Some(item.name.clone()),
            price: item.price,
            image: item.image.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AddBody {
    product: WireLineItem,
}

#[derive(Debug, Serialize)]
struct RemoveBody {
    product_id: u32,
}

// =============================================================================
// StoreClient
// =============================================================================

/// Client for one per-user collection on the store REST API.
///
/// Every method takes the bearer token explicitly, so the `Authorization`
/// header is re-derived on each call and never survives an identity change.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: String,
    kind: CollectionKind,
}

impl StoreClient {
    /// Create a client for one collection kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &SyncConfig, kind: CollectionKind) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let base_url = config.api_base_url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url,
                kind,
            }),
        })
    }

    /// The collection kind this client serves.
    #[must_use]
    pub fn kind(&self) -> CollectionKind {
        self.inner.kind
    }

    fn endpoint(&self, suffix: &str) -> String {
        let base = &self.inner.base_url;
        let path = self.inner.kind.path();
        if suffix.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{path}/{suffix}")
        }
    }

    /// Check the status and decode the canonical item list from the envelope.
    async fn read_envelope(
        response: reqwest::Response,
        operation: Operation,
    ) -> Result<Vec<LineItem>, StoreError> {
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                %operation,
                %status,
                body = %body.chars().take(200).collect::<String>(),
                "store API returned non-success status"
            );
            return Err(StoreError::Status { operation, status });
        }

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|source| StoreError::Decode { operation, source })?;

        Ok(envelope
            .products
            .into_iter()
            .filter_map(WireLineItem::into_line_item)
            .collect())
    }

    /// Fetch the current collection.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable envelope.
    #[instrument(skip(self, token), fields(kind = %self.inner.kind))]
    pub async fn fetch_all(&self, token: &BearerToken) -> Result<Vec<LineItem>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(""))
            .bearer_auth(token.expose())
            .send()
            .await?;

        Self::read_envelope(response, Operation::Fetch).await
    }

    /// Add an item, or merge it into an existing line; returns the canonical
    /// post-mutation collection.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable envelope.
    #[instrument(skip(self, token, item), fields(kind = %self.inner.kind, product_id = %item.id))]
    pub async fn add_or_update(
        &self,
        token: &BearerToken,
        item: &LineItem,
    ) -> Result<Vec<LineItem>, StoreError> {
        let body = AddBody {
            product: WireLineItem::from(item),
        };

        let response = self
            .inner
            .client
            .post(self.endpoint("add"))
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;

        Self::read_envelope(response, Operation::Add).await
    }

    /// Replace the quantity for one identifier; returns the canonical
    /// collection.
    ///
    /// The wire operation is the same merge endpoint as
    /// [`add_or_update`](Self::add_or_update), sent with only the identifier
    /// and the new quantity.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable envelope.
    #[instrument(skip(self, token), fields(kind = %self.inner.kind, product_id = %id))]
    pub async fn update_quantity(
        &self,
        token: &BearerToken,
        id: ProductId,
        quantity: u32,
    ) -> Result<Vec<LineItem>, StoreError> {
        let body = AddBody {
            product: WireLineItem {
                id: i64::from(id.get()),
                quantity: Some(quantity),
                name: None,
                price: None,
                image: None,
            },
        };

        let response = self
            .inner
            .client
            .post(self.endpoint("add"))
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;

        Self::read_envelope(response, Operation::UpdateQuantity).await
    }

    /// Remove one identifier; returns the canonical collection with that
    /// identifier absent.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable envelope.
    #[instrument(skip(self, token), fields(kind = %self.inner.kind, product_id = %id))]
    pub async fn remove_one(
        &self,
        token: &BearerToken,
        id: ProductId,
    ) -> Result<Vec<LineItem>, StoreError> {
        let body = RemoveBody {
            product_id: id.get(),
        };

        let response = self
            .inner
            .client
            .put(self.endpoint("remove"))
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;

        Self::read_envelope(response, Operation::Remove).await
    }

    /// Empty the collection. The server is not required to echo a collection
    /// back; only the status is checked.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    #[instrument(skip(self, token), fields(kind = %self.inner.kind))]
    pub async fn clear_all(&self, token: &BearerToken) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .put(self.endpoint("clear"))
            .bearer_auth(token.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let operation = Operation::Clear;
            tracing::error!(%operation, %status, "store API returned non-success status");
            return Err(StoreError::Status { operation, status });
        }

        Ok(())
    }
}
