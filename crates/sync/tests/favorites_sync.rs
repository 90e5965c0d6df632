//! Favorites controller and service wiring tests.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use tiendita_core::{LineItem, ProductId, UserId};
use tiendita_sync::{
    AuthSession, BearerToken, CollectionEvent, Phase, SyncConfig, SyncOutcome, SyncService,
};

fn service_for(server: &MockServer) -> (SyncService, AuthSession) {
    let config = SyncConfig::new(
        Url::parse(&server.base_url()).expect("mock server URL"),
        Duration::from_secs(5),
    );
    let auth = AuthSession::new();
    let service = SyncService::new(&config, auth.clone()).expect("service build");
    (service, auth)
}

fn pid(id: u32) -> ProductId {
    ProductId::new(id).expect("positive id")
}

#[tokio::test]
async fn favorites_use_their_own_path_segment() {
    let server = MockServer::start_async().await;
    let favorites = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/favorites")
                .header("authorization", "Bearer jwt-1");
            then.status(200).json_body(json!({
                "products": [{"id": 4, "quantity": 1, "name": "Scarf"}]
            }));
        })
        .await;
    let cart = server
        .mock_async(|when, then| {
            when.method(GET).path("/cart");
            then.status(200).json_body(json!({"products": []}));
        })
        .await;

    let (service, auth) = service_for(&server);
    auth.sign_in(UserId::new(1), BearerToken::new("jwt-1").expect("token"));

    service.favorites().refresh().await.expect("refresh");

    favorites.assert_async().await;
    assert_eq!(cart.hits_async().await, 0);
    assert_eq!(service.favorites().items().len(), 1);
    assert!(service.cart().is_empty());
}

#[tokio::test]
async fn successful_favorite_add_emits_notification_event() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/favorites/add");
            then.status(200).json_body(json!({
                "products": [{"id": 8, "quantity": 1, "name": "Scarf"}]
            }));
        })
        .await;

    let (service, auth) = service_for(&server);
    auth.sign_in(UserId::new(1), BearerToken::new("jwt-1").expect("token"));
    let mut events = service.favorites().subscribe();

    let item = LineItem::new(pid(8), "Scarf", 1);
    service.favorites().add(item).await.expect("add");

    assert_eq!(
        events.try_recv().ok(),
        Some(CollectionEvent::ItemAdded { id: pid(8) })
    );
}

#[tokio::test]
async fn failed_favorite_add_emits_no_event() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/favorites/add");
            then.status(500);
        })
        .await;

    let (service, auth) = service_for(&server);
    auth.sign_in(UserId::new(1), BearerToken::new("jwt-1").expect("token"));
    let mut events = service.favorites().subscribe();

    let item = LineItem::new(pid(8), "Scarf", 1);
    let _ = service.favorites().add(item).await;

    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn identity_watcher_reloads_on_sign_in_and_resets_on_sign_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cart");
            then.status(200).json_body(json!({
                "products": [{"id": 1, "quantity": 2, "name": "Shirt"}]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/favorites");
            then.status(200).json_body(json!({
                "products": [{"id": 2, "quantity": 1, "name": "Hat"}]
            }));
        })
        .await;

    let (service, auth) = service_for(&server);
    let watcher = tokio::spawn({
        let service = service.clone();
        async move { service.watch_identity().await }
    });

    // Let the watcher subscribe before the first transition.
    tokio::time::sleep(Duration::from_millis(50)).await;

    auth.sign_in(UserId::new(1), BearerToken::new("jwt-1").expect("token"));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(service.cart().items().len(), 1);
    assert_eq!(service.favorites().items().len(), 1);
    assert_eq!(service.cart().phase(), Phase::Ready);

    auth.sign_out();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(service.cart().is_empty());
    assert!(service.favorites().is_empty());
    assert_eq!(service.cart().phase(), Phase::Empty);

    watcher.abort();
}

#[tokio::test]
async fn collections_are_scoped_per_controller() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/cart/add");
            then.status(200).json_body(json!({
                "products": [{"id": 1, "quantity": 1, "name": "Shirt"}]
            }));
        })
        .await;

    let (service, auth) = service_for(&server);
    auth.sign_in(UserId::new(1), BearerToken::new("jwt-1").expect("token"));

    let item = LineItem::new(pid(1), "Shirt", 1);
    let outcome = service.cart().add(item).await.expect("add");

    assert_eq!(outcome, SyncOutcome::Applied);
    assert_eq!(service.cart().items().len(), 1);
    assert!(service.favorites().is_empty());
}
