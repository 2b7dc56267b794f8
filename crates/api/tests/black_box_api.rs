use std::sync::Arc;

use eventdesk_api::app::{build_app, AppServices};
use eventdesk_ids::{FixedClock, IdAllocator, RecoveryScanner};
use eventdesk_infra::{CatalogStore, InMemoryCatalogStore};
use eventdesk_inventory::{AvailabilityEngine, Reservation};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn services_for_2025(store: Arc<InMemoryCatalogStore>) -> (Arc<IdAllocator>, AppServices) {
    let ids = Arc::new(IdAllocator::with_clock(Arc::new(FixedClock(2025))));
    let services = AppServices::new(ids.clone(), store, AvailabilityEngine::default());
    (ids, services)
}

async fn post_json(client: &reqwest::Client, url: String, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn availability_follows_usage_mutations() {
    let (_ids, services) = services_for_2025(Arc::new(InMemoryCatalogStore::new()));
    let srv = TestServer::spawn(services).await;
    let client = reqwest::Client::new();

    let (status, item) = post_json(&client, srv.url("/items"), json!({"name": "Chair", "total_stock": 10})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["id"], "ITM00001-2025");
    assert_eq!(item["available_stock"], 10);

    let (_, service) = post_json(&client, srv.url("/services"), json!({"name": "Wedding"})).await;
    assert_eq!(service["id"], "DSV00001-2025");

    for n in 1..=3 {
        let (status, r) = post_json(
            &client,
            srv.url("/reservations"),
            json!({"service_id": "DSV00001-2025"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(r["id"], format!("REA{n:05}-2025"));
        assert_eq!(r["status"], "pending");
    }

    let (status, change) = post_json(
        &client,
        srv.url("/services/DSV00001-2025/items"),
        json!({"item_id": "ITM00001-2025", "quantity": 2.0}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(change["usage"]["id"], "LIT00001-2025");
    assert_eq!(change["availability"]["available_stock"], 4);
    assert_eq!(change["availability"]["changed"], true);

    let detail: serde_json::Value = client
        .get(srv.url("/items/ITM00001-2025"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["available_stock"], 4);
    assert_eq!(detail["in_use"], 6.0);
    assert_eq!(detail["services"][0]["occurrences"], 3);

    // Three more reservations oversell the item once something recomputes it.
    for _ in 0..3 {
        post_json(&client, srv.url("/reservations"), json!({"service_id": "DSV00001-2025"})).await;
    }
    let listing: serde_json::Value = client.get(srv.url("/items")).send().await.unwrap().json().await.unwrap();
    assert_eq!(listing["items"][0]["available_stock"], -2);

    let res = client
        .put(srv.url("/usages/LIT00001-2025"))
        .json(&json!({"quantity": 1.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["availability"]["available_stock"], 4);

    let res = client.delete(srv.url("/usages/LIT00001-2025")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["availability"]["available_stock"], 10);
}

#[tokio::test]
async fn reservation_status_change_does_not_touch_cached_availability() {
    let (_ids, services) = services_for_2025(Arc::new(InMemoryCatalogStore::new()));
    let srv = TestServer::spawn(services).await;
    let client = reqwest::Client::new();

    post_json(&client, srv.url("/items"), json!({"name": "Table", "total_stock": 5})).await;
    post_json(&client, srv.url("/services"), json!({"name": "Gala"})).await;
    post_json(&client, srv.url("/reservations"), json!({"service_id": "DSV00001-2025"})).await;
    post_json(
        &client,
        srv.url("/services/DSV00001-2025/items"),
        json!({"item_id": "ITM00001-2025", "quantity": 1.0}),
    )
    .await;

    let res = client
        .put(srv.url("/reservations/REA00001-2025/status"))
        .json(&json!({"status": "cancelled"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let detail: serde_json::Value = client
        .get(srv.url("/items/ITM00001-2025"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["available_stock"], 4);

    let res = client
        .put(srv.url("/reservations/REA00001-2025/status"))
        .json(&json!({"status": "confirmed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invariant_violation");
}

#[tokio::test]
async fn ids_continue_after_recovered_maximum() {
    let store = Arc::new(InMemoryCatalogStore::new());
    for n in [3, 7] {
        store
            .insert_reservation(Reservation::new(
                eventdesk_core::EntityId::format("REA", n, 2025),
                None,
                None,
                chrono::Utc::now(),
            ))
            .await
            .unwrap();
    }

    let (ids, services) = services_for_2025(store.clone());
    RecoveryScanner::new(ids, store).initialize_counters().await.unwrap();
    let srv = TestServer::spawn(services).await;
    let client = reqwest::Client::new();

    let (status, r) = post_json(&client, srv.url("/reservations"), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(r["id"], "REA00008-2025");

    let (status, client_row) = post_json(&client, srv.url("/clients"), json!({"name": "Ana"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(client_row["id"], "CLE00001-2025");

    let (status, payment) = post_json(
        &client,
        srv.url("/payments"),
        json!({"reservation_id": "REA00008-2025", "amount": 15000, "payment_type": "card"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["id"], "PGO00001-2025");
}

#[tokio::test]
async fn errors_are_json() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/items/not-an-id")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let res = client.get(srv.url("/items/ITM00099-2025")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let (status, body) = post_json(&client, srv.url("/items"), json!({"name": "", "total_stock": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = post_json(
        &client,
        srv.url("/services/DSV00001-2025/items"),
        json!({"item_id": "ITM00001-2025", "quantity": 1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();

    // Missing required field.
    let (status, body) = post_json(&client, srv.url("/items"), json!({"total_stock": 1})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_body");
    assert!(body["message"].as_str().unwrap().contains("name"));

    // Not JSON at all.
    let res = client
        .post(srv.url("/services"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}
