//! Admin API tests driven through the router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use caching_proxy::admin::{setup_admin_router, AdminState};
use caching_proxy::cache::{CacheEntry, CacheKey};
use caching_proxy::net::ConnectionTracker;
use caching_proxy::CacheStore;
use serde_json::Value;
use tower::ServiceExt;

const KEY: &str = "test-admin-key";

fn state() -> AdminState {
    let store = CacheStore::new();
    store.put(
        CacheKey::new("http", "example.test", 80, "/a.txt"),
        CacheEntry::new(
            &b"HTTP/1.1 200 OK\r\n\r\nhello"[..],
            Some("Wed, 01 Jan 2020 00:00:00 GMT".to_string()),
        ),
    );
    AdminState::new(store, ConnectionTracker::new(), KEY)
}

fn get(path: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_or_wrong_key_is_unauthorized() {
    let router = setup_admin_router(state());

    let missing = router.clone().oneshot(get("/admin/status", None)).await.unwrap();
    let wrong = router
        .clone()
        .oneshot(get("/admin/status", Some("Bearer nope")))
        .await
        .unwrap();
    let not_bearer = router.oneshot(get("/admin/cache", Some(KEY))).await.unwrap();

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(not_bearer.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_reports_sessions_and_entries() {
    let state = state();
    let _live = state.tracker.track();
    let router = setup_admin_router(state);

    let response = router
        .oneshot(get("/admin/status", Some(&format!("Bearer {KEY}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["status"], "operational");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["active_connections"], 1);
    assert_eq!(body["cache_entries"], 1);
}

#[tokio::test]
async fn cache_lists_entry_metadata() {
    let router = setup_admin_router(state());

    let response = router
        .oneshot(get("/admin/cache", Some(&format!("Bearer {KEY}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["key"], "http://example.test:80/a.txt");
    assert_eq!(entries[0]["last_modified"], "Wed, 01 Jan 2020 00:00:00 GMT");
    assert_eq!(entries[0]["size_bytes"], 24);
}
