use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::time::Duration;
use tower::ServiceExt;

use calshare::{store, KvStore, MemoryStore, StateService, StoreError, DEFAULT_TTL};

fn app() -> Router {
    let store: Arc<dyn KvStore> = MemoryStore::new(store::Config { capacity: 64 });
    calshare::router(StateService::new(store, DEFAULT_TTL))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn calendar(year: i32) -> Value {
    json!({
        "selectedYear": year,
        "hideWeekendColors": false,
        "holidaySummary": { "hrDays": [], "fdDays": [] },
        "dayStates": {}
    })
}

#[tokio::test]
async fn create_fetch_and_reject_wrong_password() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": calendar(2024), "password": "p1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/state?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], calendar(2024));
    assert!(body["state"].get("password").is_none());
    assert!(body.get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": calendar(1999), "id": id, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["statusCode"], 403);

    let (_, body) = send(&app, Method::GET, &format!("/api/state?id={id}"), None).await;
    assert_eq!(body["state"]["selectedYear"], 2024);
}

#[tokio::test]
async fn update_with_password_keeps_id() {
    let app = app();

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": calendar(2024), "password": "p1" })),
    )
    .await;
    let id = body["id"].clone();

    let mut updated = calendar(2025);
    updated["dayStates"] = json!({ "2025-05-01": "holiday" });
    updated["password"] = json!("p1");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/state",
        Some(json!({ "state": updated, "id": id, "password": "p1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let uri = format!("/api/state?id={}", id.as_str().unwrap());
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["state"]["selectedYear"], 2025);
    assert_eq!(body["state"]["dayStates"]["2025-05-01"], "holiday");
    assert!(body["state"].get("password").is_none());
}

#[tokio::test]
async fn creates_never_reuse_ids() {
    let app = app();
    let mut seen = Vec::new();

    for _ in 0..20 {
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/state",
            Some(json!({ "state": calendar(2024), "password": "p" })),
        )
        .await;
        let id = body["id"].as_str().unwrap().to_string();
        assert!(!seen.contains(&id));
        seen.push(id);
    }
}

#[tokio::test]
async fn fetch_errors() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/state", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ID is required");

    let (status, _) = send(&app, Method::GET, "/api/state?id=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/state?id=missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app();

    let (status, _) = send(&app, Method::POST, "/api/state", Some(json!({ "password": "p" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": 2024, "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_id_creates_new_state() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": calendar(2024), "id": "", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let (status, body) = send(&app, Method::GET, &format!("/api/state?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], calendar(2024));
}

#[tokio::test]
async fn full_store_rejects_creates_and_keeps_records() {
    let store: Arc<dyn KvStore> = MemoryStore::new(store::Config { capacity: 4 });
    let app = calshare::router(StateService::new(store, DEFAULT_TTL));

    let mut ids = Vec::new();
    for _ in 0..4 {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/state",
            Some(json!({ "state": calendar(2024), "password": "p1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    for _ in 0..16 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/state",
            Some(json!({ "state": calendar(2024), "password": "p1" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    for id in &ids {
        let (status, _) = send(&app, Method::GET, &format!("/api/state?id={id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/state",
            Some(json!({ "state": calendar(1970), "id": id, "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test(start_paused = true)]
async fn expired_state_is_gone() {
    let app = app();

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": calendar(2024), "password": "p1" })),
    )
    .await;
    let uri = format!("/api/state?id={}", body["id"].as_str().unwrap());

    tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn legacy_endpoints() {
    let app = app();
    let document = json!({ "anything": [1, 2, 3] });

    let (status, body) = send(&app, Method::POST, "/api/save", Some(document.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, document);

    let (status, _) = send(&app, Method::GET, "/api/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route() {
    let (status, _) = send(&app(), Method::GET, "/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

struct BrokenStore;

#[async_trait]
impl KvStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn storage_failures_are_server_errors() {
    let store: Arc<dyn KvStore> = Arc::new(BrokenStore);
    let app = calshare::router(StateService::new(store, DEFAULT_TTL));

    let (status, body) = send(&app, Method::GET, "/api/state?id=abc", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["statusCode"], 500);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/state",
        Some(json!({ "state": calendar(2024), "password": "p1" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, Method::POST, "/api/save", Some(json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
