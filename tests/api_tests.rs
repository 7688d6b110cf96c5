/// End-to-end tests of the HTTP surface.
///
/// Run with: cargo test --test api_tests
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use dayledger::facade::Ledger;
use dayledger::web::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> axum::Router {
    router(AppState::new(Arc::new(Ledger::in_memory())))
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn bare_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

async fn decode_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn register(router: &axum::Router, username: &str) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "username": username, "password": "password123" }),
        ))
        .await
        .expect("register response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn overwrite_then_append_round_trip() {
    let router = app();
    let token = register(&router, "alice").await;

    let saved = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/days",
            Some(&token),
            json!({
                "date": "2025-09-10",
                "notes": "1. morning run",
                "spent_items": [{ "description": "coffee", "amount": 4.5 }],
                "mode": "overwrite"
            }),
        ))
        .await
        .expect("save response");
    assert_eq!(saved.status(), StatusCode::OK);

    let appended = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/days",
            Some(&token),
            json!({
                "date": "2025-09-10",
                "notes": "2. groceries",
                "spent_items": [{ "description": "food", "amount": 32.0 }],
                "mode": "append"
            }),
        ))
        .await
        .expect("append response");
    assert_eq!(appended.status(), StatusCode::OK);
    let body = decode_json(appended).await;
    assert_eq!(body["notes"], "1. morning run\n2. groceries");
    assert_eq!(body["spent_items"].as_array().expect("items").len(), 2);

    let fetched = router
        .clone()
        .oneshot(bare_request(
            Method::GET,
            "/api/days/2025-09-10",
            Some(&token),
        ))
        .await
        .expect("get response");
    assert_eq!(fetched.status(), StatusCode::OK);
    let body = decode_json(fetched).await;
    assert_eq!(body["notes"], "1. morning run\n2. groceries");
    assert!(body["last_modified"].is_string());
}

#[tokio::test]
async fn absent_day_is_the_empty_shape_not_404() {
    let router = app();
    let token = register(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(bare_request(
            Method::GET,
            "/api/days/2025-01-01",
            Some(&token),
        ))
        .await
        .expect("get response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body, json!({ "notes": "", "spent_items": [] }));
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let router = app();

    for request in [
        bare_request(Method::GET, "/api/days/2025-09-10", None),
        json_request(Method::POST, "/api/days", None, json!({ "date": "2025-09-10" })),
        bare_request(Method::GET, "/api/days/range", None),
        bare_request(Method::DELETE, "/api/days/2025-09-10", None),
    ] {
        let response = router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = decode_json(response).await;
        assert_eq!(body["code"], "unauthorized");
    }

    let bogus = router
        .clone()
        .oneshot(bare_request(
            Method::GET,
            "/api/days/2025-09-10",
            Some("not-a-real-token"),
        ))
        .await
        .expect("response");
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_dates_are_a_400() {
    let router = app();
    let token = register(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(bare_request(
            Method::GET,
            "/api/days/not-a-date",
            Some(&token),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = decode_json(response).await;
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let router = app();
    register(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "username": "alice", "password": "password123" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let router = app();
    register(&router, "alice").await;

    let login = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "username": "alice", "password": "password123" }),
        ))
        .await
        .expect("login response");
    assert_eq!(login.status(), StatusCode::OK);
    let body = decode_json(login).await;
    let token = body["token"].as_str().expect("token");
    assert_eq!(body["user"]["username"], "alice");

    let response = router
        .clone()
        .oneshot(bare_request(Method::GET, "/api/days/range", Some(token)))
        .await
        .expect("range response");
    assert_eq!(response.status(), StatusCode::OK);

    let failed = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "username": "alice", "password": "wrong-password" }),
        ))
        .await
        .expect("response");
    assert_eq!(failed.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_then_get_returns_the_empty_shape() {
    let router = app();
    let token = register(&router, "alice").await;

    router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/days",
            Some(&token),
            json!({ "date": "2025-09-10", "notes": "gone soon" }),
        ))
        .await
        .expect("save response");

    let deleted = router
        .clone()
        .oneshot(bare_request(
            Method::DELETE,
            "/api/days/2025-09-10",
            Some(&token),
        ))
        .await
        .expect("delete response");
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(decode_json(deleted).await["deleted"], "2025-09-10");

    let fetched = router
        .clone()
        .oneshot(bare_request(
            Method::GET,
            "/api/days/2025-09-10",
            Some(&token),
        ))
        .await
        .expect("get response");
    let body = decode_json(fetched).await;
    assert_eq!(body["notes"], "");
}

#[tokio::test]
async fn range_reports_stored_dates_and_bounds() {
    let router = app();
    let token = register(&router, "alice").await;

    for date in ["2025-06-01", "2025-03-15"] {
        router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/days",
                Some(&token),
                json!({ "date": date, "notes": "x" }),
            ))
            .await
            .expect("save response");
    }

    let response = router
        .clone()
        .oneshot(bare_request(Method::GET, "/api/days/range", Some(&token)))
        .await
        .expect("range response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body["min"], "2025-03-15");
    assert_eq!(
        body["dates"],
        json!(["2025-03-15", "2025-06-01"])
    );

    // Owners see only their own range.
    let other = register(&router, "bob").await;
    let response = router
        .clone()
        .oneshot(bare_request(Method::GET, "/api/days/range", Some(&other)))
        .await
        .expect("range response");
    let body = decode_json(response).await;
    assert_eq!(body["dates"], json!([]));
}
