//! Request pipeline behaviour, driven through the assembled router.

use axum::{body::Body, extract::Request, http::StatusCode};
use opentelemetry::trace::Status;
use serde_json::json;
use tracing::Level;

use o11y_api::http::X_CORRELATION_ID;

mod common;

#[tokio::test]
async fn test_create_user_success() {
    let h = common::harness();
    let response = h
        .post_json(
            "/api/v1/users",
            json!({"name": "John Doe", "email": "john.doe@example.com", "password": "password123"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::json_body(response).await;
    assert_eq!(body["id"], "123e4567-e89b-12d3-a456-426614174000");
    assert_eq!(body["name"], "John Doe");
    assert_eq!(body["email"], "john.doe@example.com");
    assert!(body.get("password").is_none());
    assert_eq!(body["created_at"], body["updated_at"]);
}

#[tokio::test]
async fn test_missing_email_is_validation_failure() {
    let h = common::harness();
    let response = h
        .post_json("/api/v1/users", json!({"name": "John Doe", "password": "password123"}))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "validation_failed");
    assert_eq!(body["message"], "Validation failed");
    let details = body["error_details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert!(details[0]["field"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_every_violation_reported_in_order() {
    let h = common::harness();
    let response = h
        .post_json("/api/v1/users", json!({"name": "", "email": "not-an-email", "password": "short"}))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::json_body(response).await;
    let fields: Vec<_> = body["error_details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(fields, vec!["body.name", "body.email", "body.password"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = common::harness();
    let response = h
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::json_body(response).await["code"], "bad_request");
}

#[tokio::test]
async fn test_get_user_by_id() {
    let h = common::harness();
    let response = h.get("/api/v1/users/abc").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["id"], "abc");
    assert_eq!(body["email"], "john.doe@example.com");
}

#[tokio::test]
async fn test_typed_error_translated() {
    let h = common::harness();
    let response = h.get("/test/conflict").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        common::json_body(response).await,
        json!({"code": "email_taken", "message": "Email already registered"})
    );
}

#[tokio::test]
async fn test_opaque_error_is_redacted() {
    let h = common::harness();
    let response = h.get("/test/opaque").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::json_body(response).await;
    assert_eq!(
        body,
        json!({"code": "internal_server_error", "message": "Internal server error"})
    );
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn test_correlation_id_round_trip() {
    let h = common::harness();
    let response = h
        .send(
            Request::builder()
                .uri("/api/v1/users/1")
                .header("X-Correlation-Id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(
        response.headers().get(X_CORRELATION_ID).map(|v| v.to_str().unwrap()),
        Some("abc-123")
    );

    let first = h.get("/api/v1/users/1").await;
    let second = h.get("/api/v1/users/1").await;
    let a = first.headers().get(X_CORRELATION_ID).unwrap().to_str().unwrap();
    let b = second.headers().get(X_CORRELATION_ID).unwrap().to_str().unwrap();
    assert_ne!(a, b);
    assert!(uuid::Uuid::parse_str(a).is_ok());
    assert!(uuid::Uuid::parse_str(b).is_ok());
}

#[tokio::test]
async fn test_panic_isolation() {
    let h = common::harness();
    let before = h.in_flight();

    let response = h.get("/test/panic").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::json_body(response).await;
    assert_eq!(
        body,
        json!({"code": "internal_server_error", "message": "Internal server error"})
    );

    assert_eq!(h.in_flight(), before);

    let spans = h.spans.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    assert!(matches!(spans[0].status, Status::Error { .. }));
}

#[tokio::test]
async fn test_panicking_request_is_logged_and_measured_once() {
    let h = common::harness();
    let (response, lines) = h
        .send_logged(Request::builder().uri("/test/panic").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let access: Vec<_> = lines
        .iter()
        .filter(|line| line.message() == "received http request")
        .collect();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].level, Level::ERROR);
    assert_eq!(access[0].fields["status"], "500");
    assert_eq!(access[0].fields["path"], "/test/panic");

    assert_eq!(h.request_count("GET", "/test/panic"), Some(1.0));
    assert_eq!(
        common::sample(
            &h.metrics.render(),
            r#"http_request_duration_seconds_count{method="GET",route="/test/panic"} "#
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn test_abort_signal_has_no_body() {
    let h = common::harness();
    let response = h.get("/test/abort").await;
    assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
    assert_eq!(h.in_flight(), Some(0.0));
}

#[tokio::test]
async fn test_scrape_endpoint_not_measured_or_traced() {
    let h = common::harness();
    let response = h.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    h.get("/metrics").await;

    assert_eq!(h.request_count("GET", "/metrics"), None);
    assert!(h.spans.get_finished_spans().unwrap().is_empty());
}

#[tokio::test]
async fn test_docs_counted_but_not_traced() {
    let h = common::harness();
    assert_eq!(h.get("/docs").await.status(), StatusCode::OK);
    assert_eq!(h.get("/docs/openapi.yml").await.status(), StatusCode::OK);

    assert_eq!(h.request_count("GET", "/docs"), Some(1.0));
    assert_eq!(h.request_count("GET", "/docs/openapi.yml"), Some(1.0));
    assert!(h.spans.get_finished_spans().unwrap().is_empty());
}

#[tokio::test]
async fn test_one_span_per_request_named_by_pattern() {
    let h = common::harness();
    h.get("/api/v1/users/1").await;
    h.get("/api/v1/users/2").await;

    let spans = h.spans.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 2);
    assert!(spans.iter().all(|s| s.name == "GET /api/v1/users/{id}"));
    assert_eq!(h.request_count("GET", "/api/v1/users/{id}"), Some(2.0));
}

#[tokio::test]
async fn test_unmatched_route() {
    let h = common::harness();
    let response = h.get("/does/not/exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::json_body(response).await["code"], "not_found");

    let spans = h.spans.get_finished_spans().unwrap();
    assert_eq!(spans[0].name, "GET unknown");
    assert_eq!(h.request_count("GET", "/does/not/exist"), Some(1.0));
}

#[tokio::test]
async fn test_cors_preflight() {
    let h = common::harness();
    let response = h
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/users")
                .header("origin", "https://app.example")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
