use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::pricing::repository::SubmissionRepository;
use crate::workflows::pricing::router::{approve_handler, ADMIN_HEADER};
use crate::workflows::pricing::{
    AnomalyPolicy, InMemoryAuditLog, InMemoryPricingStore, PricingModerationService,
};

fn admin_header_value() -> String {
    admin().to_string()
}

#[tokio::test]
async fn list_route_returns_pending_rows_with_verdicts() {
    let (service, store, _audit) = build_service();
    insert_pending(&store, "Consumer Unit Change", 1_000.0);
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/pricing/submissions?status=pending")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let rows = body.as_array().expect("array payload");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["verdict"]["verdict"], "suspicious");
    assert_eq!(rows[0]["verdict"]["severity"], "very_high");
    assert_eq!(rows[0]["price_label"], "£1,000.00");
}

#[tokio::test]
async fn rejected_tab_is_always_empty() {
    let (service, _store, _audit) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/pricing/submissions?status=rejected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, json!([]));
}

#[tokio::test]
async fn unknown_status_filter_is_a_bad_request() {
    let (service, _store, _audit) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/pricing/submissions?status=deleted")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approve_requires_admin_header() {
    let (service, store, audit) = build_service();
    let id = insert_pending(&store, "EICR", 180.0);

    let response = approve_handler::<InMemoryPricingStore, InMemoryAuditLog>(
        State(Arc::new(service)),
        Path(id.0),
        HeaderMap::new(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(audit.entries().is_empty());
    let stored = store.fetch(&id).expect("fetch").expect("present");
    assert!(stored.submission.awaiting_review());
}

#[tokio::test]
async fn approve_handler_updates_status() {
    let (service, store, audit) = build_service();
    let id = insert_pending(&store, "EICR", 180.0);
    let mut headers = HeaderMap::new();
    headers.insert(
        ADMIN_HEADER,
        HeaderValue::from_str(&admin_header_value()).expect("valid header"),
    );

    let response = approve_handler::<InMemoryPricingStore, InMemoryAuditLog>(
        State(Arc::new(service)),
        Path(id.0),
        headers,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["verification_status"], "approved");
    assert_eq!(audit.entries().len(), 1);
}

#[tokio::test]
async fn reject_route_deletes_submission() {
    let (service, store, audit) = build_service();
    let id = insert_pending(&store, "Consumer Unit Change", 5.0);
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/admin/pricing/submissions/{id}/reject"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(ADMIN_HEADER, admin_header_value())
                .body(Body::from(
                    serde_json::to_vec(&json!({ "reasons": ["spam"] })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["action"], "pricing_deleted");
    assert_eq!(body["details"], json!({ "reasons": ["spam"] }));
    assert!(store.fetch(&id).expect("fetch").is_none());
    assert_eq!(audit.entries().len(), 1);
}

#[tokio::test]
async fn reject_route_without_reasons_is_unprocessable() {
    let (service, store, _audit) = build_service();
    let id = insert_pending(&store, "Consumer Unit Change", 5.0);
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/admin/pricing/submissions/{id}/reject"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(ADMIN_HEADER, admin_header_value())
                .body(Body::from(
                    serde_json::to_vec(&json!({ "reasons": [] })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.fetch(&id).expect("fetch").is_some());
}

#[tokio::test]
async fn detail_route_returns_not_found_for_missing_rows() {
    let (service, _store, _audit) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/admin/pricing/submissions/{}",
                uuid::Uuid::new_v4()
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_route_reports_store_failures() {
    let service = PricingModerationService::new(
        Arc::new(UnavailableStore),
        Arc::new(InMemoryAuditLog::new()),
        AnomalyPolicy::default(),
    );
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/pricing/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("database offline"));
}

#[tokio::test]
async fn averages_route_lists_job_type_means() {
    let (service, _store, _audit) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admin/pricing/averages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(
        body,
        json!([
            { "job_type": "Consumer Unit Change", "average": 460.0, "sample_count": 5 },
            { "job_type": "Garden Lighting", "average": 310.0, "sample_count": 2 },
        ])
    );
}
