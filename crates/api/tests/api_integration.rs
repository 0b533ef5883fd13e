//! API integration tests.
//!
//! These drive the full router over the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use ecowatch_api::{AppState, router as api_router};
use ecowatch_core::{MemoryStore, NoOpStorage};
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";
const BOUNDARY: &str = "ecowatch-test-boundary";

fn create_test_router(admin_token: Option<&str>) -> Router {
    let state = AppState::new(
        MemoryStore::new(),
        Arc::new(NoOpStorage::new("http://localhost:3000")),
        admin_token.map(str::to_string),
    );
    api_router().with_state(state)
}

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn verify_request(identity: Option<&str>, fields: &[(&str, &str)], photo: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(photo) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(photo);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .uri("/reports/verify")
        .method("POST")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(identity) = identity {
        builder = builder.header("X-Identity", identity);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, body_json(response).await)
}

fn report_body(label: &str, lat: f64, lng: f64) -> Value {
    json!({
        "imageUrl": "https://img.example/1.jpg",
        "label": label,
        "severity": 2,
        "location": { "lat": lat, "lng": lng },
        "locationName": "Thames Embankment"
    })
}

async fn create_report(app: &Router, label: &str, lat: f64, lng: f64) -> String {
    let (status, body) = send(app, json_request("/reports/create", &report_body(label, lat, lng))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["report"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_report_counts_similar() {
    let app = create_test_router(None);

    let (status, first) = send(
        &app,
        json_request("/reports/create", &report_body("Fly-tipped waste", 51.5, -0.12)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["similarReportsCount"], 0);
    assert_eq!(first["data"]["report"]["type"], "Dumping");
    assert_eq!(first["data"]["report"]["severityLabel"], "Moderate");
    assert_eq!(first["data"]["report"]["upvotes"], 0);

    let (_, second) = send(
        &app,
        json_request("/reports/create", &report_body("More waste", 51.505, -0.115)),
    )
    .await;
    assert_eq!(second["data"]["similarReportsCount"], 1);
}

#[tokio::test]
async fn test_create_report_requires_fields() {
    let app = create_test_router(None);

    let (status, body) = send(
        &app,
        json_request(
            "/reports/create",
            &json!({ "label": "Smoke", "severity": 3, "location": { "lat": 0.0, "lng": 0.0 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        json_request(
            "/reports/create",
            &json!({ "imageUrl": "x", "label": "Smoke", "severity": 9, "location": { "lat": 0.0, "lng": 0.0 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_enforces_proximity() {
    let app = create_test_router(None);
    let id = create_report(&app, "Oil in the river", 51.5, -0.12).await;

    let (status, body) = send(
        &app,
        verify_request(
            Some("alice"),
            &[("reportId", id.as_str()), ("latitude", "51.52"), ("longitude", "-0.12")],
            Some(b"jpeg-bytes".as_slice()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "PROXIMITY_CHECK_FAILED");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("within 0.5 km")
    );

    let (_, shown) = send(&app, json_request("/reports/show", &json!({ "reportId": id }))).await;
    assert_eq!(shown["data"]["upvotes"], 0);
    assert_eq!(shown["data"]["verifications"], json!([]));
}

#[tokio::test]
async fn test_verify_commits_when_near() {
    let app = create_test_router(None);
    let id = create_report(&app, "Oil in the river", 51.5, -0.12).await;

    let (status, body) = send(
        &app,
        verify_request(
            Some("alice"),
            &[
                ("reportId", id.as_str()),
                ("latitude", "51.5001"),
                ("longitude", "-0.12"),
                ("description", ""),
            ],
            Some(b"jpeg-bytes".as_slice()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["upvotes"], 1);
    assert_eq!(body["data"]["verifiedBy"], "alice");
    let verifications = body["data"]["verifications"].as_array().unwrap();
    assert_eq!(verifications.len(), 1);
    assert_eq!(verifications[0]["description"], "Verified in person");
    assert!(
        verifications[0]["photoUrl"]
            .as_str()
            .unwrap()
            .starts_with(&format!("http://localhost:3000/files/verifications/{id}/"))
    );

    let (_, body) = send(
        &app,
        verify_request(
            Some("bob"),
            &[("reportId", id.as_str()), ("latitude", "51.5"), ("longitude", "-0.1201")],
            Some(b"jpeg-bytes".as_slice()),
        ),
    )
    .await;
    assert_eq!(body["data"]["upvotes"], 2);
    assert_eq!(body["data"]["verifiedBy"], "alice");
}

#[tokio::test]
async fn test_verify_rejects_incomplete_requests() {
    let app = create_test_router(None);
    let id = create_report(&app, "Smoke plume", 10.0, 10.0).await;

    let (status, _) = send(
        &app,
        verify_request(
            None,
            &[("reportId", id.as_str()), ("latitude", "10.0"), ("longitude", "10.0")],
            Some(b"jpeg".as_slice()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        verify_request(
            Some("alice"),
            &[("reportId", id.as_str()), ("latitude", "10.0"), ("longitude", "10.0")],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        verify_request(
            Some("alice"),
            &[("reportId", "missing"), ("latitude", "10.0"), ("longitude", "10.0")],
            Some(b"jpeg".as_slice()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "REPORT_NOT_FOUND");
}

#[tokio::test]
async fn test_upvote() {
    let app = create_test_router(None);
    let id = create_report(&app, "Cut trees", 0.0, 0.0).await;

    let (status, body) = send(&app, json_request("/reports/upvote", &json!({ "reportId": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["upvotes"], 1);
    assert_eq!(body["data"]["type"], "Deforestation");

    let (status, body) = send(
        &app,
        json_request("/reports/upvote", &json!({ "reportId": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "REPORT_NOT_FOUND");
}

#[tokio::test]
async fn test_assessment_consensus() {
    let app = create_test_router(None);
    let id = create_report(&app, "Trash", 0.0, 0.0).await;

    for (who, severity) in [("a", 5), ("b", 1), ("c", 3)] {
        let (status, _) = send(
            &app,
            json_request(
                "/reports/assess",
                &json!({ "reportId": id, "severity": severity, "submitterIdentity": who }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, json_request("/reports/consensus", &json!({ "reportId": id }))).await;
    assert_eq!(body["data"]["consensusLabel"], "Significant");
    assert_eq!(body["data"]["mean"], 3.0);
    assert_eq!(body["data"]["engagementCount"], 3);

    let (_, shown) = send(&app, json_request("/reports/show", &json!({ "reportId": id }))).await;
    assert_eq!(shown["data"]["severity"], 2);
    assert_eq!(shown["data"]["upvotes"], 0);
}

#[tokio::test]
async fn test_feed_groups_near_duplicates() {
    let app = create_test_router(None);
    create_report(&app, "Waste pile", 0.0, 0.0).await;
    create_report(&app, "Waste pile again", 0.005, 0.005).await;
    create_report(&app, "Waste elsewhere", 0.5, 0.5).await;

    let (status, body) = send(&app, json_request("/reports/feed", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let sizes: Vec<u64> = entries
        .iter()
        .map(|e| e["groupSize"].as_u64().unwrap())
        .collect();
    assert!(sizes.contains(&2));
    assert!(sizes.contains(&1));

    let pair = entries.iter().find(|e| e["groupSize"] == 2).unwrap();
    assert_eq!(pair["description"], "2 people reported this issue");
    assert_eq!(pair["memberIds"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_feed_status_and_consensus_filters() {
    let app = create_test_router(None);
    let assessed = create_report(&app, "Smoke over the valley", 0.0, 0.0).await;
    create_report(&app, "Trash by the lake", 5.0, 5.0).await;

    let (_, body) = send(&app, json_request("/reports/feed", &json!({ "status": ["Verified"] }))).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = send(&app, json_request("/reports/feed", &json!({ "status": ["Pending"] }))).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        json_request(
            "/reports/assess",
            &json!({ "reportId": assessed, "severity": 5, "submitterIdentity": "alice" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        json_request("/reports/feed", &json!({ "communitySeverity": ["Critical"] })),
    )
    .await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], assessed.as_str());
}

#[tokio::test]
async fn test_comments() {
    let app = create_test_router(None);
    let id = create_report(&app, "Smoke", 0.0, 0.0).await;

    let (status, body) = send(
        &app,
        json_request("/comments/create", &json!({ "reportId": "missing", "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "REPORT_NOT_FOUND");

    let (status, body) = send(
        &app,
        json_request("/comments/create", &json!({ "reportId": id, "text": "Still smoking" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["userName"], "Anonymous");

    let (_, body) = send(&app, json_request("/comments/list", &json!({}))).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = create_test_router(Some(ADMIN_TOKEN));
    let id = create_report(&app, "Dumped tyres", 0.0, 0.0).await;

    let (status, _) = send(&app, json_request("/admin/reports/delete", &json!({ "reportId": id }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/admin/reports/action-status")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::from(
            json!({ "reportId": id, "acted": true, "status": "Cleared" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["actionStatus"], json!({ "acted": true, "status": "Cleared" }));

    let request = Request::builder()
        .uri("/admin/reports/delete")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::from(json!({ "reportId": id }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, json_request("/reports/show", &json!({ "reportId": id }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_disabled_without_token() {
    let app = create_test_router(None);
    let request = Request::builder()
        .uri("/admin/reports/delete")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer anything")
        .body(Body::from(json!({ "reportId": "x" }).to_string()))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
