//! End-to-end tests of the HTTP surface over a CSV store

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use beneficiary_gateway::{router, AppState};
use beneficiary_ledger::{Config, Ledger};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const STORE: &str = "\
Ticket Code,Name,Age,Parténaire,Carte,Jeton Distribué,NFI,Outils,Semence
A001,Amina Bahati,34,,,Oui,Non,Non,Non
A002,Jean Mushagalusa,51,Caritas,C-17,Non,Non,Non,Non
A003,Esther Kavira,27,,C-22,Oui,Oui,Oui,Oui
";

async fn app() -> (Router, Arc<Ledger>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beneficiaries.csv");
    std::fs::write(&path, STORE).unwrap();

    let mut config = Config::default();
    config.store_path = path;
    let ledger = Arc::new(Ledger::open(config).await.unwrap());
    let app = router(AppState {
        ledger: ledger.clone(),
    });
    (app, ledger, dir)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_check_ticket_partner_priority() {
    let (app, _ledger, _dir) = app().await;
    let (status, body) = post(&app, "/check-ticket", json!({ "ticketCode": "A002" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);
    assert_eq!(body["infoType"], "Partner");
    assert_eq!(body["info"], "Caritas");
}

#[tokio::test]
async fn test_check_ticket_from_qr_text() {
    let (app, _ledger, _dir) = app().await;
    let (status, body) = post(
        &app,
        "/check-ticket",
        json!({ "ticketCode": "Name : Amina Bahati\nCode : A001" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["infoType"], "Age");
    assert_eq!(body["info"], "34");
}

#[tokio::test]
async fn test_check_unknown_ticket() {
    let (app, _ledger, _dir) = app().await;
    let (status, body) = post(&app, "/check-ticket", json!({ "ticketCode": "NOPE" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["exists"], false);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_scan_requires_ticket_code() {
    let (app, _ledger, _dir) = app().await;
    let (status, body) = post(&app, "/scan", json!({ "nfi": "Done" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_unreadable_scan_body_is_json_error() {
    let (app, _ledger, dir) = app().await;
    let (status, body) = post(&app, "/scan", json!({ "ticketCode": "A001", "nfi": "maybe" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().unwrap().contains("maybe"));

    let text = std::fs::read_to_string(dir.path().join("beneficiaries.csv")).unwrap();
    assert_eq!(text, STORE);
}

#[tokio::test]
async fn test_check_ticket_without_content_type() {
    let (app, _ledger, _dir) = app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check-ticket")
                .body(Body::from(r#"{"ticketCode":"A001"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["exists"], false);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_scan_then_replay() {
    let (app, _ledger, dir) = app().await;
    let request = json!({ "ticketCode": "A001", "nfi": "Done", "tools": "Done" });

    let (status, body) = post(&app, "/scan", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["applied"], json!(["nfi", "tools"]));

    let (status, body) = post(&app, "/scan", request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "nothing_to_update");

    let text = std::fs::read_to_string(dir.path().join("beneficiaries.csv")).unwrap();
    assert!(text.contains("A001,Amina Bahati,34,,,Oui,Oui,Oui,Non"));
}

#[tokio::test]
async fn test_scan_fully_served() {
    let (app, _ledger, _dir) = app().await;
    let (status, body) = post(&app, "/scan", json!({ "ticketCode": "A003", "seed": "Done" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_served");
    assert!(body["message"].as_str().unwrap().contains("100%"));
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (app, _ledger, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["records"], 3);
    assert_eq!(body["fully_served"], 1);

    post(&app, "/check-ticket", json!({ "ticketCode": "A001" })).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ledger_ticket_checks_total 1"));
}

#[tokio::test]
async fn test_store_removed_is_unavailable() {
    let (app, _ledger, dir) = app().await;
    std::fs::remove_file(dir.path().join("beneficiaries.csv")).unwrap();

    let (status, body) = post(&app, "/scan", json!({ "ticketCode": "A001", "seed": "Done" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "store_unavailable");
    assert!(!body["message"].as_str().unwrap().contains("beneficiaries.csv"));
}
