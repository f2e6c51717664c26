// Request handlers for the ticket check / scan workflow

use crate::error::{Endpoint, GatewayError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use beneficiary_ledger::{decode_qr_payload, Category, DistributionRequest, InfoKind, TicketCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTicketRequest {
    #[serde(default)]
    pub ticket_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTicketResponse {
    pub exists: bool,
    pub info_type: InfoKind,
    pub info: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub ticket_code: Option<String>,
    #[serde(flatten)]
    pub distribution: DistributionRequest,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub records: Option<usize>,
    pub fully_served: Option<usize>,
}

/// Scanners submit either the raw QR text or the bare code
fn ticket_code(raw: Option<String>) -> TicketCode {
    raw.as_deref()
        .and_then(decode_qr_payload)
        .unwrap_or_else(|| TicketCode::new(""))
}

// POST /check-ticket
pub async fn check_ticket(
    State(state): State<AppState>,
    payload: Result<Json<CheckTicketRequest>, JsonRejection>,
) -> Result<Json<CheckTicketResponse>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::rejected(Endpoint::CheckTicket, e))?;
    let code = ticket_code(request.ticket_code);
    let info = state
        .ledger
        .check_ticket(&code)
        .await
        .map_err(GatewayError::check)?;

    Ok(Json(CheckTicketResponse {
        exists: true,
        info_type: info.kind,
        info: info.info,
    }))
}

// POST /scan
pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::rejected(Endpoint::Scan, e))?;
    let code = ticket_code(request.ticket_code);
    let receipt = state
        .ledger
        .record_distribution(&code, request.distribution)
        .await
        .map_err(GatewayError::scan)?;

    Ok(Json(ScanResponse {
        success: true,
        message: receipt.message,
        applied: receipt.applied,
    }))
}

// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let summary = state.ledger.summary().await;
    if let Err(e) = &summary {
        tracing::warn!("Health check could not read the store: {}", e);
    }
    let summary = summary.ok();

    Json(HealthResponse {
        status: if summary.is_some() { "healthy" } else { "degraded" },
        service: "beneficiary-gateway",
        version: env!("CARGO_PKG_VERSION"),
        records: summary.as_ref().map(|s| s.records),
        fully_served: summary.as_ref().map(|s| s.fully_served),
    })
}

// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Result<String, (axum::http::StatusCode, String)> {
    state.ledger.metrics().export().map_err(|e| {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to export metrics: {}", e),
        )
    })
}
