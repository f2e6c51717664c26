// Error mapping from ledger outcomes to HTTP responses.
// Store internals (paths, I/O details) are logged and never returned.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use beneficiary_ledger::{Error as LedgerError, ErrorKind, NoOpReason};
use serde_json::json;
use thiserror::Error;

/// Which endpoint failed; decides the response body shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CheckTicket,
    Scan,
}

#[derive(Error, Debug)]
#[error("{endpoint:?}: {source}")]
pub struct GatewayError {
    pub endpoint: Endpoint,
    #[source]
    pub source: LedgerError,
}

impl GatewayError {
    pub fn check(source: LedgerError) -> Self {
        Self {
            endpoint: Endpoint::CheckTicket,
            source,
        }
    }

    pub fn scan(source: LedgerError) -> Self {
        Self {
            endpoint: Endpoint::Scan,
            source,
        }
    }

    /// Request body that could not be read as the endpoint's JSON shape
    pub fn rejected(endpoint: Endpoint, rejection: JsonRejection) -> Self {
        Self {
            endpoint,
            source: LedgerError::InvalidRequest(rejection.body_text()),
        }
    }

    /// Status, machine-readable kind, caller-safe message
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self.source.kind() {
            ErrorKind::InvalidRequest => {
                let message = match &self.source {
                    LedgerError::InvalidRequest(detail) => detail.clone(),
                    _ => "Invalid request".to_string(),
                };
                (StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            ErrorKind::NotFound => {
                let message = match self.source {
                    LedgerError::NoBeneficiaryInfo(_) => "No beneficiary info for this ticket",
                    _ => "Ticket code not found",
                };
                (StatusCode::NOT_FOUND, "not_found", message.to_string())
            }
            ErrorKind::NoOpUpdate(NoOpReason::AlreadyServed) => (
                StatusCode::CONFLICT,
                "already_served",
                NoOpReason::AlreadyServed.to_string(),
            ),
            ErrorKind::NoOpUpdate(NoOpReason::NothingToUpdate) => (
                StatusCode::CONFLICT,
                "nothing_to_update",
                NoOpReason::NothingToUpdate.to_string(),
            ),
            ErrorKind::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "busy",
                "Ledger is busy, retry shortly".to_string(),
            ),
            ErrorKind::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Beneficiary store is unavailable".to_string(),
            ),
            ErrorKind::Corruption => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "corruption",
                "Beneficiary store is unreadable".to_string(),
            ),
            ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal error".to_string(),
            ),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(endpoint = ?self.endpoint, error = %self.source, "Request failed");
        } else {
            tracing::info!(endpoint = ?self.endpoint, kind, "Request rejected");
        }

        let body = match self.endpoint {
            Endpoint::CheckTicket => json!({
                "exists": false,
                "error": kind,
                "message": message,
            }),
            Endpoint::Scan => json!({
                "success": false,
                "error": kind,
                "message": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}
