// Beneficiary Gateway - HTTP entry point for ticket checks and distribution scans

use axum::{
    routing::{get, post},
    Router,
};
use beneficiary_ledger::Ledger;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;

pub use config::GatewayConfig;
pub use error::GatewayError;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/check-ticket", post(handlers::check_ticket))
        .route("/scan", post(handlers::scan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
