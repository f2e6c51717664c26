use beneficiary_gateway::{router, AppState, GatewayConfig};
use beneficiary_ledger::Ledger;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = GatewayConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_line_number(true)
            .with_env_filter(filter)
            .init();
    }

    info!("Starting beneficiary gateway");

    let ledger = Arc::new(Ledger::open(config.ledger.clone()).await?);
    let app = router(AppState {
        ledger: ledger.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Gateway listening on: {}", config.bind_addr);
    info!("   POST /check-ticket - Look up a ticket");
    info!("   POST /scan         - Record a distribution");
    info!("   GET  /health       - Health check");
    info!("   GET  /metrics      - Prometheus metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    ledger.shutdown().await?;
    info!("Gateway stopped");
    Ok(())
}
