//! Ticket sheet batch job
//!
//! Reads the beneficiary store named by `LEDGER_STORE_PATH` (or the ledger
//! config file in `LEDGER_CONFIG`) and writes `SHEETS_OUTPUT`.

use beneficiary_ledger::{Config, CsvRecordStore};
use ticket_sheets::{render_store, SheetConfig};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let ledger_config = match std::env::var("LEDGER_CONFIG") {
        Ok(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env()?;
            config
        }
        Err(_) => Config::from_env()?,
    };

    let sheet_config = match std::env::var("SHEETS_CONFIG") {
        Ok(path) => SheetConfig::from_file(path)?,
        Err(_) => SheetConfig::from_env()?,
    };

    tracing::info!(store = ?ledger_config.store_path, "Generating tickets");

    let store = CsvRecordStore::open(&ledger_config);
    let bytes = render_store(&store, &sheet_config)?;

    tracing::info!(
        output = ?sheet_config.output_path,
        bytes,
        "Tickets written"
    );
    Ok(())
}
