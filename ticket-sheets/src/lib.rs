//! Ticket Sheet Renderer
//!
//! Offline batch job: takes a snapshot of the record store and lays every
//! beneficiary out as a printable ticket, 16 per A4 page by default, each
//! with a QR code binding the beneficiary's name to their ticket code.
//!
//! The renderer reads the store directly and ignores distribution state;
//! every record gets a ticket, in stored order.

pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod qr;

pub use config::SheetConfig;
pub use error::{Result, SheetError};
pub use layout::{CellPlacement, GridSpec, SheetLayout};
pub use pdf::{render_pdf, render_to_file};

use beneficiary_ledger::RecordStore;

/// Render every record of a store to `config.output_path`
pub fn render_store(store: &dyn RecordStore, config: &SheetConfig) -> Result<u64> {
    let table = store.load_all()?;
    let records: Vec<_> = table.records().collect();

    tracing::info!(
        records = records.len(),
        output = ?config.output_path,
        "Rendering ticket sheet"
    );

    render_to_file(&records, config, &config.output_path)
}
