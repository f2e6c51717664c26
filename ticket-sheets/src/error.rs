use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Record store error: {0}")]
    Store(#[from] beneficiary_ledger::Error),

    #[error("QR encoding failed for ticket {ticket_code}: {detail}")]
    Qr { ticket_code: String, detail: String },

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Logo could not be loaded: {0}")]
    Logo(String),

    #[error("No records to render")]
    Empty,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
