//! Beneficiary Distribution Ledger
//!
//! Tracks in-kind aid distribution per ticket code over a flat CSV table.
//!
//! # Architecture
//!
//! - **Record Store**: load-all / save-all over one file, replaced atomically
//! - **Single Writer**: one actor task owns every read-merge-write
//! - **Lock-free reads**: lookups read the store directly
//!
//! # Invariants
//!
//! - A flag once `Done` is never reverted by the ledger
//! - No two successful distributions can overwrite each other's update
//! - Every column and every untouched cell round-trips verbatim
//! - A failed write leaves the previous file in place

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod payload;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, ErrorKind, NoOpReason, Result, StoreOperation};
pub use ledger::Ledger;
pub use payload::{decode_qr_payload, encode_qr_payload};
pub use store::{CsvRecordStore, MemoryRecordStore, RecordStore, RecordTable, Schema};
pub use types::{
    BeneficiaryRecord, Category, DistributionFlags, DistributionReceipt, DistributionRequest,
    EffectiveUpdate, FlagState, FlagVocabulary, InfoKind, LedgerSummary, TicketCode, TicketInfo,
};
