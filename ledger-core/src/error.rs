//! Error types for the ledger

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Storage operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Reading the record collection
    Load,
    /// Writing the record collection
    Save,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOperation::Load => write!(f, "load"),
            StoreOperation::Save => write!(f, "save"),
        }
    }
}

/// Why an update had nothing to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// All four categories were already `Done` before the call
    AlreadyServed,
    /// Some categories remain open but none of them was requested
    NothingToUpdate,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::AlreadyServed => write!(f, "beneficiary already served at 100%"),
            NoOpReason::NothingToUpdate => write!(f, "no updatable fields"),
        }
    }
}

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Ticket code absent from the store
    #[error("Ticket code not found: {0}")]
    NotFound(String),

    /// Ticket exists but carries no partner, card or age info
    #[error("No beneficiary info for ticket: {0}")]
    NoBeneficiaryInfo(String),

    /// Requested update has no effect
    #[error("No-op update: {0}")]
    NoOpUpdate(NoOpReason),

    /// Store missing, unreadable or unwritable
    #[error("Store unavailable ({operation} {path:?}): {source}")]
    StoreUnavailable {
        /// Store location
        path: PathBuf,
        /// Failed operation
        operation: StoreOperation,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Persisted collection is not well-formed
    #[error("Store corrupted ({path:?}): {detail}")]
    Corruption {
        /// Store location
        path: PathBuf,
        /// What failed to parse
        detail: String,
    },

    /// Write slot not acquired within the configured bound
    #[error("Ledger busy: {0}")]
    Busy(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error classification callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::InvalidRequest`]
    InvalidRequest,
    /// See [`Error::NotFound`] and [`Error::NoBeneficiaryInfo`]
    NotFound,
    /// See [`Error::NoOpUpdate`]
    NoOpUpdate(NoOpReason),
    /// See [`Error::StoreUnavailable`]
    StoreUnavailable,
    /// See [`Error::Corruption`]
    Corruption,
    /// See [`Error::Busy`]
    Busy,
    /// Actor or configuration failure
    Internal,
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::NotFound(_) | Error::NoBeneficiaryInfo(_) => ErrorKind::NotFound,
            Error::NoOpUpdate(reason) => ErrorKind::NoOpUpdate(*reason),
            Error::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Error::Corruption { .. } => ErrorKind::Corruption,
            Error::Busy(_) => ErrorKind::Busy,
            Error::Concurrency(_) | Error::Config(_) => ErrorKind::Internal,
        }
    }

    /// Whether the same call may succeed if retried later
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Busy | ErrorKind::StoreUnavailable)
    }

    pub(crate) fn corruption(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Error::Corruption {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn unavailable(
        path: impl Into<PathBuf>,
        operation: StoreOperation,
        source: std::io::Error,
    ) -> Self {
        Error::StoreUnavailable {
            path: path.into(),
            operation,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::NotFound("X".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::NoOpUpdate(NoOpReason::AlreadyServed).kind(),
            ErrorKind::NoOpUpdate(NoOpReason::AlreadyServed)
        );
        assert_eq!(Error::Config("bad".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Busy("full".into()).is_retryable());
        let err = Error::unavailable(
            "/tmp/x.csv",
            StoreOperation::Load,
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.is_retryable());
        assert!(!Error::corruption("/tmp/x.csv", "ragged row").is_retryable());
        assert!(!Error::InvalidRequest("empty".into()).is_retryable());
    }

    #[test]
    fn test_noop_messages() {
        assert!(NoOpReason::AlreadyServed.to_string().contains("100%"));
        assert_eq!(NoOpReason::NothingToUpdate.to_string(), "no updatable fields");
    }
}
