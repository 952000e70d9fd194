use crate::domain::{DocumentDigest, InvalidDigest};
use crate::infrastructure::gateway::GatewayError;
use crate::infrastructure::ledger::LedgerError;
use thiserror::Error;

/// Everything a notarization or verification workflow can fail with.
///
/// The `Display` text is what the operator sees after `Error: `.
#[derive(Error, Debug)]
pub enum NotaryError {
    #[error("{0}")]
    MissingInput(String),

    #[error("No ledger provider available: {0}")]
    ProviderUnavailable(String),

    #[error("Storage upload failed: {0}")]
    StorageUpload(String),

    #[error("Ledger rejected the write: {0}")]
    WriteRejected(String),

    #[error("No record for document {0}")]
    RecordNotFound(DocumentDigest),

    #[error("No document at index {0}")]
    IndexOutOfRange(u64),

    #[error("Remote call failed: {0}")]
    UnknownRemote(String),

    #[error(transparent)]
    InvalidDigest(#[from] InvalidDigest),

    #[error("Could not read file: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("Another {0} is already in progress")]
    Busy(&'static str),
}

impl From<LedgerError> for NotaryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(digest) => NotaryError::RecordNotFound(digest),
            LedgerError::WriteRejected(reason) => NotaryError::WriteRejected(reason),
            LedgerError::ProviderUnavailable(reason) => NotaryError::ProviderUnavailable(reason),
            LedgerError::IndexOutOfRange(index) => NotaryError::IndexOutOfRange(index),
            other => NotaryError::UnknownRemote(other.to_string()),
        }
    }
}

impl From<GatewayError> for NotaryError {
    fn from(err: GatewayError) -> Self {
        NotaryError::StorageUpload(err.to_string())
    }
}
