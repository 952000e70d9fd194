use crate::domain::{DocumentDigest, DocumentPage, DocumentRecord, StoragePointer, TransactionReceipt};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Document {0} not found")]
    NotFound(DocumentDigest),

    #[error("No document at index {0}")]
    IndexOutOfRange(u64),

    #[error("{0}")]
    WriteRejected(String),

    #[error("{0}")]
    ProviderUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Provider error: {0}")]
    Rpc(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed ledger response: {0}")]
    Malformed(String),

    #[error("Transaction {0} was not confirmed")]
    Unconfirmed(String),
}

/// The remote append-only ledger of digest -> record mappings.
///
/// Every call is a single round trip; nothing is cached locally.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn exists(&self, digest: &DocumentDigest) -> Result<bool, LedgerError>;

    /// Callers check `exists` first: a missing record is `NotFound`, never
    /// an empty record.
    async fn get_record(&self, digest: &DocumentDigest) -> Result<DocumentRecord, LedgerError>;

    /// Send the write and return its transaction hash without waiting for
    /// it to be final.
    async fn submit_record(
        &self,
        digest: &DocumentDigest,
        pointer: &StoragePointer,
        metadata: &str,
    ) -> Result<String, LedgerError>;

    /// Block until the ledger considers the transaction final.
    async fn await_confirmation(&self, transaction_hash: &str) -> Result<TransactionReceipt, LedgerError>;

    async fn put_record(
        &self,
        digest: &DocumentDigest,
        pointer: &StoragePointer,
        metadata: &str,
    ) -> Result<TransactionReceipt, LedgerError> {
        let transaction_hash = self.submit_record(digest, pointer, metadata).await?;
        self.await_confirmation(&transaction_hash).await
    }

    /// Total records ever written. Never decreases.
    async fn count(&self) -> Result<u64, LedgerError>;

    async fn digest_at(&self, index: u64) -> Result<DocumentDigest, LedgerError>;

    async fn digests_by_uploader(&self, uploader: &str) -> Result<Vec<DocumentDigest>, LedgerError>;

    async fn list(&self, offset: u64, limit: u64) -> Result<DocumentPage, LedgerError>;
}
