use super::digest::DocumentDigest;
use super::metadata::DocumentMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the storage gateway put an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePointer {
    pub cid: String,
    pub url: String,
}

/// The ledger's tuple for one digest. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub storage_pointer: String,
    pub uploader: String,
    /// Unix seconds, as assigned by the ledger.
    pub timestamp: i64,
    pub metadata: String,
}

/// Confirmation of a ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
}

/// Published to the caller when a notarization completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizationReceipt {
    pub digest: DocumentDigest,
    pub cid: String,
    pub url: String,
    pub transaction_hash: String,
}

impl NotarizationReceipt {
    pub fn new(digest: DocumentDigest, pointer: StoragePointer, transaction_hash: String) -> Self {
        Self {
            digest,
            cid: pointer.cid,
            url: pointer.url,
            transaction_hash,
        }
    }
}

/// A ledger record rebuilt for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub digest: DocumentDigest,
    pub storage_pointer: String,
    pub uploader: String,
    pub timestamp: i64,
    pub metadata: String,
}

impl VerificationResult {
    pub fn from_record(digest: DocumentDigest, record: DocumentRecord) -> Self {
        Self {
            digest,
            storage_pointer: record.storage_pointer,
            uploader: record.uploader,
            timestamp: record.timestamp,
            metadata: record.metadata,
        }
    }

    pub fn parsed_metadata(&self) -> Option<DocumentMetadata> {
        DocumentMetadata::parse(&self.metadata)
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// One page of digests in ledger insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPage {
    pub digests: Vec<DocumentDigest>,
    pub total: u64,
}
