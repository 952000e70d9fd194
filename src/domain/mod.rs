pub mod digest;
pub mod document;
pub mod metadata;
pub mod record;

pub use digest::{DocumentDigest, InvalidDigest};
pub use document::DocumentFile;
pub use metadata::DocumentMetadata;
pub use record::{
    DocumentPage, DocumentRecord, NotarizationReceipt, StoragePointer, TransactionReceipt,
    VerificationResult,
};
