pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{NotarizeUseCase, Notary, Outcome, Verification, VerifyUseCase};
pub use config::NotaryConfig;
pub use domain::{DocumentDigest, DocumentFile, NotarizationReceipt, VerificationResult};
pub use error::NotaryError;
pub use infrastructure::{Ledger, SqliteLedger, StorageGateway};
