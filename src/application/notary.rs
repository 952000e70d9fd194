use super::notarize::NotarizeUseCase;
use super::state::{UploadState, VerifyState};
use super::verify::{Verification, VerifyUseCase};
use crate::domain::{DocumentDigest, DocumentFile, DocumentPage, NotarizationReceipt};
use crate::error::NotaryError;
use crate::infrastructure::{Ledger, StorageGateway};
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// The result of one workflow run as the operator sees it: every status
/// line shown along the way, and either the value or the error behind the
/// last one.
#[derive(Debug)]
pub struct Outcome<T> {
    pub history: Vec<String>,
    pub result: Result<T, NotaryError>,
}

impl<T> Outcome<T> {
    fn new(history: Vec<String>, result: Result<T, NotaryError>) -> Self {
        Self { history, result }
    }

    /// The line currently on screen.
    pub fn status(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, workflow: &'static str) -> Result<Self, NotaryError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(flag))
            .map_err(|_| NotaryError::Busy(workflow))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Entry point for the upload and verification workflows.
///
/// At most one upload and one verification run at a time; a second call
/// while one is in flight is refused with `Busy`. Failures never escape as
/// panics or bare errors: they end up in the returned `Outcome`.
pub struct Notary {
    ledger: Arc<dyn Ledger>,
    notarize: Option<NotarizeUseCase>,
    verify: VerifyUseCase,
    uploading: AtomicBool,
    verifying: AtomicBool,
    total_documents: AtomicU64,
}

impl Notary {
    /// Without a gateway the notary can verify but every upload fails.
    pub fn new(ledger: Arc<dyn Ledger>, gateway: Option<Arc<dyn StorageGateway>>) -> Self {
        Self {
            notarize: gateway.map(|gateway| NotarizeUseCase::new(ledger.clone(), gateway)),
            verify: VerifyUseCase::new(ledger.clone()),
            ledger,
            uploading: AtomicBool::new(false),
            verifying: AtomicBool::new(false),
            total_documents: AtomicU64::new(0),
        }
    }

    /// Build a notary and load the current ledger size, so a failed first
    /// upload still reports it. An unreachable ledger leaves it at zero.
    pub async fn start(ledger: Arc<dyn Ledger>, gateway: Option<Arc<dyn StorageGateway>>) -> Self {
        let notary = Self::new(ledger, gateway);
        if let Err(e) = notary.refresh_total().await {
            warn!("Could not load document count: {}", e);
        }
        notary
    }

    /// Last known ledger size. Only ever set from the ledger itself.
    pub fn total_documents(&self) -> u64 {
        self.total_documents.load(Ordering::Acquire)
    }

    pub async fn refresh_total(&self) -> Result<u64, NotaryError> {
        let total = self.ledger.count().await?;
        self.total_documents.store(total, Ordering::Release);
        Ok(total)
    }

    pub async fn upload(&self, file: Option<&DocumentFile>) -> Outcome<NotarizationReceipt> {
        let _guard = match BusyGuard::acquire(&self.uploading, "upload") {
            Ok(guard) => guard,
            Err(e) => return Outcome::new(vec![format!("Error: {}", e)], Err(e)),
        };

        let file = match file {
            Some(file) => file,
            None => {
                let err = NotaryError::MissingInput("Please select a file first!".to_string());
                return Outcome::new(vec![err.to_string()], Err(err));
            }
        };

        let notarize = match &self.notarize {
            Some(notarize) => notarize,
            None => {
                let err = NotaryError::StorageUpload("no storage gateway configured".to_string());
                return Outcome::new(vec![format!("Error: {}", err)], Err(err));
            }
        };

        let mut history = Vec::new();
        let result = notarize
            .execute_with(file, |state: &UploadState| show(&mut history, state.status()))
            .await;

        if result.is_ok() {
            if let Err(e) = self.refresh_total().await {
                warn!("Could not refresh document count: {}", e);
            }
        }

        Outcome::new(history, result)
    }

    pub async fn verify_digest(&self, input: &str) -> Outcome<Verification> {
        let _guard = match BusyGuard::acquire(&self.verifying, "verification") {
            Ok(guard) => guard,
            Err(e) => return Outcome::new(vec![format!("Error: {}", e)], Err(e)),
        };

        let mut history = Vec::new();
        let result = self
            .verify
            .by_digest_with(input, |state: &VerifyState| show(&mut history, state.status()))
            .await;

        Self::finish_verification(history, result)
    }

    pub async fn verify_file(&self, file: Option<&DocumentFile>) -> Outcome<Verification> {
        let _guard = match BusyGuard::acquire(&self.verifying, "verification") {
            Ok(guard) => guard,
            Err(e) => return Outcome::new(vec![format!("Error: {}", e)], Err(e)),
        };

        let file = match file {
            Some(file) => file,
            None => {
                let err = NotaryError::MissingInput("Please choose a file to verify!".to_string());
                return Outcome::new(vec![err.to_string()], Err(err));
            }
        };

        let mut history = Vec::new();
        let result = self
            .verify
            .by_file_with(file, |state: &VerifyState| show(&mut history, state.status()))
            .await;

        Self::finish_verification(history, result)
    }

    pub async fn list(&self, offset: u64, limit: u64) -> Result<DocumentPage, NotaryError> {
        Ok(self.ledger.list(offset, limit).await?)
    }

    pub async fn history(&self, uploader: &str) -> Result<Vec<DocumentDigest>, NotaryError> {
        if uploader.trim().is_empty() {
            return Err(NotaryError::MissingInput("Please enter an uploader address!".to_string()));
        }
        Ok(self.ledger.digests_by_uploader(uploader.trim()).await?)
    }

    fn finish_verification(
        mut history: Vec<String>,
        result: Result<Verification, NotaryError>,
    ) -> Outcome<Verification> {
        // Input errors are rejected before the workflow starts and so
        // never produce a status line of their own
        if let Err(e) = &result {
            let line = match e {
                NotaryError::MissingInput(_) => e.to_string(),
                _ => format!("Error: {}", e),
            };
            show(&mut history, line);
        }
        Outcome::new(history, result)
    }
}

/// Append a status line unless it is already the one on screen.
fn show(history: &mut Vec<String>, line: String) {
    if !line.is_empty() && history.last() != Some(&line) {
        history.push(line);
    }
}
