use super::state::{upload_transition, UploadEffect, UploadEvent, UploadState};
use crate::domain::{DocumentFile, DocumentMetadata, NotarizationReceipt};
use crate::error::NotaryError;
use crate::infrastructure::{Ledger, StorageGateway};
use log::{error, info};
use std::sync::Arc;

/// Drives one file through hash -> upload -> ledger write -> confirmation.
///
/// Nothing is rolled back: if the write fails after the upload succeeded,
/// the file stays pinned and the caller sees the ledger's error.
pub struct NotarizeUseCase {
    ledger: Arc<dyn Ledger>,
    gateway: Arc<dyn StorageGateway>,
}

impl NotarizeUseCase {
    pub fn new(ledger: Arc<dyn Ledger>, gateway: Arc<dyn StorageGateway>) -> Self {
        Self { ledger, gateway }
    }

    pub async fn execute(&self, file: &DocumentFile) -> Result<NotarizationReceipt, NotaryError> {
        self.execute_with(file, |_| {}).await
    }

    /// Run the workflow, reporting every state it enters.
    pub async fn execute_with<F>(
        &self,
        file: &DocumentFile,
        mut on_state: F,
    ) -> Result<NotarizationReceipt, NotaryError>
    where
        F: FnMut(&UploadState) + Send,
    {
        let mut state = UploadState::Idle;
        let mut event = UploadEvent::FileSelected;
        let mut failure: Option<NotaryError> = None;

        loop {
            let (next, effect) = upload_transition(state, event);
            state = next;
            info!("Notarization of {}: {}", file.file_name, state.name());
            on_state(&state);

            event = match effect {
                UploadEffect::ComputeDigest => UploadEvent::Hashed(file.digest()),
                UploadEffect::Upload => match self.gateway.upload(file).await {
                    Ok(pointer) => UploadEvent::Uploaded(pointer),
                    Err(e) => Self::fail(&mut failure, e.into()),
                },
                UploadEffect::PutRecord { digest, pointer } => {
                    let metadata = DocumentMetadata::for_file(file, chrono::Utc::now())
                        .to_json()
                        .map_err(|e| NotaryError::UnknownRemote(e.to_string()));
                    match metadata {
                        Ok(metadata) => {
                            match self.ledger.submit_record(&digest, &pointer, &metadata).await {
                                Ok(transaction_hash) => UploadEvent::Submitted(transaction_hash),
                                Err(e) => Self::fail(&mut failure, e.into()),
                            }
                        }
                        Err(e) => Self::fail(&mut failure, e),
                    }
                }
                UploadEffect::AwaitConfirmation { transaction_hash } => {
                    match self.ledger.await_confirmation(&transaction_hash).await {
                        Ok(receipt) => UploadEvent::Confirmed(receipt),
                        Err(e) => Self::fail(&mut failure, e.into()),
                    }
                }
                UploadEffect::Publish(receipt) => {
                    info!(
                        "Notarized {} as {} (tx {})",
                        file.file_name, receipt.digest, receipt.transaction_hash
                    );
                    return Ok(receipt);
                }
                UploadEffect::None => break,
            };
        }

        match (state, failure) {
            (_, Some(err)) => Err(err),
            (UploadState::Failed(reason), None) => Err(NotaryError::UnknownRemote(reason)),
            (other, None) => Err(NotaryError::UnknownRemote(format!(
                "notarization stopped while {}",
                other.name()
            ))),
        }
    }

    fn fail(slot: &mut Option<NotaryError>, err: NotaryError) -> UploadEvent {
        error!("Notarization failed: {}", err);
        let reason = err.to_string();
        *slot = Some(err);
        UploadEvent::Failed(reason)
    }
}
