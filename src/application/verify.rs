use super::state::{verify_transition, VerifyEffect, VerifyEvent, VerifyState};
use crate::domain::{DocumentDigest, DocumentFile, VerificationResult};
use crate::error::NotaryError;
use crate::infrastructure::Ledger;
use log::{error, info};
use std::sync::Arc;

/// What the ledger knows about a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Registered(VerificationResult),
    NotRegistered(DocumentDigest),
}

impl Verification {
    pub fn is_registered(&self) -> bool {
        matches!(self, Verification::Registered(_))
    }

    pub fn digest(&self) -> &DocumentDigest {
        match self {
            Verification::Registered(result) => &result.digest,
            Verification::NotRegistered(digest) => digest,
        }
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        match self {
            Verification::Registered(result) => Some(result),
            Verification::NotRegistered(_) => None,
        }
    }
}

/// Read-only lookups against the ledger, by digest or by re-hashing a
/// candidate file. A file differing by a single byte is simply not
/// registered; there is no notion of a modified document.
pub struct VerifyUseCase {
    ledger: Arc<dyn Ledger>,
}

impl VerifyUseCase {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub async fn by_digest(&self, input: &str) -> Result<Verification, NotaryError> {
        self.by_digest_with(input, |_| {}).await
    }

    pub async fn by_digest_with<F>(&self, input: &str, on_state: F) -> Result<Verification, NotaryError>
    where
        F: FnMut(&VerifyState) + Send,
    {
        if input.trim().is_empty() {
            return Err(NotaryError::MissingInput("Please enter a hash!".to_string()));
        }
        let digest = DocumentDigest::parse(input)?;

        self.run(VerifyEvent::DigestGiven(digest), None, on_state).await
    }

    pub async fn by_file(&self, file: &DocumentFile) -> Result<Verification, NotaryError> {
        self.by_file_with(file, |_| {}).await
    }

    pub async fn by_file_with<F>(
        &self,
        file: &DocumentFile,
        on_state: F,
    ) -> Result<Verification, NotaryError>
    where
        F: FnMut(&VerifyState) + Send,
    {
        self.run(VerifyEvent::FileGiven, Some(file), on_state).await
    }

    async fn run<F>(
        &self,
        first: VerifyEvent,
        file: Option<&DocumentFile>,
        mut on_state: F,
    ) -> Result<Verification, NotaryError>
    where
        F: FnMut(&VerifyState) + Send,
    {
        let mut state = VerifyState::Idle;
        let mut event = first;
        let mut failure: Option<NotaryError> = None;

        loop {
            let (next, effect) = verify_transition(state, event);
            state = next;
            info!("Verification: {}", state.name());
            on_state(&state);

            event = match effect {
                VerifyEffect::ComputeDigest => match file {
                    Some(file) => VerifyEvent::Hashed(file.digest()),
                    None => Self::fail(
                        &mut failure,
                        NotaryError::MissingInput("Please choose a file to verify!".to_string()),
                    ),
                },
                VerifyEffect::CheckExists(digest) => match self.ledger.exists(&digest).await {
                    Ok(found) => VerifyEvent::ExistenceChecked(found),
                    Err(e) => Self::fail(&mut failure, e.into()),
                },
                VerifyEffect::FetchRecord(digest) => match self.ledger.get_record(&digest).await {
                    Ok(record) => VerifyEvent::RecordFetched(record),
                    Err(e) => Self::fail(&mut failure, e.into()),
                },
                VerifyEffect::None => break,
            };
        }

        match (state, failure) {
            (_, Some(err)) => Err(err),
            (VerifyState::Registered { result, .. }, None) => Ok(Verification::Registered(result)),
            (VerifyState::NotRegistered { digest, .. }, None) => {
                Ok(Verification::NotRegistered(digest))
            }
            (VerifyState::Failed(reason), None) => Err(NotaryError::UnknownRemote(reason)),
            (other, None) => Err(NotaryError::UnknownRemote(format!(
                "verification stopped while {}",
                other.name()
            ))),
        }
    }

    fn fail(slot: &mut Option<NotaryError>, err: NotaryError) -> VerifyEvent {
        error!("Verification failed: {}", err);
        let reason = err.to_string();
        *slot = Some(err);
        VerifyEvent::Failed(reason)
    }
}
