//! Upload and verification workflows as explicit state machines.
//!
//! Transitions are pure: they take the current state and an event and
//! return the next state plus the side effect the driver must perform.
//! Network calls, hashing and the clock all live in the drivers.

use crate::domain::{
    DocumentDigest, DocumentRecord, NotarizationReceipt, StoragePointer, TransactionReceipt,
    VerificationResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Hashing,
    Uploading {
        digest: DocumentDigest,
    },
    Writing {
        digest: DocumentDigest,
        pointer: StoragePointer,
    },
    Confirming {
        digest: DocumentDigest,
        pointer: StoragePointer,
        transaction_hash: String,
    },
    Done(NotarizationReceipt),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    FileSelected,
    Hashed(DocumentDigest),
    Uploaded(StoragePointer),
    Submitted(String),
    Confirmed(TransactionReceipt),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEffect {
    ComputeDigest,
    Upload,
    PutRecord {
        digest: DocumentDigest,
        pointer: StoragePointer,
    },
    AwaitConfirmation {
        transaction_hash: String,
    },
    Publish(NotarizationReceipt),
    None,
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Hashing => "hashing",
            UploadState::Uploading { .. } => "uploading",
            UploadState::Writing { .. } => "writing",
            UploadState::Confirming { .. } => "confirming",
            UploadState::Done(_) => "done",
            UploadState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Done(_) | UploadState::Failed(_))
    }

    pub fn status(&self) -> String {
        match self {
            UploadState::Idle => String::new(),
            UploadState::Hashing => "Hashing file...".to_string(),
            UploadState::Uploading { .. } => "Uploading to IPFS...".to_string(),
            UploadState::Writing { .. } => "Writing to the ledger...".to_string(),
            UploadState::Confirming { .. } => "Waiting for transaction confirmation...".to_string(),
            UploadState::Done(_) => "Upload successful!".to_string(),
            UploadState::Failed(reason) => format!("Error: {}", reason),
        }
    }
}

pub fn upload_transition(state: UploadState, event: UploadEvent) -> (UploadState, UploadEffect) {
    use UploadEffect as Fx;
    use UploadEvent as Ev;
    use UploadState as St;

    match (state, event) {
        (St::Idle, Ev::FileSelected) => (St::Hashing, Fx::ComputeDigest),
        (St::Hashing, Ev::Hashed(digest)) => (St::Uploading { digest }, Fx::Upload),
        (St::Uploading { digest }, Ev::Uploaded(pointer)) => (
            St::Writing {
                digest: digest.clone(),
                pointer: pointer.clone(),
            },
            Fx::PutRecord { digest, pointer },
        ),
        (St::Writing { digest, pointer }, Ev::Submitted(transaction_hash)) => (
            St::Confirming {
                digest,
                pointer,
                transaction_hash: transaction_hash.clone(),
            },
            Fx::AwaitConfirmation { transaction_hash },
        ),
        (
            St::Confirming {
                digest, pointer, ..
            },
            Ev::Confirmed(receipt),
        ) => {
            let result = NotarizationReceipt::new(digest, pointer, receipt.transaction_hash);
            (St::Done(result.clone()), Fx::Publish(result))
        }

        // Nothing leaves a terminal state, and Idle only moves on a file
        (st @ (St::Done(_) | St::Failed(_) | St::Idle), _) => (st, Fx::None),

        (_, Ev::Failed(reason)) => (St::Failed(reason), Fx::None),
        (st, ev) => (
            St::Failed(format!("unexpected {:?} while {}", ev, st.name())),
            Fx::None,
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    ByDigest,
    ByFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyState {
    Idle,
    Hashing,
    Checking {
        mode: VerifyMode,
        digest: DocumentDigest,
    },
    Fetching {
        mode: VerifyMode,
        digest: DocumentDigest,
    },
    Registered {
        mode: VerifyMode,
        result: VerificationResult,
    },
    NotRegistered {
        mode: VerifyMode,
        digest: DocumentDigest,
    },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyEvent {
    DigestGiven(DocumentDigest),
    FileGiven,
    Hashed(DocumentDigest),
    ExistenceChecked(bool),
    RecordFetched(DocumentRecord),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyEffect {
    ComputeDigest,
    CheckExists(DocumentDigest),
    FetchRecord(DocumentDigest),
    None,
}

impl VerifyState {
    pub fn name(&self) -> &'static str {
        match self {
            VerifyState::Idle => "idle",
            VerifyState::Hashing => "hashing",
            VerifyState::Checking { .. } => "checking",
            VerifyState::Fetching { .. } => "fetching",
            VerifyState::Registered { .. } => "registered",
            VerifyState::NotRegistered { .. } => "not registered",
            VerifyState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerifyState::Registered { .. } | VerifyState::NotRegistered { .. } | VerifyState::Failed(_)
        )
    }

    pub fn status(&self) -> String {
        match self {
            VerifyState::Idle => String::new(),
            VerifyState::Hashing => "Hashing file locally...".to_string(),
            VerifyState::Checking { mode, .. } | VerifyState::Fetching { mode, .. } => match mode {
                VerifyMode::ByDigest => "Checking...".to_string(),
                VerifyMode::ByFile => "Checking the ledger...".to_string(),
            },
            VerifyState::Registered { mode, .. } => match mode {
                VerifyMode::ByDigest => "Document is valid!".to_string(),
                VerifyMode::ByFile => "File is VALID! It has not been modified.".to_string(),
            },
            VerifyState::NotRegistered { mode, .. } => match mode {
                VerifyMode::ByDigest => "Document does not exist!".to_string(),
                VerifyMode::ByFile => {
                    "This file is NOT REGISTERED or HAS BEEN MODIFIED".to_string()
                }
            },
            VerifyState::Failed(reason) => format!("Error: {}", reason),
        }
    }
}

pub fn verify_transition(state: VerifyState, event: VerifyEvent) -> (VerifyState, VerifyEffect) {
    use VerifyEffect as Fx;
    use VerifyEvent as Ev;
    use VerifyState as St;

    match (state, event) {
        (St::Idle, Ev::DigestGiven(digest)) => (
            St::Checking {
                mode: VerifyMode::ByDigest,
                digest: digest.clone(),
            },
            Fx::CheckExists(digest),
        ),
        (St::Idle, Ev::FileGiven) => (St::Hashing, Fx::ComputeDigest),
        (St::Hashing, Ev::Hashed(digest)) => (
            St::Checking {
                mode: VerifyMode::ByFile,
                digest: digest.clone(),
            },
            Fx::CheckExists(digest),
        ),
        (St::Checking { mode, digest }, Ev::ExistenceChecked(false)) => {
            (St::NotRegistered { mode, digest }, Fx::None)
        }
        (St::Checking { mode, digest }, Ev::ExistenceChecked(true)) => (
            St::Fetching {
                mode,
                digest: digest.clone(),
            },
            Fx::FetchRecord(digest),
        ),
        (St::Fetching { mode, digest }, Ev::RecordFetched(record)) => (
            St::Registered {
                mode,
                result: VerificationResult::from_record(digest, record),
            },
            Fx::None,
        ),

        (st @ (St::Registered { .. } | St::NotRegistered { .. } | St::Failed(_) | St::Idle), _) => {
            (st, Fx::None)
        }

        (_, Ev::Failed(reason)) => (St::Failed(reason), Fx::None),
        (st, ev) => (
            St::Failed(format!("unexpected {:?} while {}", ev, st.name())),
            Fx::None,
        ),
    }
}
