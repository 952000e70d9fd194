mod notarize;
mod notary;
pub mod state;
mod types;
mod verify;

pub use notarize::NotarizeUseCase;
pub use notary::{Notary, Outcome};
pub use state::{UploadState, VerifyMode, VerifyState};
pub use types::{ListResponse, UploadResponse, VerifyResponse};
pub use verify::{Verification, VerifyUseCase};
