use super::notary::Outcome;
use super::verify::Verification;
use crate::domain::{DocumentDigest, DocumentMetadata, DocumentPage, NotarizationReceipt, VerificationResult};
use serde::Serialize;

/// `--json` rendering of an upload run.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<NotarizationReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_documents: u64,
}

impl UploadResponse {
    pub fn from_outcome(outcome: &Outcome<NotarizationReceipt>, total_documents: u64) -> Self {
        Self {
            response_type: "notarization_receipt".to_string(),
            status: outcome.status().to_string(),
            receipt: outcome.result.as_ref().ok().cloned(),
            error: outcome.result.as_ref().err().map(|e| e.to_string()),
            total_documents,
        }
    }
}

/// `--json` rendering of a verification run.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub status: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<DocumentDigest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<VerificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResponse {
    pub fn from_outcome(outcome: &Outcome<Verification>) -> Self {
        let verification = outcome.result.as_ref().ok();
        let document = verification.and_then(Verification::result).cloned();

        Self {
            response_type: "verification".to_string(),
            status: outcome.status().to_string(),
            exists: verification.map(Verification::is_registered).unwrap_or(false),
            digest: verification.map(|v| v.digest().clone()),
            metadata: document.as_ref().and_then(VerificationResult::parsed_metadata),
            document,
            error: outcome.result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

/// `--json` rendering of a ledger listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub offset: u64,
    pub total: u64,
    pub digests: Vec<DocumentDigest>,
}

impl ListResponse {
    pub fn from_page(offset: u64, page: DocumentPage) -> Self {
        Self {
            response_type: "document_list".to_string(),
            offset,
            total: page.total,
            digests: page.digests,
        }
    }
}
