use super::document::DocumentFile;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const METADATA_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    METADATA_VERSION
}

/// Client-side description of an uploaded file, stored on the ledger as an
/// opaque JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Records written before versioning carry no field and read as v1.
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub filename: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// ISO-8601, UTC.
    pub uploaded_at: String,
}

impl DocumentMetadata {
    pub fn for_file(file: &DocumentFile, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            version: METADATA_VERSION,
            filename: file.file_name.clone(),
            size: file.size(),
            mime_type: file.mime_type.clone(),
            uploaded_at: uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Best-effort parse; ledger metadata is never validated on write.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
