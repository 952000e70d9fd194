use super::digest::DocumentDigest;
use std::path::Path;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A user-supplied file: its bytes, read once, plus the name and MIME type
/// it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl DocumentFile {
    pub fn new(content: Vec<u8>, file_name: &str, mime_type: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            content,
        }
    }

    /// Read a file from disk. The MIME type is guessed from the extension
    /// unless one is given.
    pub fn open(path: &Path, mime_type: Option<&str>) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime_type(path).to_string());

        Ok(Self {
            file_name,
            mime_type,
            content,
        })
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Content digest. Name and MIME type do not take part.
    pub fn digest(&self) -> DocumentDigest {
        DocumentDigest::of(&self.content)
    }
}

fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => DEFAULT_MIME_TYPE,
    }
}
