use crate::domain::{DocumentFile, StoragePointer};
use async_trait::async_trait;
use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{header, Body, Client, Method, Request};
use log::{debug, info};
use thiserror::Error;

pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.pinata.cloud/v3/files";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway rejected the upload: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    #[error("Upload failed - no CID returned")]
    MissingCid,

    #[error("invalid gateway response: {0}")]
    Malformed(String),

    #[error("could not build upload request: {0}")]
    Request(#[from] hyper::http::Error),
}

/// Content-addressed file store. One upload attempt per call; callers
/// decide whether to retry.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Upload the file and resolve its retrieval URL before returning.
    async fn upload(&self, file: &DocumentFile) -> Result<StoragePointer, GatewayError>;

    fn retrieval_url(&self, cid: &str) -> String;
}

/// Pinata pinning API client.
pub struct PinataGateway<C = HttpConnector> {
    client: Client<C>,
    upload_url: String,
    gateway: String,
    jwt: String,
}

impl<C> PinataGateway<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn new(client: Client<C>, upload_url: &str, gateway: &str, jwt: &str) -> Self {
        Self {
            client,
            upload_url: upload_url.to_string(),
            gateway: gateway.trim_end_matches('/').to_string(),
            jwt: jwt.to_string(),
        }
    }

    /// Percent-encode the characters that would end a quoted header value
    /// or start a new header line.
    fn header_safe(value: &str) -> String {
        value
            .replace('"', "%22")
            .replace('\r', "%0D")
            .replace('\n', "%0A")
    }

    fn multipart_body(boundary: &str, file: &DocumentFile) -> Vec<u8> {
        let file_name = Self::header_safe(&file.file_name);
        let mime_type = Self::header_safe(&file.mime_type);
        let mut body = Vec::with_capacity(file.content.len() + 512);

        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"network\"\r\n\r\npublic\r\n",
                b = boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n",
                b = boundary,
                name = file_name,
                mime = mime_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body
    }

    fn extract_cid(body: &str) -> Result<String, GatewayError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;

        // v3 answers with data.cid; the legacy pinning endpoint with IpfsHash
        let cid = value["data"]["cid"]
            .as_str()
            .or_else(|| value["IpfsHash"].as_str())
            .unwrap_or_default();

        if cid.is_empty() {
            return Err(GatewayError::MissingCid);
        }
        Ok(cid.to_string())
    }
}

#[async_trait]
impl<C> StorageGateway for PinataGateway<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    async fn upload(&self, file: &DocumentFile) -> Result<StoragePointer, GatewayError> {
        let boundary = format!("notary-{}", uuid::Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, file);

        info!(
            "Uploading {} ({} bytes) to {}",
            file.file_name,
            file.size(),
            self.upload_url
        );

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.upload_url.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.jwt))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!("Gateway response: {}", text);
        let cid = Self::extract_cid(&text)?;
        let url = self.retrieval_url(&cid);

        Ok(StoragePointer { cid, url })
    }

    fn retrieval_url(&self, cid: &str) -> String {
        if self.gateway.contains("://") {
            format!("{}/ipfs/{}", self.gateway, cid)
        } else {
            format!("https://{}/ipfs/{}", self.gateway, cid)
        }
    }
}
