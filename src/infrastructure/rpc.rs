use super::ledger::{Ledger, LedgerError};
use crate::domain::{DocumentDigest, DocumentPage, DocumentRecord, StoragePointer, TransactionReceipt};
use async_trait::async_trait;
use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, Uri};
use json::JsonValue;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Where and as whom the ledger contract is reached.
#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub provider_url: String,
    pub contract_address: String,
    pub account: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

/// Ledger client speaking JSON-RPC 2.0 to a provider that fronts the
/// document contract.
///
/// Methods are named after the contract's functions and take the contract
/// address as their first parameter. Writes are signed by the provider on
/// behalf of `account`.
pub struct RpcLedger<C = HttpConnector> {
    client: Client<C>,
    settings: RpcSettings,
    next_id: AtomicU64,
}

impl<C> RpcLedger<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn connect(client: Client<C>, settings: RpcSettings) -> Result<Self, LedgerError> {
        if settings.provider_url.trim().is_empty() {
            return Err(LedgerError::ProviderUnavailable(
                "no provider URL configured".to_string(),
            ));
        }
        if settings.provider_url.parse::<Uri>().is_err() {
            return Err(LedgerError::ProviderUnavailable(format!(
                "invalid provider URL '{}'",
                settings.provider_url
            )));
        }

        info!(
            "Using ledger contract {} via {}",
            settings.contract_address, settings.provider_url
        );

        Ok(Self {
            client,
            settings,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: JsonValue) -> Result<Value, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json::object! {
            "jsonrpc" => "2.0",
            "id" => id,
            "method" => method,
            "params" => params
        };

        debug!("-> {}", body.dump());

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.settings.provider_url.as_str())
            .header("content-type", "application/json")
            .body(Body::from(body.dump()))
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "provider answered HTTP {}",
                response.status()
            )));
        }

        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let reply: Value =
            serde_json::from_slice(&bytes).map_err(|e| LedgerError::Malformed(e.to_string()))?;

        debug!("<- {}", reply);

        if let Some(err) = reply.get("error").filter(|e| !e.is_null()) {
            let message = err["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(LedgerError::Rpc(message));
        }

        Ok(reply.get("result").cloned().unwrap_or(Value::Null))
    }

    fn contract(&self) -> &str {
        &self.settings.contract_address
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        let s = value.as_str()?;
        match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        }
    })
}

fn as_digest(value: &Value) -> Result<DocumentDigest, LedgerError> {
    let raw = value
        .as_str()
        .ok_or_else(|| LedgerError::Malformed(format!("expected a digest, got {}", value)))?;
    DocumentDigest::parse(raw).map_err(|e| LedgerError::Malformed(e.to_string()))
}

fn as_digests(value: &Value) -> Result<Vec<DocumentDigest>, LedgerError> {
    value
        .as_array()
        .ok_or_else(|| LedgerError::Malformed(format!("expected a digest list, got {}", value)))?
        .iter()
        .map(as_digest)
        .collect()
}

/// The contract answers tuples either as named objects or positionally.
fn field<'a>(value: &'a Value, name: &str, position: usize) -> &'a Value {
    match value {
        Value::Array(items) => items.get(position).unwrap_or(&Value::Null),
        other => &other[name],
    }
}

fn is_reverted(status: &Value) -> bool {
    match status {
        Value::Bool(ok) => !ok,
        other => as_u64(other) == Some(0),
    }
}

#[async_trait]
impl<C> Ledger for RpcLedger<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    async fn exists(&self, digest: &DocumentDigest) -> Result<bool, LedgerError> {
        let result = self
            .call("documentExists", json::array![self.contract(), digest.as_str()])
            .await?;

        result
            .as_bool()
            .ok_or_else(|| LedgerError::Malformed(format!("expected a bool, got {}", result)))
    }

    async fn get_record(&self, digest: &DocumentDigest) -> Result<DocumentRecord, LedgerError> {
        let result = self
            .call("getDocument", json::array![self.contract(), digest.as_str()])
            .await?;

        let storage_pointer = field(&result, "ipfsCID", 0).as_str().unwrap_or_default();
        // An unknown digest reads back as a zeroed record
        if storage_pointer.is_empty() {
            return Err(LedgerError::NotFound(digest.clone()));
        }

        let timestamp = as_u64(field(&result, "timestamp", 2))
            .ok_or_else(|| LedgerError::Malformed(format!("bad record timestamp in {}", result)))?;

        Ok(DocumentRecord {
            storage_pointer: storage_pointer.to_string(),
            uploader: field(&result, "uploader", 1)
                .as_str()
                .unwrap_or_default()
                .to_string(),
            timestamp: timestamp as i64,
            metadata: field(&result, "metadata", 3)
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn submit_record(
        &self,
        digest: &DocumentDigest,
        pointer: &StoragePointer,
        metadata: &str,
    ) -> Result<String, LedgerError> {
        let params = json::array![
            self.contract(),
            digest.as_str(),
            pointer.cid.as_str(),
            metadata,
            json::object! { "from" => self.settings.account.as_str() }
        ];

        let result = match self.call("uploadDocument", params).await {
            Ok(result) => result,
            Err(LedgerError::Rpc(message)) => return Err(LedgerError::WriteRejected(message)),
            Err(e) => return Err(e),
        };

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Malformed(format!("expected a transaction hash, got {}", result)))
    }

    async fn await_confirmation(&self, transaction_hash: &str) -> Result<TransactionReceipt, LedgerError> {
        for attempt in 0..self.settings.max_polls {
            let receipt = self
                .call("getTransactionReceipt", json::array![transaction_hash])
                .await?;

            if receipt.is_null() {
                debug!(
                    "Transaction {} pending (poll {}/{})",
                    transaction_hash,
                    attempt + 1,
                    self.settings.max_polls
                );
                tokio::time::sleep(self.settings.poll_interval).await;
                continue;
            }

            if is_reverted(&receipt["status"]) {
                warn!("Transaction {} reverted", transaction_hash);
                return Err(LedgerError::WriteRejected(format!(
                    "transaction {} reverted",
                    transaction_hash
                )));
            }

            return Ok(TransactionReceipt {
                transaction_hash: transaction_hash.to_string(),
                block_number: as_u64(&receipt["blockNumber"]).unwrap_or_default(),
            });
        }

        Err(LedgerError::Unconfirmed(transaction_hash.to_string()))
    }

    async fn count(&self) -> Result<u64, LedgerError> {
        let result = self
            .call("getTotalDocuments", json::array![self.contract()])
            .await?;

        as_u64(&result).ok_or_else(|| LedgerError::Malformed(format!("expected a count, got {}", result)))
    }

    async fn digest_at(&self, index: u64) -> Result<DocumentDigest, LedgerError> {
        match self
            .call("getDocumentHashByIndex", json::array![self.contract(), index])
            .await
        {
            Ok(result) => as_digest(&result),
            Err(LedgerError::Rpc(_)) => Err(LedgerError::IndexOutOfRange(index)),
            Err(e) => Err(e),
        }
    }

    async fn digests_by_uploader(&self, uploader: &str) -> Result<Vec<DocumentDigest>, LedgerError> {
        let result = self
            .call("getDocumentsByUploader", json::array![self.contract(), uploader])
            .await?;

        as_digests(&result)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<DocumentPage, LedgerError> {
        let result = self
            .call(
                "getDocumentsPaginated",
                json::array![self.contract(), offset, limit],
            )
            .await?;

        Ok(DocumentPage {
            digests: as_digests(field(&result, "hashes", 0))?,
            total: as_u64(field(&result, "total", 1))
                .ok_or_else(|| LedgerError::Malformed(format!("bad page total in {}", result)))?,
        })
    }
}
