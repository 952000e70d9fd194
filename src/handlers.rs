// Command handlers behind the `notary` binary, exposed here so the
// integration tests can drive them against mock services.

use crate::application::{
    ListResponse, Notary, Outcome, UploadResponse, Verification, VerifyResponse,
};
use crate::config::{GatewayConfig, LedgerBackend, LedgerConfig};
use crate::domain::{DocumentFile, NotarizationReceipt};
use crate::error::NotaryError;
use crate::infrastructure::{
    https_client, Ledger, PinataGateway, RpcLedger, SqliteLedger, StorageGateway,
};
use log::warn;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Open the configured ledger.
///
/// The SQLite backend falls back to an in-memory database if the file
/// cannot be opened. The rpc backend needs a provider URL.
pub fn build_ledger(config: &LedgerConfig) -> Result<Arc<dyn Ledger>, NotaryError> {
    match config.backend {
        LedgerBackend::Sqlite => {
            let ledger = SqliteLedger::new(&config.db_path, &config.account).or_else(|e| {
                warn!(
                    "Could not open ledger at {} ({}), using in-memory ledger",
                    config.db_path, e
                );
                SqliteLedger::new_in_memory(&config.account)
            })?;
            Ok(Arc::new(ledger))
        }
        LedgerBackend::Rpc => {
            let ledger = RpcLedger::connect(https_client(), config.rpc_settings())?;
            Ok(Arc::new(ledger))
        }
    }
}

pub fn build_gateway(config: &GatewayConfig) -> Arc<dyn StorageGateway> {
    Arc::new(PinataGateway::new(
        https_client(),
        &config.upload_url,
        &config.gateway,
        &config.jwt,
    ))
}

fn print_history(out: &mut dyn Write, history: &[String]) -> std::io::Result<()> {
    for line in history.iter().filter(|l| !l.is_empty()) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn print_receipt(out: &mut dyn Write, receipt: &NotarizationReceipt) -> std::io::Result<()> {
    writeln!(out, "Hash:     {}", receipt.digest)?;
    writeln!(out, "IPFS CID: {}", receipt.cid)?;
    writeln!(out, "TX Hash:  {}", receipt.transaction_hash)?;
    writeln!(out, "URL:      {}", receipt.url)
}

fn print_verification(out: &mut dyn Write, verification: &Verification) -> std::io::Result<()> {
    let result = match verification.result() {
        Some(result) => result,
        None => return writeln!(out, "Hash:      {}", verification.digest()),
    };

    writeln!(out, "Hash:      {}", result.digest)?;
    writeln!(out, "IPFS CID:  {}", result.storage_pointer)?;
    writeln!(out, "Uploader:  {}", result.uploader)?;
    match result.recorded_at() {
        Some(at) => writeln!(out, "Time:      {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?,
        None => writeln!(out, "Time:      {}", result.timestamp)?,
    }
    match result.parsed_metadata() {
        Some(meta) => {
            writeln!(out, "File name: {}", meta.filename)?;
            writeln!(out, "Size:      {:.2} KB", meta.size as f64 / 1024.0)?;
        }
        None => writeln!(out, "Metadata:  {}", result.metadata)?,
    }
    Ok(())
}

pub async fn handle_upload(
    notary: &Notary,
    path: &Path,
    mime_type: Option<&str>,
    json: bool,
    out: &mut dyn Write,
) -> Result<bool, Box<dyn Error>> {
    let outcome = match DocumentFile::open(path, mime_type) {
        Ok(file) => notary.upload(Some(&file)).await,
        Err(e) => {
            let err = NotaryError::Unreadable(e);
            Outcome {
                history: vec![format!("Error: {}", err)],
                result: Err(err),
            }
        }
    };

    if json {
        let response = UploadResponse::from_outcome(&outcome, notary.total_documents());
        writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
    } else {
        print_history(out, &outcome.history)?;
        if let Ok(receipt) = &outcome.result {
            print_receipt(out, receipt)?;
            writeln!(out, "Total documents: {}", notary.total_documents())?;
        }
    }

    Ok(outcome.is_ok())
}

pub async fn handle_verify_hash(
    notary: &Notary,
    hash: &str,
    json: bool,
    out: &mut dyn Write,
) -> Result<bool, Box<dyn Error>> {
    let outcome = notary.verify_digest(hash).await;
    render_verification(&outcome, json, out)?;
    Ok(outcome.is_ok())
}

pub async fn handle_verify_file(
    notary: &Notary,
    path: &Path,
    json: bool,
    out: &mut dyn Write,
) -> Result<bool, Box<dyn Error>> {
    let outcome = match DocumentFile::open(path, None) {
        Ok(file) => notary.verify_file(Some(&file)).await,
        Err(e) => {
            let err = NotaryError::Unreadable(e);
            Outcome {
                history: vec![format!("Error: {}", err)],
                result: Err(err),
            }
        }
    };
    render_verification(&outcome, json, out)?;
    Ok(outcome.is_ok())
}

fn render_verification(
    outcome: &Outcome<Verification>,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    if json {
        let response = VerifyResponse::from_outcome(outcome);
        writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
    } else {
        print_history(out, &outcome.history)?;
        if let Ok(verification) = &outcome.result {
            print_verification(out, verification)?;
        }
    }
    Ok(())
}

pub async fn handle_count(notary: &Notary, out: &mut dyn Write) -> Result<bool, Box<dyn Error>> {
    match notary.refresh_total().await {
        Ok(total) => {
            writeln!(out, "Total documents: {}", total)?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Error: {}", e)?;
            Ok(false)
        }
    }
}

pub async fn handle_list(
    notary: &Notary,
    offset: u64,
    limit: u64,
    json: bool,
    out: &mut dyn Write,
) -> Result<bool, Box<dyn Error>> {
    let page = match notary.list(offset, limit).await {
        Ok(page) => page,
        Err(e) => {
            writeln!(out, "Error: {}", e)?;
            return Ok(false);
        }
    };

    if json {
        let response = ListResponse::from_page(offset, page);
        writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
        return Ok(true);
    }

    for (i, digest) in page.digests.iter().enumerate() {
        writeln!(out, "#{} {}", offset.saturating_add(i as u64), digest)?;
    }
    writeln!(
        out,
        "Showing {} of {} documents",
        page.digests.len(),
        page.total
    )?;
    Ok(true)
}

pub async fn handle_history(
    notary: &Notary,
    uploader: &str,
    out: &mut dyn Write,
) -> Result<bool, Box<dyn Error>> {
    match notary.history(uploader).await {
        Ok(digests) => {
            for digest in &digests {
                writeln!(out, "{}", digest)?;
            }
            writeln!(out, "{} documents uploaded by {}", digests.len(), uploader.trim())?;
            Ok(true)
        }
        Err(e) => {
            match e {
                NotaryError::MissingInput(_) => writeln!(out, "{}", e)?,
                _ => writeln!(out, "Error: {}", e)?,
            }
            Ok(false)
        }
    }
}
