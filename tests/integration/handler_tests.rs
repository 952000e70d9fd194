use super::helpers::*;
use docnotary::domain::{DocumentDigest, StoragePointer};
use docnotary::error::NotaryError;
use docnotary::handlers::{
    build_gateway, build_ledger, handle_count, handle_history, handle_list, handle_upload,
    handle_verify_file, handle_verify_hash,
};
use docnotary::infrastructure::Ledger;
use docnotary::Notary;

fn notary_against(url: &str) -> Notary {
    let ledger = build_ledger(&rpc_ledger_config(url)).unwrap();
    let gateway = build_gateway(&gateway_config(url));
    Notary::new(ledger, Some(gateway))
}

#[tokio::test]
async fn test_upload_then_verify_file() {
    let (services, url) = start_services().await;
    let notary = notary_against(&url);
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "lease.txt", b"Tenant agrees to water the plants.");

    let mut out: Vec<u8> = Vec::new();
    let ok = handle_upload(&notary, &path, None, false, &mut out).await.unwrap();
    let text = output(out);

    assert!(ok, "upload failed:\n{}", text);
    assert!(text.contains("Upload successful!"));
    assert!(text.contains("IPFS CID: bafymock1"));
    assert!(text.contains(&format!("URL:      {}/ipfs/bafymock1", url)));
    assert!(text.contains("Total documents: 1"));
    assert_eq!(services.uploads(), vec!["lease.txt".to_string()]);

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_verify_file(&notary, &path, false, &mut out).await.unwrap());
    let text = output(out);
    assert!(text.contains("File is VALID! It has not been modified."));
    assert!(text.contains("File name: lease.txt"));
    assert!(text.contains(&format!("Uploader:  {}", ACCOUNT)));

    let tampered = write_file(&dir, "lease.txt", b"Tenant agrees to water the plants!");
    let mut out: Vec<u8> = Vec::new();
    assert!(handle_verify_file(&notary, &tampered, false, &mut out).await.unwrap());
    assert!(output(out).contains("This file is NOT REGISTERED or HAS BEEN MODIFIED"));
}

#[tokio::test]
async fn test_verify_hash_json() {
    let (_services, url) = start_services().await;
    let notary = notary_against(&url);
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "hello.txt", b"hello");
    handle_upload(&notary, &path, None, false, &mut Vec::<u8>::new())
        .await
        .unwrap();

    let mut out: Vec<u8> = Vec::new();
    let ok = handle_verify_hash(
        &notary,
        "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824",
        true,
        &mut out,
    )
    .await
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert!(ok);
    assert_eq!(value["type"], "verification");
    assert_eq!(value["exists"], true);
    assert_eq!(
        value["digest"],
        "0x2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(value["document"]["storage_pointer"], "bafymock1");
    assert_eq!(value["metadata"]["filename"], "hello.txt");
    assert_eq!(value["metadata"]["type"], "text/plain");
    assert_eq!(value["status"], "Document is valid!");
}

#[tokio::test]
async fn test_verify_unknown_and_malformed_hash() {
    let (_services, url) = start_services().await;
    let notary = notary_against(&url);

    let mut out: Vec<u8> = Vec::new();
    let unknown = DocumentDigest::of(b"never uploaded");
    assert!(handle_verify_hash(&notary, unknown.as_str(), false, &mut out)
        .await
        .unwrap());
    assert!(output(out).contains("Document does not exist!"));

    let mut out: Vec<u8> = Vec::new();
    assert!(!handle_verify_hash(&notary, "0x1234", false, &mut out)
        .await
        .unwrap());
    assert!(output(out).starts_with("Error: "));

    let mut out: Vec<u8> = Vec::new();
    assert!(!handle_verify_hash(&notary, "", false, &mut out).await.unwrap());
    assert_eq!(output(out), "Please enter a hash!\n");
}

#[tokio::test]
async fn test_upload_json_and_duplicate() {
    let (services, url) = start_services().await;
    let notary = notary_against(&url);
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "report.pdf", b"%PDF-1.4 quarterly");

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_upload(&notary, &path, None, true, &mut out).await.unwrap());
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["type"], "notarization_receipt");
    assert_eq!(value["receipt"]["cid"], "bafymock1");
    assert_eq!(value["total_documents"], 1);

    let mut out: Vec<u8> = Vec::new();
    assert!(!handle_upload(&notary, &path, None, true, &mut out).await.unwrap());
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(value["error"].as_str().unwrap().contains("already exists"));
    assert_eq!(value["total_documents"], 1);

    // The second copy was pinned before the ledger refused it
    assert_eq!(services.uploads().len(), 2);
    assert_eq!(services.document_count(), 1);
}

#[tokio::test]
async fn test_upload_unreadable_file() {
    let (services, url) = start_services().await;
    let notary = notary_against(&url);
    let dir = tempfile::tempdir().unwrap();

    let mut out: Vec<u8> = Vec::new();
    let ok = handle_upload(&notary, &dir.path().join("missing.pdf"), None, false, &mut out)
        .await
        .unwrap();

    assert!(!ok);
    assert!(output(out).starts_with("Error: Could not read file"));
    assert!(services.uploads().is_empty());
}

#[tokio::test]
async fn test_count_list_and_history() {
    let (services, url) = start_services().await;
    let first = DocumentDigest::of(b"one");
    let second = DocumentDigest::of(b"two");
    services.seed_document(first.as_str(), "bafy1", ACCOUNT, "{}");
    services.seed_document(second.as_str(), "bafy2", "0xsomeoneelse", "{}");
    let notary = notary_against(&url);

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_count(&notary, &mut out).await.unwrap());
    assert_eq!(output(out), "Total documents: 2\n");
    assert_eq!(notary.total_documents(), 2);

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_list(&notary, 0, 10, false, &mut out).await.unwrap());
    let text = output(out);
    assert!(text.contains(&format!("#0 {}", first)));
    assert!(text.contains(&format!("#1 {}", second)));
    assert!(text.contains("Showing 2 of 2 documents"));

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_list(&notary, 1, 10, true, &mut out).await.unwrap());
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["type"], "document_list");
    assert_eq!(value["offset"], 1);
    assert_eq!(value["digests"][0], second.as_str());

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_history(&notary, ACCOUNT, &mut out).await.unwrap());
    let text = output(out);
    assert!(text.contains(first.as_str()));
    assert!(!text.contains(second.as_str()));
}

#[tokio::test]
async fn test_sqlite_backend_end_to_end() {
    let (_services, url) = start_services().await;
    let db = TestDatabase::new();
    let ledger = build_ledger(&db.ledger_config()).unwrap();
    let notary = Notary::new(ledger, Some(build_gateway(&gateway_config(&url))));
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "memo.txt", b"local ledger");

    assert!(handle_upload(&notary, &path, None, false, &mut Vec::<u8>::new())
        .await
        .unwrap());

    // A fresh process sees the same ledger file
    let reopened = Notary::new(build_ledger(&db.ledger_config()).unwrap(), None);
    let mut out: Vec<u8> = Vec::new();
    assert!(handle_verify_file(&reopened, &path, false, &mut out).await.unwrap());
    assert!(output(out).contains("File is VALID!"));
}

#[tokio::test]
async fn test_sqlite_falls_back_to_memory() {
    let mut config = TestDatabase::new().ledger_config();
    config.db_path = "/nonexistent/notary/dir/notary.db".to_string();

    let ledger = build_ledger(&config).unwrap();

    assert_eq!(ledger.count().await.unwrap(), 0);
}

#[test]
fn test_rpc_backend_requires_provider() {
    let mut config = rpc_ledger_config("http://127.0.0.1:1");
    config.provider_url = String::new();

    assert!(matches!(
        build_ledger(&config),
        Err(NotaryError::ProviderUnavailable(_))
    ));
}

#[tokio::test]
async fn test_list_offset_at_u64_max() {
    let db = TestDatabase::new();
    let ledger = build_ledger(&db.ledger_config()).unwrap();
    ledger
        .put_record(
            &DocumentDigest::of(b"lonely"),
            &StoragePointer {
                cid: "bafylonely".to_string(),
                url: "http://gateway.test/ipfs/bafylonely".to_string(),
            },
            "{}",
        )
        .await
        .unwrap();
    let notary = Notary::new(ledger, None);

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_list(&notary, u64::MAX, 10, false, &mut out).await.unwrap());
    assert_eq!(output(out), "Showing 0 of 1 documents\n");

    let mut out: Vec<u8> = Vec::new();
    assert!(handle_list(&notary, u64::MAX - 1, 10, true, &mut out).await.unwrap());
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["offset"], u64::MAX - 1);
    assert_eq!(value["digests"].as_array().unwrap().len(), 0);
    assert_eq!(value["total"], 1);
}

#[tokio::test]
async fn test_started_notary_reports_ledger_size_on_failed_upload() {
    let (services, url) = start_services().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "deed.txt", b"already on the ledger");
    let existing = DocumentDigest::of(b"already on the ledger");
    services.seed_document(existing.as_str(), "bafyseed1", ACCOUNT, "{}");
    services.seed_document(DocumentDigest::of(b"other").as_str(), "bafyseed2", ACCOUNT, "{}");

    let ledger = build_ledger(&rpc_ledger_config(&url)).unwrap();
    let notary = Notary::start(ledger, Some(build_gateway(&gateway_config(&url)))).await;

    let mut out: Vec<u8> = Vec::new();
    assert!(!handle_upload(&notary, &path, None, true, &mut out).await.unwrap());
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(value["error"].as_str().unwrap().contains("already exists"));
    assert_eq!(value["total_documents"], 2);
}

#[tokio::test]
async fn test_started_notary_survives_unreachable_ledger() {
    let ledger = build_ledger(&rpc_ledger_config("http://127.0.0.1:1")).unwrap();

    let notary = Notary::start(ledger, None).await;

    assert_eq!(notary.total_documents(), 0);
}

#[tokio::test]
async fn test_https_gateway_url_is_dialed() {
    let db = TestDatabase::new();
    let ledger = build_ledger(&db.ledger_config()).unwrap();
    let mut config = gateway_config("https://127.0.0.1:1");
    config.upload_url = "https://127.0.0.1:1/v3/files".to_string();
    let notary = Notary::new(ledger, Some(build_gateway(&config)));
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "contract.txt", b"signed over tls");

    let mut out: Vec<u8> = Vec::new();
    assert!(!handle_upload(&notary, &path, None, false, &mut out).await.unwrap());
    let text = output(out);

    assert!(text.contains("gateway unreachable"), "unexpected output:\n{}", text);
    assert!(!text.contains("scheme is not http"), "https was refused:\n{}", text);
}

#[tokio::test]
async fn test_https_provider_url_is_dialed() {
    let config = rpc_ledger_config("https://127.0.0.1:1");
    let notary = Notary::new(build_ledger(&config).unwrap(), None);

    let mut out: Vec<u8> = Vec::new();
    assert!(!handle_count(&notary, &mut out).await.unwrap());
    let text = output(out);

    assert!(text.starts_with("Error: "));
    assert!(!text.contains("scheme is not http"), "https was refused:\n{}", text);
}
