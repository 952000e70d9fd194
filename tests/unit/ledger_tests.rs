use docnotary::domain::{DocumentDigest, StoragePointer};
use docnotary::infrastructure::{Ledger, LedgerError, SqliteLedger};

const UPLOADER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

fn pointer(cid: &str) -> StoragePointer {
    StoragePointer {
        cid: cid.to_string(),
        url: format!("https://gateway.test/ipfs/{}", cid),
    }
}

#[tokio::test]
async fn test_put_then_get_record() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    let digest = DocumentDigest::of(b"first document");

    let receipt = ledger
        .put_record(&digest, &pointer("bafyfirst"), r#"{"filename":"a.txt"}"#)
        .await
        .expect("write should be accepted");

    assert!(receipt.transaction_hash.starts_with("0x"));
    assert_eq!(receipt.block_number, 1);
    assert!(ledger.exists(&digest).await.unwrap());

    let record = ledger.get_record(&digest).await.unwrap();
    assert_eq!(record.storage_pointer, "bafyfirst");
    assert_eq!(record.uploader, UPLOADER);
    assert_eq!(record.metadata, r#"{"filename":"a.txt"}"#);
    assert!(record.timestamp > 0);
}

#[tokio::test]
async fn test_unknown_digest() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    let digest = DocumentDigest::of(b"never written");

    assert!(!ledger.exists(&digest).await.unwrap());
    match ledger.get_record(&digest).await {
        Err(LedgerError::NotFound(missing)) => assert_eq!(missing, digest),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_write_rejected_and_count_unchanged() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    let digest = DocumentDigest::of(b"same content");

    ledger.put_record(&digest, &pointer("bafyone"), "{}").await.unwrap();
    assert_eq!(ledger.count().await.unwrap(), 1);

    let second = ledger.put_record(&digest, &pointer("bafytwo"), "{}").await;
    match second {
        Err(LedgerError::WriteRejected(reason)) => assert!(reason.contains("already exists")),
        other => panic!("expected WriteRejected, got {:?}", other),
    }

    assert_eq!(ledger.count().await.unwrap(), 1);
    // The original record is untouched
    assert_eq!(
        ledger.get_record(&digest).await.unwrap().storage_pointer,
        "bafyone"
    );
}

#[tokio::test]
async fn test_count_never_decreases() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    let mut last = ledger.count().await.unwrap();

    for content in ["a", "b", "a", "c", "b"] {
        let digest = DocumentDigest::of(content.as_bytes());
        let _ = ledger.put_record(&digest, &pointer(content), "{}").await;

        let now = ledger.count().await.unwrap();
        assert!(now >= last);
        last = now;
    }

    assert_eq!(last, 3);
}

#[tokio::test]
async fn test_index_and_pagination_follow_insertion_order() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    let digests: Vec<DocumentDigest> = (0..5)
        .map(|i| DocumentDigest::of(format!("doc {}", i).as_bytes()))
        .collect();

    for (i, digest) in digests.iter().enumerate() {
        ledger
            .put_record(digest, &pointer(&format!("bafy{}", i)), "{}")
            .await
            .unwrap();
    }

    assert_eq!(ledger.digest_at(0).await.unwrap(), digests[0]);
    assert_eq!(ledger.digest_at(4).await.unwrap(), digests[4]);
    assert!(matches!(
        ledger.digest_at(5).await,
        Err(LedgerError::IndexOutOfRange(5))
    ));

    let page = ledger.list(1, 2).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.digests, vec![digests[1].clone(), digests[2].clone()]);

    let tail = ledger.list(4, 10).await.unwrap();
    assert_eq!(tail.digests, vec![digests[4].clone()]);

    let past_end = ledger.list(10, 10).await.unwrap();
    assert!(past_end.digests.is_empty());
    assert_eq!(past_end.total, 5);
}

#[tokio::test]
async fn test_offsets_beyond_signed_range() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    let digest = DocumentDigest::of(b"only document");
    ledger.put_record(&digest, &pointer("bafyonly"), "{}").await.unwrap();

    let first_unsigned = i64::MAX as u64 + 1;
    for index in [first_unsigned, u64::MAX] {
        match ledger.digest_at(index).await {
            Err(LedgerError::IndexOutOfRange(got)) => assert_eq!(got, index),
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }

    for offset in [first_unsigned, u64::MAX] {
        let page = ledger.list(offset, 10).await.unwrap();
        assert!(page.digests.is_empty());
        assert_eq!(page.total, 1);
    }

    // An oversized limit just means "everything from offset"
    let all = ledger.list(0, u64::MAX).await.unwrap();
    assert_eq!(all.digests, vec![digest]);
}

#[tokio::test]
async fn test_digests_by_uploader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let path = path.to_str().unwrap();

    let alice = SqliteLedger::new(path, "0xalice").unwrap();
    let a1 = DocumentDigest::of(b"alice 1");
    let a2 = DocumentDigest::of(b"alice 2");
    alice.put_record(&a1, &pointer("bafya1"), "{}").await.unwrap();
    alice.put_record(&a2, &pointer("bafya2"), "{}").await.unwrap();
    drop(alice);

    let bob = SqliteLedger::new(path, "0xbob").unwrap();
    let b1 = DocumentDigest::of(b"bob 1");
    bob.put_record(&b1, &pointer("bafyb1"), "{}").await.unwrap();

    assert_eq!(bob.digests_by_uploader("0xalice").await.unwrap(), vec![a1, a2]);
    assert_eq!(bob.digests_by_uploader("0xbob").await.unwrap(), vec![b1]);
    assert!(bob.digests_by_uploader("0xcarol").await.unwrap().is_empty());
    assert_eq!(bob.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let path = path.to_str().unwrap();
    let digest = DocumentDigest::of(b"persistent");

    {
        let ledger = SqliteLedger::new(path, UPLOADER).unwrap();
        ledger.put_record(&digest, &pointer("bafyp"), "{}").await.unwrap();
    }

    let reopened = SqliteLedger::new(path, UPLOADER).unwrap();
    assert!(reopened.exists(&digest).await.unwrap());
    assert_eq!(reopened.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_transaction_is_unconfirmed() {
    let ledger = SqliteLedger::new_in_memory(UPLOADER).unwrap();
    assert!(matches!(
        ledger.await_confirmation("0xdeadbeef").await,
        Err(LedgerError::Unconfirmed(_))
    ));
}
