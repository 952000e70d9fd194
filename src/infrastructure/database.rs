use super::ledger::{Ledger, LedgerError};
use crate::domain::{DocumentDigest, DocumentPage, DocumentRecord, StoragePointer, TransactionReceipt};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::sync::{Mutex, MutexGuard};

/// Ledger kept in a local SQLite database.
///
/// Rows are append-only and ordered by `seq`, which doubles as the block
/// number of the write. A digest can be written once; a second write is
/// rejected, which is the duplicate policy this client relies on.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
    uploader: String,
}

impl SqliteLedger {
    pub fn new(path: &str, uploader: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        info!("Opened SQLite ledger at {}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            uploader: uploader.to_string(),
        })
    }

    pub fn new_in_memory(uploader: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            uploader: uploader.to_string(),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                digest TEXT UNIQUE NOT NULL,
                storage_pointer TEXT NOT NULL,
                uploader TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                metadata TEXT NOT NULL,
                transaction_hash TEXT UNIQUE NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_uploader ON documents(uploader)",
            [],
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Transport("ledger connection lock poisoned".to_string()))
    }

    fn row_to_digest(raw: String) -> Result<DocumentDigest, LedgerError> {
        DocumentDigest::parse(&raw).map_err(|e| LedgerError::Malformed(e.to_string()))
    }

    fn transaction_hash(
        digest: &DocumentDigest,
        cid: &str,
        uploader: &str,
        timestamp: i64,
        seq: i64,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(digest.as_str().as_bytes());
        hasher.update(cid.as_bytes());
        hasher.update(uploader.as_bytes());
        hasher.update(timestamp.to_be_bytes());
        hasher.update(seq.to_be_bytes());
        format!("0x{:x}", hasher.finalize())
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn exists(&self, digest: &DocumentDigest) -> Result<bool, LedgerError> {
        let found: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT seq FROM documents WHERE digest = ?1",
                params![digest.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    async fn get_record(&self, digest: &DocumentDigest) -> Result<DocumentRecord, LedgerError> {
        let record = self
            .conn()?
            .query_row(
                "SELECT storage_pointer, uploader, timestamp, metadata
                 FROM documents
                 WHERE digest = ?1",
                params![digest.as_str()],
                |row| {
                    Ok(DocumentRecord {
                        storage_pointer: row.get(0)?,
                        uploader: row.get(1)?,
                        timestamp: row.get(2)?,
                        metadata: row.get(3)?,
                    })
                },
            )
            .optional()?;

        record.ok_or_else(|| LedgerError::NotFound(digest.clone()))
    }

    async fn submit_record(
        &self,
        digest: &DocumentDigest,
        pointer: &StoragePointer,
        metadata: &str,
    ) -> Result<String, LedgerError> {
        let conn = self.conn()?;
        let timestamp = chrono::Utc::now().timestamp();
        let next_seq: i64 =
            conn.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM documents", [], |row| {
                row.get(0)
            })?;
        let tx_hash =
            Self::transaction_hash(digest, &pointer.cid, &self.uploader, timestamp, next_seq);

        match conn.execute(
            "INSERT INTO documents (seq, digest, storage_pointer, uploader, timestamp, metadata, transaction_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                next_seq,
                digest.as_str(),
                &pointer.cid,
                &self.uploader,
                timestamp,
                metadata,
                &tx_hash
            ],
        ) {
            Ok(_) => {
                debug!("Recorded {} at seq {} ({})", digest, next_seq, tx_hash);
                Ok(tx_hash)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::WriteRejected(format!(
                    "Document {} already exists",
                    digest
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn await_confirmation(&self, transaction_hash: &str) -> Result<TransactionReceipt, LedgerError> {
        let seq: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT seq FROM documents WHERE transaction_hash = ?1",
                params![transaction_hash],
                |row| row.get(0),
            )
            .optional()?;

        match seq {
            Some(seq) => Ok(TransactionReceipt {
                transaction_hash: transaction_hash.to_string(),
                block_number: seq as u64,
            }),
            None => Err(LedgerError::Unconfirmed(transaction_hash.to_string())),
        }
    }

    async fn count(&self) -> Result<u64, LedgerError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        Ok(count as u64)
    }

    async fn digest_at(&self, index: u64) -> Result<DocumentDigest, LedgerError> {
        // SQLite offsets are signed; anything past i64::MAX is past the end
        let offset = i64::try_from(index).map_err(|_| LedgerError::IndexOutOfRange(index))?;
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT digest FROM documents ORDER BY seq LIMIT 1 OFFSET ?1",
                params![offset],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Self::row_to_digest(raw),
            None => Err(LedgerError::IndexOutOfRange(index)),
        }
    }

    async fn digests_by_uploader(&self, uploader: &str) -> Result<Vec<DocumentDigest>, LedgerError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT digest FROM documents WHERE uploader = ?1 ORDER BY seq")?;
        let rows = stmt
            .query_map(params![uploader], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::row_to_digest).collect()
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<DocumentPage, LedgerError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let offset = match i64::try_from(offset) {
            Ok(offset) => offset,
            Err(_) => {
                return Ok(DocumentPage {
                    digests: Vec::new(),
                    total: total as u64,
                })
            }
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare("SELECT digest FROM documents ORDER BY seq LIMIT ?1 OFFSET ?2")?;
        let rows = stmt
            .query_map(params![limit, offset], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DocumentPage {
            digests: rows
                .into_iter()
                .map(Self::row_to_digest)
                .collect::<Result<_, _>>()?,
            total: total as u64,
        })
    }
}
