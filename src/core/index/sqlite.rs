//! SQLite index backend.

use super::traits::insert_each;
use super::{BatchOutcome, IndexBackend, InsertOutcome, PendingRecord, PhotoRecord};
use crate::core::fingerprint::Fingerprint;
use crate::core::metadata::{format_timestamp, parse_timestamp};
use crate::error::IndexError;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const INSERT_SQL: &str = "INSERT INTO photo_index
     (filepath, folder, filename, fingerprint, creation_time)
     VALUES (?, ?, ?, ?, ?)";

const SELECT_COLUMNS: &str =
    "SELECT id, filepath, folder, filename, fingerprint, creation_time FROM photo_index";

/// SQLite-backed persistent index
///
/// One connection behind a mutex, so every write is serialized. WAL mode lets
/// readers proceed while a batch is being written.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteIndex {
    /// Open or create an index database at the given path
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let unavailable = |reason: String| IndexError::StorageUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| unavailable(e.to_string()))?;

        Self::from_connection(conn, path.to_path_buf())
    }

    /// Open a throwaway index that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, IndexError> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|e| IndexError::StorageUnavailable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::from_connection(conn, path)
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self, IndexError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS photo_index (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filepath TEXT,
                folder TEXT,
                filename TEXT,
                fingerprint TEXT UNIQUE,
                creation_time TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_fingerprint ON photo_index (fingerprint);
            CREATE INDEX IF NOT EXISTS idx_filename ON photo_index (filename);",
        )
        .map_err(|e| IndexError::StorageUnavailable {
            path: db_path.clone(),
            reason: e.to_string(),
        })?;

        debug!(path = %db_path.display(), "index opened");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, IndexError> {
        self.conn.lock().map_err(|_| IndexError::Poisoned {
            path: self.db_path.clone(),
        })
    }

    fn write_failed(&self, err: rusqlite::Error) -> IndexError {
        IndexError::StorageUnavailable {
            path: self.db_path.clone(),
            reason: err.to_string(),
        }
    }

    fn insert_one(&self, conn: &Connection, record: &PendingRecord) -> Result<InsertOutcome, IndexError> {
        match execute_insert(conn, record) {
            Ok(id) => Ok(InsertOutcome::Inserted(id)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(self.write_failed(e)),
        }
    }
}

fn execute_insert(conn: &Connection, record: &PendingRecord) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(INSERT_SQL)?;
    stmt.execute(params![
        record.filepath.to_string_lossy(),
        record.folder,
        record.filename,
        record.fingerprint.as_str(),
        format_timestamp(&record.creation_time),
    ])?;
    Ok(conn.last_insert_rowid())
}

fn insert_all(tx: &Transaction<'_>, records: &[PendingRecord]) -> rusqlite::Result<Vec<i64>> {
    records.iter().map(|record| execute_insert(tx, record)).collect()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
    let filepath: String = row.get(1)?;
    let fingerprint: String = row.get(4)?;
    let stamp: String = row.get(5)?;
    let creation_time = parse_timestamp(&stamp).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("invalid creation_time {stamp:?}").into(),
        )
    })?;

    Ok(PhotoRecord {
        id: row.get(0)?,
        filepath: PathBuf::from(filepath),
        folder: row.get(2)?,
        filename: row.get(3)?,
        fingerprint: Fingerprint::from_hex(fingerprint),
        creation_time,
    })
}

impl IndexBackend for SqliteIndex {
    fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, IndexError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM photo_index WHERE fingerprint = ?",
                [fingerprint.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn contains_filename(&self, filename: &str) -> Result<bool, IndexError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM photo_index WHERE filename = ?",
                [filename],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&self, record: &PendingRecord) -> Result<InsertOutcome, IndexError> {
        let conn = self.lock()?;
        self.insert_one(&conn, record)
    }

    fn insert_batch(&self, records: &[PendingRecord]) -> Result<BatchOutcome, IndexError> {
        if records.is_empty() {
            return Ok(BatchOutcome {
                bulk: true,
                ..Default::default()
            });
        }

        let mut conn = self.lock()?;

        let tx = conn.transaction().map_err(|e| self.write_failed(e))?;
        match insert_all(&tx, records) {
            Ok(ids) => {
                tx.commit().map_err(|e| self.write_failed(e))?;
                debug!(count = ids.len(), "batch written in one transaction");
                return Ok(BatchOutcome {
                    inserted: ids,
                    skipped: Vec::new(),
                    bulk: true,
                });
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().map_err(|e| self.write_failed(e))?;
            }
            Err(e) => return Err(self.write_failed(e)),
        }

        info!(
            records = records.len(),
            "batch hit a duplicate fingerprint, retrying records one at a time"
        );

        let mut outcome = insert_each(records, |record| self.insert_one(&conn, record))?;
        outcome.bulk = false;
        Ok(outcome)
    }

    fn get(&self, fingerprint: &Fingerprint) -> Result<Option<PhotoRecord>, IndexError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE fingerprint = ?"),
                [fingerprint.as_str()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn count(&self) -> Result<usize, IndexError> {
        let conn = self.lock()?;
        let total = conn.query_row("SELECT COUNT(*) FROM photo_index", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })?;
        Ok(total)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<PhotoRecord>, IndexError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id LIMIT ? OFFSET ?"))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let records = stmt
            .query_map(params![limit, offset], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
