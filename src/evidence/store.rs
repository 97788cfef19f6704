//! Durable evidence rows backed by SQLite.
//!
//! The `challans` table has columns `id`, `timestamp`, `plate`, `speed`,
//! `image_path`, `pdf_path`. Rows are only ever appended.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, params};
use tracing::info;

use crate::error::StoreError;

/// A stored issuance, as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    pub id: i64,
    pub timestamp: String,
    pub plate_text: String,
    pub speed_kmh: f64,
    pub image_path: PathBuf,
    /// Absent when the document could not be rendered
    pub document_path: Option<PathBuf>,
}

/// Row about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvidence {
    pub timestamp: String,
    pub plate_text: String,
    pub speed_kmh: f64,
    pub image_path: PathBuf,
    pub document_path: Option<PathBuf>,
}

impl NewEvidence {
    pub fn into_record(self, id: i64) -> EvidenceRecord {
        EvidenceRecord {
            id,
            timestamp: self.timestamp,
            plate_text: self.plate_text,
            speed_kmh: self.speed_kmh,
            image_path: self.image_path,
            document_path: self.document_path,
        }
    }
}

/// Append-only relation of evidence rows shared by every session.
///
/// Implementations must serialize inserts: two sessions writing at once
/// never interleave a partial row.
pub trait EvidenceStore: Send + Sync {
    /// Append `row`, returning its auto-assigned id.
    fn insert(&self, row: &NewEvidence) -> Result<i64, StoreError>;
}

/// SQLite store. All access goes through one connection behind a mutex.
#[derive(Debug, Clone)]
pub struct SqliteEvidenceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEvidenceStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = ?path.as_ref(), "opened evidence database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initializes the database schema.
    pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS challans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT,
                plate TEXT,
                speed REAL,
                image_path TEXT,
                pdf_path TEXT
            )",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Most recent rows first.
    pub fn recent(&self, limit: usize) -> Result<Vec<EvidenceRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, plate, speed, image_path, pdf_path
             FROM challans ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok(EvidenceRecord {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                plate_text: row.get(2)?,
                speed_kmh: row.get(3)?,
                image_path: PathBuf::from(row.get::<_, String>(4)?),
                document_path: row.get::<_, Option<String>>(5)?.map(PathBuf::from),
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM challans", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl EvidenceStore for SqliteEvidenceStore {
    fn insert(&self, row: &NewEvidence) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO challans (timestamp, plate, speed, image_path, pdf_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.timestamp,
                row.plate_text,
                row.speed_kmh,
                row.image_path.to_string_lossy(),
                row.document_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
