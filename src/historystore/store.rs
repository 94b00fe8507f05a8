use crate::config::DatabaseLocation;
use crate::exceptions::CadasterError;
use crate::models::{HistoryRecord, NewHistoryRecord};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    cadastral_number TEXT    NOT NULL,
    latitude         REAL    NOT NULL,
    longitude        REAL    NOT NULL,
    server_response  INTEGER NOT NULL,
    created_at       TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
CREATE INDEX IF NOT EXISTS ix_history_cadastral_number ON history (cadastral_number);
";

/// Bounds how long a write waits on a lock held by another connection.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COLUMNS: &str = "id, cadastral_number, latitude, longitude, server_response, created_at";

/// Owns the persisted collection of history records.
///
/// Cloning is cheap and yields a handle to the same connection. Every
/// operation runs in its own transaction; returning early drops the
/// transaction, which rolls it back.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    pub fn open(location: &DatabaseLocation) -> Result<Self, CadasterError> {
        let conn = match location {
            DatabaseLocation::Memory => Connection::open_in_memory()?,
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn
            }
        };
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, CadasterError> {
        Self::open(&DatabaseLocation::Memory)
    }

    fn from_connection(conn: Connection) -> Result<Self, CadasterError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persists a candidate and returns it with its assigned id and timestamp.
    pub fn create(&self, candidate: &NewHistoryRecord) -> Result<HistoryRecord, CadasterError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let record = tx.query_row(
            &format!(
                "INSERT INTO history (cadastral_number, latitude, longitude, server_response)
                 VALUES (?1, ?2, ?3, ?4) RETURNING {COLUMNS}"
            ),
            params![
                candidate.cadastral_number,
                candidate.latitude,
                candidate.longitude,
                candidate.server_response
            ],
            map_record,
        )?;
        tx.commit()?;
        debug!(id = record.id, cadastral_number = %record.cadastral_number, "history record created");
        Ok(record)
    }

    /// With a filter, returns every matching record and ignores `skip`/`limit`.
    /// Without one, returns at most `limit` records starting at `skip`.
    /// Both are in insertion order.
    pub fn list(
        &self,
        cadastral_number: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<HistoryRecord>, CadasterError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let records = match cadastral_number {
            Some(number) => select_records(
                &tx,
                &format!("SELECT {COLUMNS} FROM history WHERE cadastral_number = ?1 ORDER BY id"),
                params![number],
            )?,
            None => select_records(
                &tx,
                &format!("SELECT {COLUMNS} FROM history ORDER BY id LIMIT ?1 OFFSET ?2"),
                params![clamp_i64(limit), clamp_i64(skip)],
            )?,
        };
        tx.commit()?;
        debug!(count = records.len(), filtered = cadastral_number.is_some(), "history listed");
        Ok(records)
    }

    pub fn delete_all(&self) -> Result<(), CadasterError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM history", [])?;
        tx.commit()?;
        debug!(removed, "history cleared");
        Ok(())
    }

    /// Returns the removed record, or `None` when no record has this id.
    pub fn delete_by_id(&self, id: i64) -> Result<Option<HistoryRecord>, CadasterError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx
            .query_row(
                &format!("DELETE FROM history WHERE id = ?1 RETURNING {COLUMNS}"),
                params![id],
                map_record,
            )
            .optional()?;
        tx.commit()?;
        debug!(id, found = removed.is_some(), "history record delete");
        Ok(removed)
    }

    pub fn count(&self) -> Result<u64, CadasterError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    // --- Helpers ---

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CadasterError> {
        self.conn
            .lock()
            .map_err(|_| CadasterError::Store("connection lock poisoned".to_string()))
    }
}

fn select_records(
    tx: &Transaction<'_>,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<HistoryRecord>, CadasterError> {
    let mut stmt = tx.prepare(sql)?;
    let rows = stmt.query_map(params, map_record)?;
    let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    let created_at: String = row.get(5)?;
    let created_at = OffsetDateTime::parse(&created_at, &Rfc3339).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(HistoryRecord {
        id: row.get(0)?,
        cadastral_number: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        server_response: row.get(4)?,
        created_at,
    })
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
