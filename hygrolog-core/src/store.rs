//! Bounded Ring Store over SQLite
//!
//! ## Overview
//!
//! Durable storage for the most recent composite readings. The store behaves
//! like a ring: every insert that pushes the row count past the configured
//! capacity evicts the oldest rows in the same transaction, so the invariant
//! `count <= capacity` holds after every completed save.
//!
//! ```text
//! save ─▶ BEGIN ─▶ INSERT ─▶ COUNT ─▶ DELETE oldest overflow ─▶ COMMIT
//! ```
//!
//! ## Concurrency Discipline
//!
//! Insert and evict must be one atomic unit. If two concurrent savers could
//! each observe a pre-eviction count and both skip eviction, the store would
//! grow without bound. Two layers guarantee the critical section:
//!
//! - an in-process `parking_lot::Mutex` serializes callers sharing one
//!   `RingStore` (one-shot and continuous acquisition, query readers);
//! - the SQLite transaction (WAL journal) protects against other processes
//!   sharing the same database file.
//!
//! ## Schema
//!
//! ```text
//! sensor_readings(
//!     id          INTEGER PRIMARY KEY AUTOINCREMENT,
//!     timestamp   TEXT NOT NULL,     -- RFC 3339 UTC, fixed width
//!     device_id   TEXT NOT NULL,
//!     temperature REAL,
//!     humidity    REAL,
//!     battery     INTEGER
//! )
//! idx_timestamp ON sensor_readings(timestamp)
//! ```
//!
//! Rows written by this crate always carry both measurements; the capacity
//! invariant is enforced here, not by schema constraints. Eviction orders by
//! `timestamp ASC, id ASC` so equal timestamps fall back to insertion order.
//!
//! Persistence failure is never fatal to acquisition: `save` reports a
//! [`StoreError`] and the caller decides whether to retry.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::StoreError;
use crate::reading::Reading;

/// Durable store holding at most `capacity` most-recent readings
pub struct RingStore {
    conn: Mutex<Connection>,
    capacity: usize,
}

impl RingStore {
    /// Open (or create) the store at `path`
    ///
    /// Schema creation is idempotent; opening an existing store repeatedly
    /// is safe and keeps its rows.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, StoreError> {
        let conn = Connection::open(&path)?;

        // WAL keeps concurrent readers off the writers' lock
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;

        let store = Self {
            conn: Mutex::new(conn),
            capacity,
        };
        store.init_schema()?;
        info!(
            "ring store ready at {} (capacity {})",
            path.as_ref().display(),
            capacity
        );
        Ok(store)
    }

    /// Open an in-memory store, mainly for tests and ephemeral sessions
    pub fn in_memory(capacity: usize) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            capacity,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sensor_readings (
                 id          INTEGER PRIMARY KEY AUTOINCREMENT,
                 timestamp   TEXT NOT NULL,
                 device_id   TEXT NOT NULL,
                 temperature REAL,
                 humidity    REAL,
                 battery     INTEGER
             );
             CREATE INDEX IF NOT EXISTS idx_timestamp
                 ON sensor_readings(timestamp);",
        )?;
        Ok(())
    }

    /// Retained-reading capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a reading and evict the oldest overflow atomically
    ///
    /// After a successful return the store holds at most `capacity` rows and
    /// the inserted reading is among them (unless capacity is zero).
    pub fn save(&self, reading: &Reading) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO sensor_readings (timestamp, device_id, temperature, humidity, battery)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reading.timestamp_text(),
                reading.device_id,
                reading.temperature,
                reading.humidity,
                reading.battery,
            ],
        )?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM sensor_readings", [], |row| {
            row.get(0)
        })?;
        let overflow = count - self.capacity as i64;
        if overflow > 0 {
            // Oldest first; ties on timestamp fall back to insertion order
            tx.execute(
                "DELETE FROM sensor_readings
                 WHERE id IN (
                     SELECT id FROM sensor_readings
                     ORDER BY timestamp ASC, id ASC
                     LIMIT ?1
                 )",
                params![overflow],
            )?;
            debug!("evicted {overflow} oldest reading(s)");
        }

        tx.commit()?;
        Ok(())
    }

    /// Most-recent readings, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT timestamp, device_id, temperature, humidity, battery
             FROM sensor_readings
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, Option<u8>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(timestamp, device_id, temperature, humidity, battery)| {
                let timestamp = parse_timestamp(&timestamp)?;
                Ok(Reading::new(timestamp, device_id, temperature, humidity, battery))
            })
            .collect()
    }

    /// Most-recent readings up to the store's capacity
    pub fn recent_default(&self) -> Result<Vec<Reading>, StoreError> {
        self.recent(self.capacity)
    }

    /// Latest reading, if any
    pub fn latest(&self) -> Result<Option<Reading>, StoreError> {
        Ok(self.recent(1)?.into_iter().next())
    }

    /// Number of rows currently held
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sensor_readings", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);
        Ok(count as usize)
    }

    /// Delete every row, unconditionally
    ///
    /// Any confirmation prompt belongs to the interactive layer; this
    /// operation is immediate by contract.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM sensor_readings", [])?;
        info!("ring store cleared");
        Ok(())
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::CorruptTimestamp(text.to_owned()))
}
