// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion counters — a single-row SQLite table accumulating the number of
// successful conversions and the cumulative size of their sources.
//
// Schema:
//   conversion_stats(
//     id          INTEGER PRIMARY KEY CHECK (id = 1),
//     files       INTEGER NOT NULL,
//     bytes       INTEGER NOT NULL,
//     updated_at  TEXT    NOT NULL    -- RFC 3339
//   )

use std::path::Path;

use chrono::Utc;
use doc2any_core::ConversionRecorder;
use doc2any_core::error::{Doc2AnyError, Result};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

fn db_err(e: rusqlite::Error) -> Doc2AnyError {
    Doc2AnyError::Database(e.to_string())
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS conversion_stats (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    files       INTEGER NOT NULL,
    bytes       INTEGER NOT NULL,
    updated_at  TEXT    NOT NULL
);";

/// Snapshot of the accumulated counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsTotals {
    pub files: u64,
    pub bytes: u64,
    pub updated_at: Option<String>,
}

/// Counters backed by a SQLite database.
pub struct ConversionStats {
    conn: Connection,
}

impl ConversionStats {
    /// Open (or create) the stats database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("conversion stats opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Add `files` conversions totalling `bytes` source bytes.
    #[instrument(skip(self))]
    pub fn record(&self, files: u64, bytes: u64) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO conversion_stats (id, files, bytes, updated_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     files = files + excluded.files,
                     bytes = bytes + excluded.bytes,
                     updated_at = excluded.updated_at",
                params![files as i64, bytes as i64, updated_at],
            )
            .map_err(db_err)?;
        debug!("conversion recorded");
        Ok(())
    }

    /// Current totals; zero when nothing has been recorded yet.
    pub fn totals(&self) -> Result<StatsTotals> {
        let mut stmt = self
            .conn
            .prepare("SELECT files, bytes, updated_at FROM conversion_stats WHERE id = 1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([], |row| {
                Ok(StatsTotals {
                    files: row.get::<_, i64>(0)? as u64,
                    bytes: row.get::<_, i64>(1)? as u64,
                    updated_at: Some(row.get(2)?),
                })
            })
            .map_err(db_err)?;

        match rows.next() {
            Some(row) => row.map_err(db_err),
            None => Ok(StatsTotals::default()),
        }
    }

    /// Reset both counters to zero.
    pub fn reset(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM conversion_stats", [])
            .map_err(db_err)?;
        Ok(())
    }
}

impl ConversionRecorder for ConversionStats {
    fn record_conversion(&self, files: u64, bytes: u64) -> Result<()> {
        self.record(files, bytes)
    }
}

/// Render a byte count as `Bytes`, `KB`, `MB` or `GB` with one decimal.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} Bytes")
    } else {
        let rounded = (value * 10.0).round() / 10.0;
        format!("{rounded} {}", UNITS[unit])
    }
}
