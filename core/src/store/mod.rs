//! SQLite persistence for imported sales datasets.
//!
//! RULE: Only the store talks to the database.
//! Everything above it works on `SalesRecord` values loaded from here.

use crate::error::YoyResult;
mod sales;
use rusqlite::{params, Connection, OpenFlags};

pub struct SalesStore {
    conn: Connection,
}

impl SalesStore {
    /// Open (or create) a store for writing imports.
    pub fn open(path: &str) -> YoyResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an existing store for loading. Never creates a file, so a
    /// mistyped path fails here instead of loading an empty dataset.
    pub fn open_read_only(path: &str) -> YoyResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> YoyResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> YoyResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_sales.sql"))?;
        Ok(())
    }

    // ── Imports ────────────────────────────────────────────────

    pub fn import_count(&self) -> YoyResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM dataset_import", params![], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }
}
