//! # SQLite Store
//!
//! Persists spots and per-user history in a local SQLite database through
//! Turso. Spot operations live in `spots.rs`, user-scoped history and
//! preference operations in `users.rs`.

use crate::{categories::Category, errors::SpotError, types::Spot};
use chrono::{Duration, Utc};
use std::fmt::{self, Debug};
use tracing::info;
use turso::{Connection, Database, Row, Value as TursoValue};

pub mod sql;
mod spots;
mod users;

/// A provider for interacting with a local SQLite database using Turso.
///
/// When cloned, it shares the same underlying database, allowing for concurrent
/// and shared access to the same database file or in-memory instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a unique,
    ///   isolated in-memory database. To share an in-memory database, create one
    ///   provider and then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, SpotError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| SpotError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| SpotError::StorageConnection(e.to_string()))?;
        // `query` rather than `execute`: the PRAGMA returns a row.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| SpotError::StorageConnection(e.to_string()))?;

        info!(db_path = %db_path, "Opened SQLite database.");
        Ok(Self { db })
    }

    /// Ensures that all required application tables exist.
    /// This function is idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), SpotError> {
        let conn = self.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| SpotError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    pub(crate) fn connect(&self) -> Result<Connection, SpotError> {
        self.db
            .connect()
            .map_err(|e| SpotError::StorageConnection(e.to_string()))
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

// --- Row and value helpers ---

/// The current UTC time in the format every timestamp column uses.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The UTC time `days` days ago, comparable with stored timestamps.
pub(crate) fn days_ago_timestamp(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub(crate) fn opt_text(value: Option<&str>) -> TursoValue {
    match value {
        Some(s) => TursoValue::Text(s.to_string()),
        None => TursoValue::Null,
    }
}

pub(crate) fn opt_real(value: Option<f64>) -> TursoValue {
    match value {
        Some(f) => TursoValue::Real(f),
        None => TursoValue::Null,
    }
}

pub(crate) fn value_text(value: TursoValue) -> Option<String> {
    match value {
        TursoValue::Text(s) => Some(s),
        TursoValue::Integer(i) => Some(i.to_string()),
        TursoValue::Real(f) => Some(f.to_string()),
        _ => None,
    }
}

pub(crate) fn value_real(value: TursoValue) -> Option<f64> {
    match value {
        TursoValue::Real(f) => Some(f),
        TursoValue::Integer(i) => Some(i as f64),
        _ => None,
    }
}

pub(crate) fn value_integer(value: TursoValue) -> Option<i64> {
    match value {
        TursoValue::Integer(i) => Some(i),
        TursoValue::Real(f) => Some(f as i64),
        _ => None,
    }
}

pub(crate) fn value_category(value: TursoValue) -> Result<Category, SpotError> {
    let raw = value_text(value).unwrap_or_default();
    raw.parse().map_err(|_| {
        SpotError::StorageOperationFailed(format!("stored category '{raw}' is not valid"))
    })
}

/// Reads a spot from a row laid out as [`sql::SPOT_COLUMNS`].
pub(crate) fn spot_from_row(row: &Row) -> Result<Spot, SpotError> {
    Ok(Spot {
        id: value_integer(row.get_value(0)?).unwrap_or_default(),
        name: value_text(row.get_value(1)?).unwrap_or_default(),
        description: value_text(row.get_value(2)?),
        category: value_category(row.get_value(3)?)?,
        latitude: value_real(row.get_value(4)?).unwrap_or_default(),
        longitude: value_real(row.get_value(5)?).unwrap_or_default(),
        address: value_text(row.get_value(6)?),
        image_url: value_text(row.get_value(7)?),
        rating: value_real(row.get_value(8)?).unwrap_or_default(),
        opening_time: value_text(row.get_value(9)?),
        closing_time: value_text(row.get_value(10)?),
        closed_days: value_text(row.get_value(11)?),
        created_at: value_text(row.get_value(12)?).unwrap_or_default(),
        created_by: value_text(row.get_value(13)?),
        source_ref: value_text(row.get_value(14)?),
    })
}

/// Returns the id produced by an `INSERT ... RETURNING id` statement.
pub(crate) async fn returning_id(mut rows: turso::Rows) -> Result<i64, SpotError> {
    let row = rows.next().await?.ok_or_else(|| {
        SpotError::StorageOperationFailed("INSERT did not return an id".to_string())
    })?;
    value_integer(row.get_value(0)?).ok_or_else(|| {
        SpotError::StorageOperationFailed("INSERT returned a non-integer id".to_string())
    })
}
