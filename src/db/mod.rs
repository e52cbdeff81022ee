//! SQLite persistence for prediction logs
//!
//! Connection-per-operation manager: every call opens a fresh connection,
//! runs one short statement and closes. No transaction spans a prediction
//! plus its log insert; the insert is a separate best-effort step.

mod records;

pub use records::PredictionLog;

use std::path::PathBuf;

use rusqlite::{Connection, Params, Row};

/// Owns the database location and hands out short-lived connections
pub struct DatabaseManager {
    db_path: PathBuf,
}

impl DatabaseManager {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Manager over the default database location
    pub fn with_default_path() -> Self {
        Self::new(crate::constants::db_path())
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    fn connection(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.db_path)
    }

    /// Create tables if they do not exist
    pub fn init_db(&self) -> rusqlite::Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("DatabaseManager: could not create {}: {}", parent.display(), e);
            }
        }

        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prediction_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                model_type TEXT NOT NULL,
                input_summary TEXT,
                prediction_result TEXT NOT NULL,
                probability REAL,
                created_at TEXT NOT NULL
            );",
        )
    }

    /// Execute an INSERT/UPDATE/DELETE statement, returning affected rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        let conn = self.connection()?;
        conn.execute(sql, params)
    }

    /// Execute an INSERT and return the inserted row id.
    ///
    /// Uses `last_insert_rowid` on the same connection, which is the only
    /// reliable way to get the id back out of SQLite.
    pub fn execute_and_get_id<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<i64> {
        let conn = self.connection()?;
        conn.execute(sql, params)?;
        Ok(conn.last_insert_rowid())
    }

    /// Run a SELECT and map the first row, if any
    pub fn fetch_one<T, P, F>(&self, sql: &str, params: P, map: F) -> rusqlite::Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(map(row)?)),
            None => Ok(None),
        }
    }

    /// Run a SELECT and map every row
    pub fn fetch_all<T, P, F>(&self, sql: &str, params: P, map: F) -> rusqlite::Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let mut map = map;
        let rows = stmt.query_map(params, |row| map(row))?;
        rows.collect()
    }

    // ------------------------------------------------------------------
    // Typed prediction-log helpers
    // ------------------------------------------------------------------

    /// Insert one prediction log row and return its id
    pub fn insert_prediction_log(
        &self,
        user_id: i64,
        model_type: &str,
        input_summary: &str,
        prediction_result: &str,
        probability: f64,
        created_at: &str,
    ) -> rusqlite::Result<i64> {
        self.execute_and_get_id(
            "INSERT INTO prediction_logs (
                user_id, model_type, input_summary,
                prediction_result, probability, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                user_id,
                model_type,
                input_summary,
                prediction_result,
                probability,
                created_at
            ],
        )
    }

    /// Latest log row for one user and model family
    pub fn latest_prediction(
        &self,
        user_id: i64,
        model_type: &str,
    ) -> rusqlite::Result<Option<PredictionLog>> {
        self.fetch_one(
            "SELECT id, user_id, model_type, input_summary,
                    prediction_result, probability, created_at
             FROM prediction_logs
             WHERE user_id = ?1 AND model_type = ?2
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            rusqlite::params![user_id, model_type],
            PredictionLog::from_row,
        )
    }

    /// Full prediction history for a user, newest first
    pub fn predictions_for_user(&self, user_id: i64) -> rusqlite::Result<Vec<PredictionLog>> {
        self.fetch_all(
            "SELECT id, user_id, model_type, input_summary,
                    prediction_result, probability, created_at
             FROM prediction_logs
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
            rusqlite::params![user_id],
            PredictionLog::from_row,
        )
    }

    /// Bulk-delete a user's prediction history; returns rows removed
    pub fn clear_history(&self, user_id: i64) -> rusqlite::Result<usize> {
        self.execute(
            "DELETE FROM prediction_logs WHERE user_id = ?1",
            rusqlite::params![user_id],
        )
    }
}
