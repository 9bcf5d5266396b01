//! SQLite-based session archive.
//!
//! Stores completed (or explicitly saved) sessions with their aggregated
//! biometrics, plus a small key-value table used to persist the serialized
//! state machine between CLI invocations. Sessions are immutable once
//! inserted except for deletion.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::session::FocusMode;

use super::data_dir;

/// One archived session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub mode: FocusMode,
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub heart_rate_avg: f64,
    pub hrv_avg: f64,
    pub resting_heart_rate: f64,
    /// Readiness score at session start, 0..100.
    pub score: f64,
    pub pause_count: u32,
}

/// SQLite database for the session archive.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/pulsefocus/pulsefocus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("pulsefocus.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path,
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, demos).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id               TEXT PRIMARY KEY,
                    started_at       TEXT NOT NULL,
                    ended_at         TEXT,
                    mode             TEXT NOT NULL,
                    focus_minutes    INTEGER NOT NULL,
                    rest_minutes     INTEGER NOT NULL,
                    heart_rate_avg   REAL NOT NULL DEFAULT 0,
                    hrv_avg          REAL NOT NULL DEFAULT 0,
                    resting_heart_rate REAL NOT NULL DEFAULT 0,
                    score            REAL NOT NULL DEFAULT 0,
                    pause_count      INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);",
            )
            .map_err(DatabaseError::from)
    }

    /// Archive a session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let mode = match session.mode {
            FocusMode::Fixed => "fixed",
            FocusMode::Adaptive => "adaptive",
        };
        self.conn
            .execute(
                "INSERT INTO sessions (id, started_at, ended_at, mode, focus_minutes,
                    rest_minutes, heart_rate_avg, hrv_avg, resting_heart_rate, score, pause_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.id.to_string(),
                    session.started_at.to_rfc3339(),
                    session.ended_at.map(|t| t.to_rfc3339()),
                    mode,
                    session.focus_minutes,
                    session.rest_minutes,
                    session.heart_rate_avg,
                    session.hrv_avg,
                    session.resting_heart_rate,
                    session.score,
                    session.pause_count,
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Delete an archived session. Returns whether a row was removed.
    pub fn delete_session(&self, id: &Uuid) -> Result<bool, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])
            .map_err(DatabaseError::from)?;
        Ok(n > 0)
    }

    /// All archived sessions, most recent first.
    pub fn query_all(&self) -> Result<Vec<Session>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, started_at, ended_at, mode, focus_minutes, rest_minutes,
                        heart_rate_avg, hrv_avg, resting_heart_rate, score, pause_count
                 FROM sessions ORDER BY started_at DESC",
            )
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let started_at: String = row.get(1)?;
                let ended_at: Option<String> = row.get(2)?;
                let mode: String = row.get(3)?;
                Ok(Session {
                    id: id.parse().unwrap_or_else(|_| Uuid::nil()),
                    started_at: parse_rfc3339(&started_at),
                    ended_at: ended_at.as_deref().map(parse_rfc3339),
                    mode: if mode == "adaptive" {
                        FocusMode::Adaptive
                    } else {
                        FocusMode::Fixed
                    },
                    focus_minutes: row.get(4)?,
                    rest_minutes: row.get(5)?,
                    heart_rate_avg: row.get(6)?,
                    hrv_avg: row.get(7)?,
                    resting_heart_rate: row.get(8)?,
                    score: row.get(9)?,
                    pause_count: row.get(10)?,
                })
            })
            .map_err(DatabaseError::from)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row.map_err(DatabaseError::from)?);
        }
        Ok(sessions)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DatabaseError::from)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
