//! SQLite-based state storage and meeting history.
//!
//! Provides persistent storage for:
//! - The engine's durable state (meetings and the current meeting id)
//! - A log of completed meetings
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::error::{DatabaseError, Result, ValidationError};
use crate::meeting::{Meeting, MeetingStatus};
use crate::timer::PersistedState;

const STATE_KEY: &str = "meeting_state";

/// A completed meeting as stored in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub meeting_id: String,
    pub title: String,
    pub agenda_count: u32,
    pub planned_secs: u64,
    pub actual_secs: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

/// SQLite database for engine state and meeting history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/agendaroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("agendaroom.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meeting_log (
                meeting_id   TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                agenda_count INTEGER NOT NULL,
                planned_secs INTEGER NOT NULL,
                actual_secs  INTEGER NOT NULL,
                started_at   TEXT,
                completed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_meeting_log_completed_at ON meeting_log(completed_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load the persisted engine state, or an empty one if none was saved.
    ///
    /// # Errors
    /// Returns an error if the stored JSON is unreadable.
    pub fn load_state(&self) -> Result<PersistedState> {
        match self.kv_get(STATE_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(PersistedState::default()),
        }
    }

    pub fn save_state(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(STATE_KEY, &json)?;
        debug!(meetings = state.meetings.len(), "state saved");
        Ok(())
    }

    /// Record a completed meeting in the history log. Recording the same
    /// meeting twice replaces the earlier row.
    ///
    /// # Errors
    /// Returns a validation error if the meeting is not completed.
    pub fn record_meeting(&self, meeting: &Meeting) -> Result<()> {
        let completed_at = match (meeting.status, meeting.end_time) {
            (MeetingStatus::Completed, Some(end)) => end,
            _ => {
                return Err(ValidationError::InvalidValue {
                    field: "status".into(),
                    message: format!("meeting {} is not completed", meeting.id),
                }
                .into())
            }
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO meeting_log
                (meeting_id, title, agenda_count, planned_secs, actual_secs, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                meeting.id,
                meeting.title,
                meeting.agenda.len() as u32,
                meeting.total_planned_duration,
                meeting.total_actual_duration,
                meeting.start_time.map(|t| t.to_rfc3339()),
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recently completed meetings first.
    pub fn meeting_history(&self, limit: u32) -> Result<Vec<MeetingRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT meeting_id, title, agenda_count, planned_secs, actual_secs, started_at, completed_at
             FROM meeting_log
             ORDER BY completed_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (meeting_id, title, agenda_count, planned_secs, actual_secs, started, completed) = row?;
            records.push(MeetingRecord {
                meeting_id,
                title,
                agenda_count,
                planned_secs,
                actual_secs,
                started_at: started.as_deref().and_then(parse_rfc3339),
                completed_at: parse_rfc3339(&completed).unwrap_or_default(),
            });
        }
        Ok(records)
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
