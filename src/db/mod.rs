//! Database module - SQLite storage for per-user muscle fatigue

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use crate::error::{RecoveryError, Result};
use crate::muscles::{MuscleGroup, SuggestedWorkout};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Stored fatigue for one (user, muscle group). `fatigue_level` is the value
/// as of `last_trained_at`; decay is applied when read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleFatigueRecord {
    pub user_id: String,
    pub muscle_group: MuscleGroup,
    pub fatigue_level: u8,
    pub last_trained_at: Option<DateTime<Utc>>,
    pub volume_last_session: f64,
    pub sets_last_session: i32,
    /// Row version for compare-and-swap writes, 0 = not stored yet
    pub version: i64,
}

impl MuscleFatigueRecord {
    /// Implicit record for a muscle the user has never trained
    pub fn untrained(user_id: &str, muscle_group: MuscleGroup) -> Self {
        Self {
            user_id: user_id.to_string(),
            muscle_group,
            fatigue_level: 0,
            last_trained_at: None,
            volume_last_session: 0.0,
            sets_last_session: 0,
            version: 0,
        }
    }
}

/// One applied session in the recovery log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryLogEntry {
    pub id: i64,
    pub user_id: String,
    pub session_id: String,
    pub trained_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub muscle_groups: Vec<MuscleGroup>,
    /// What the engine suggested just before this session was applied
    pub suggested_workout: Option<SuggestedWorkout>,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// How long a writer waits on a locked database before failing busy
    pub fn with_busy_timeout(self, timeout: Duration) -> Result<Self> {
        self.conn.busy_timeout(timeout)?;
        Ok(self)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS muscle_fatigue (
                user_id TEXT NOT NULL,
                muscle_group TEXT NOT NULL,
                fatigue_level INTEGER NOT NULL DEFAULT 0
                    CHECK (fatigue_level BETWEEN 0 AND 100),
                last_trained_at TEXT,
                volume_last_session REAL NOT NULL DEFAULT 0,
                sets_last_session INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (user_id, muscle_group),
                CHECK (fatigue_level = 0 OR last_trained_at IS NOT NULL)
            );

            CREATE TABLE IF NOT EXISTS workout_recovery_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                trained_at TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                muscle_groups TEXT NOT NULL,
                suggested_workout TEXT,
                UNIQUE (user_id, session_id)
            );

            CREATE INDEX IF NOT EXISTS idx_recovery_log_user
                ON workout_recovery_log (user_id, id DESC);",
        )?;
        Ok(())
    }

    /// Stored fatigue records for a user (untrained muscles have no row)
    pub fn get_fatigue_records(&self, user_id: &str) -> Result<Vec<MuscleFatigueRecord>> {
        query_fatigue_records(&self.conn, user_id)
    }

    /// Stored record for one muscle group
    pub fn get_fatigue_record(
        &self,
        user_id: &str,
        muscle_group: MuscleGroup,
    ) -> Result<Option<MuscleFatigueRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT user_id, muscle_group, fatigue_level, last_trained_at,
                        volume_last_session, sets_last_session, version
                 FROM muscle_fatigue WHERE user_id = ?1 AND muscle_group = ?2",
                params![user_id, muscle_group.id()],
                fatigue_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Suggestion recorded with the user's most recent session
    pub fn last_suggested_workout(&self, user_id: &str) -> Result<Option<SuggestedWorkout>> {
        query_last_suggested(&self.conn, user_id)
    }

    /// Most recent recovery log entries, newest first
    pub fn get_recovery_log(&self, user_id: &str, limit: usize) -> Result<Vec<RecoveryLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, session_id, trained_at, recorded_at, muscle_groups, suggested_workout
             FROM workout_recovery_log WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![user_id, limit as i64], log_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    /// Remove everything stored for a user (account deletion)
    pub fn delete_user_data(&mut self, user_id: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let records = tx.execute("DELETE FROM muscle_fatigue WHERE user_id = ?1", params![user_id])?;
        let log = tx.execute("DELETE FROM workout_recovery_log WHERE user_id = ?1", params![user_id])?;
        tx.commit()?;
        Ok(records + log)
    }

    /// Run `f` inside an IMMEDIATE transaction. Commits on `Ok`, rolls back on `Err`.
    pub fn write_transaction<T>(&mut self, f: impl FnOnce(&WriteTx<'_>) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let write = WriteTx { tx };
        let value = f(&write)?;
        write.tx.commit()?;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Read-decay-add-write happens through this handle so it is atomic per user
pub struct WriteTx<'conn> {
    tx: Transaction<'conn>,
}

impl WriteTx<'_> {
    pub fn session_recorded(&self, user_id: &str, session_id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .tx
            .query_row(
                "SELECT id FROM workout_recovery_log WHERE user_id = ?1 AND session_id = ?2",
                params![user_id, session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn fatigue_records(&self, user_id: &str) -> Result<Vec<MuscleFatigueRecord>> {
        query_fatigue_records(&self.tx, user_id)
    }

    pub fn last_suggested_workout(&self, user_id: &str) -> Result<Option<SuggestedWorkout>> {
        query_last_suggested(&self.tx, user_id)
    }

    /// Compare-and-swap on `record.version`; a mismatch is `StaleRecord`
    pub fn write_record(&self, record: &MuscleFatigueRecord) -> Result<()> {
        let last_trained_at = record.last_trained_at.map(|t| t.to_rfc3339());

        let changed = if record.version == 0 {
            self.tx.execute(
                "INSERT INTO muscle_fatigue
                    (user_id, muscle_group, fatigue_level, last_trained_at,
                     volume_last_session, sets_last_session, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
                 ON CONFLICT (user_id, muscle_group) DO NOTHING",
                params![
                    record.user_id,
                    record.muscle_group.id(),
                    record.fatigue_level,
                    last_trained_at,
                    record.volume_last_session,
                    record.sets_last_session,
                ],
            )?
        } else {
            self.tx.execute(
                "UPDATE muscle_fatigue
                 SET fatigue_level = ?3, last_trained_at = ?4,
                     volume_last_session = ?5, sets_last_session = ?6,
                     version = version + 1
                 WHERE user_id = ?1 AND muscle_group = ?2 AND version = ?7",
                params![
                    record.user_id,
                    record.muscle_group.id(),
                    record.fatigue_level,
                    last_trained_at,
                    record.volume_last_session,
                    record.sets_last_session,
                    record.version,
                ],
            )?
        };

        if changed == 0 {
            return Err(RecoveryError::StaleRecord);
        }
        Ok(())
    }

    pub fn append_log(
        &self,
        user_id: &str,
        session_id: &str,
        trained_at: DateTime<Utc>,
        muscle_groups: &[MuscleGroup],
        suggested_workout: Option<SuggestedWorkout>,
    ) -> Result<i64> {
        self.tx.execute(
            "INSERT INTO workout_recovery_log
                (user_id, session_id, trained_at, recorded_at, muscle_groups, suggested_workout)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                session_id,
                trained_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                serde_json::to_string(muscle_groups)?,
                suggested_workout.map(|s| s.id()),
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }
}

fn query_fatigue_records(conn: &Connection, user_id: &str) -> Result<Vec<MuscleFatigueRecord>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, muscle_group, fatigue_level, last_trained_at,
                volume_last_session, sets_last_session, version
         FROM muscle_fatigue WHERE user_id = ?1 ORDER BY muscle_group",
    )?;

    let records = stmt
        .query_map(params![user_id], fatigue_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

fn query_last_suggested(conn: &Connection, user_id: &str) -> Result<Option<SuggestedWorkout>> {
    let suggested: Option<Option<String>> = conn
        .query_row(
            "SELECT suggested_workout FROM workout_recovery_log
             WHERE user_id = ?1 ORDER BY id DESC LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(suggested.flatten().and_then(|id| SuggestedWorkout::from_id(&id)))
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn fatigue_from_row(row: &Row<'_>) -> rusqlite::Result<MuscleFatigueRecord> {
    let group: String = row.get(1)?;
    let muscle_group = MuscleGroup::from_id(&group)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let last_trained_at: Option<String> = row.get(3)?;

    Ok(MuscleFatigueRecord {
        user_id: row.get(0)?,
        muscle_group,
        fatigue_level: row.get(2)?,
        last_trained_at: last_trained_at.map(|s| parse_timestamp(3, &s)).transpose()?,
        volume_last_session: row.get(4)?,
        sets_last_session: row.get(5)?,
        version: row.get(6)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<RecoveryLogEntry> {
    let trained_at: String = row.get(3)?;
    let recorded_at: String = row.get(4)?;
    let muscles: String = row.get(5)?;
    let suggested: Option<String> = row.get(6)?;

    Ok(RecoveryLogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_id: row.get(2)?,
        trained_at: parse_timestamp(3, &trained_at)?,
        recorded_at: parse_timestamp(4, &recorded_at)?,
        muscle_groups: serde_json::from_str(&muscles)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        suggested_workout: suggested.and_then(|id| SuggestedWorkout::from_id(&id)),
    })
}
