//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed intervals (focus sessions and breaks)
//! - Statistics: totals, today, the last seven days, day streak
//! - Key-value store for application state (the CLI's engine and sequencer)

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::timer::Mode;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: Mode,
    pub duration_secs: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_pomodoros: u64,
    pub total_focus_secs: u64,
    pub total_break_secs: u64,
    pub today_pomodoros: u64,
    pub today_focus_secs: u64,
    /// Focus sessions in the seven days ending today.
    pub week_pomodoros: u64,
    /// Consecutive days with at least one focus session.
    pub streak_days: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/tomatick.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("tomatick.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                mode          TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                completed_at  TEXT NOT NULL,
                completed_on  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_on_mode ON sessions(completed_on, mode);",
        )?;
        Ok(())
    }

    /// Record a completed interval.
    pub fn record_completion(
        &self,
        mode: Mode,
        duration_secs: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (mode, duration_secs, completed_at, completed_on)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                mode.as_str(),
                duration_secs,
                completed_at.to_rfc3339(),
                completed_at.format(DATE_FORMAT).to_string(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, %mode, duration_secs, "completion recorded");
        Ok(id)
    }

    /// Most recent completions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, duration_secs, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, mode, duration_secs, completed_at) = row?;
            let mode = mode.parse::<Mode>().map_err(|e| DatabaseError::Corrupt {
                key: format!("sessions.{id}.mode"),
                message: e.to_string(),
            })?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| DatabaseError::Corrupt {
                    key: format!("sessions.{id}.completed_at"),
                    message: e.to_string(),
                })?
                .with_timezone(&Utc);
            out.push(SessionRecord {
                id,
                mode,
                duration_secs,
                completed_at,
            });
        }
        Ok(out)
    }

    /// Focus sessions per day for the `days` days ending at `today`,
    /// oldest first, days without sessions included as zero.
    pub fn daily_counts(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<(NaiveDate, u64)>, DatabaseError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let first = today - Duration::days(i64::from(days) - 1);
        let mut stmt = self.conn.prepare(
            "SELECT completed_on, COUNT(*)
             FROM sessions
             WHERE mode = 'focus' AND completed_on >= ?1 AND completed_on <= ?2
             GROUP BY completed_on",
        )?;
        let rows = stmt.query_map(
            params![
                first.format(DATE_FORMAT).to_string(),
                today.format(DATE_FORMAT).to_string()
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)),
        )?;

        let mut by_day = HashMap::new();
        for row in rows {
            let (day, count) = row?;
            by_day.insert(day, count);
        }

        Ok(first
            .iter_days()
            .take(days as usize)
            .map(|day| {
                let key = day.format(DATE_FORMAT).to_string();
                (day, by_day.get(&key).copied().unwrap_or(0))
            })
            .collect())
    }

    /// Aggregate statistics as of `today`.
    pub fn stats(&self, today: NaiveDate) -> Result<Stats, DatabaseError> {
        let mut stats = Stats::default();

        let mut stmt = self.conn.prepare(
            "SELECT mode, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             GROUP BY mode",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;
        for row in rows {
            let (mode, count, secs) = row?;
            stats.total_sessions += count;
            match mode.parse::<Mode>() {
                Ok(Mode::Focus) => {
                    stats.completed_pomodoros += count;
                    stats.total_focus_secs += secs;
                }
                Ok(Mode::ShortBreak | Mode::LongBreak) => stats.total_break_secs += secs,
                Err(_) => {}
            }
        }

        let (today_count, today_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             WHERE mode = 'focus' AND completed_on = ?1",
            params![today.format(DATE_FORMAT).to_string()],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        stats.today_pomodoros = today_count;
        stats.today_focus_secs = today_secs;

        stats.week_pomodoros = self
            .daily_counts(today, 7)?
            .iter()
            .map(|(_, count)| count)
            .sum();
        stats.streak_days = self.streak_days(today)?;
        Ok(stats)
    }

    /// Consecutive days with a focus session, ending today, or ending
    /// yesterday when nothing has been completed today yet.
    pub fn streak_days(&self, today: NaiveDate) -> Result<u64, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT completed_on FROM sessions
             WHERE mode = 'focus' AND completed_on <= ?1",
        )?;
        let rows = stmt.query_map(params![today.format(DATE_FORMAT).to_string()], |row| {
            row.get::<_, String>(0)
        })?;
        let mut active = BTreeSet::new();
        for row in rows {
            if let Ok(day) = NaiveDate::parse_from_str(&row?, DATE_FORMAT) {
                active.insert(day);
            }
        }

        let mut cursor = if active.contains(&today) {
            today
        } else {
            match today.pred_opt() {
                Some(yesterday) => yesterday,
                None => return Ok(0),
            }
        };
        let mut streak = 0;
        while active.contains(&cursor) {
            streak += 1;
            match cursor.pred_opt() {
                Some(prev) => cursor = prev,
                None => break,
            }
        }
        Ok(streak)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Decode a JSON value from the kv store.
    pub fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DatabaseError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    pub fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value).map_err(|e| DatabaseError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.kv_set(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        db.record_completion(Mode::Focus, 1500, at(2026, 3, 2, 9))
            .unwrap();
        db.record_completion(Mode::ShortBreak, 300, at(2026, 3, 2, 10))
            .unwrap();

        let stats = db.stats(day(2026, 3, 2)).unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_pomodoros, 1);
        assert_eq!(stats.total_focus_secs, 1500);
        assert_eq!(stats.total_break_secs, 300);
        assert_eq!(stats.today_pomodoros, 1);
        assert_eq!(stats.streak_days, 1);
    }

    #[test]
    fn recent_sessions_newest_first() {
        let db = Database::open_memory().unwrap();
        db.record_completion(Mode::Focus, 1500, at(2026, 3, 2, 9))
            .unwrap();
        db.record_completion(Mode::LongBreak, 900, at(2026, 3, 2, 11))
            .unwrap();
        let sessions = db.recent_sessions(10).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].mode, Mode::LongBreak);
        assert_eq!(sessions[1].completed_at, at(2026, 3, 2, 9));
    }

    #[test]
    fn daily_counts_are_zero_filled() {
        let db = Database::open_memory().unwrap();
        db.record_completion(Mode::Focus, 1500, at(2026, 3, 1, 9))
            .unwrap();
        db.record_completion(Mode::Focus, 1500, at(2026, 3, 1, 10))
            .unwrap();
        db.record_completion(Mode::Focus, 1500, at(2026, 3, 3, 9))
            .unwrap();
        // Breaks and out-of-range days do not count.
        db.record_completion(Mode::ShortBreak, 300, at(2026, 3, 3, 10))
            .unwrap();
        db.record_completion(Mode::Focus, 1500, at(2026, 2, 20, 9))
            .unwrap();

        let counts = db.daily_counts(day(2026, 3, 3), 3).unwrap();
        assert_eq!(
            counts,
            vec![(day(2026, 3, 1), 2), (day(2026, 3, 2), 0), (day(2026, 3, 3), 1)]
        );
        assert!(db.daily_counts(day(2026, 3, 3), 0).unwrap().is_empty());
    }

    #[test]
    fn streak_counts_back_from_yesterday_when_today_is_empty() {
        let db = Database::open_memory().unwrap();
        for d in [1, 2, 3, 5, 6] {
            db.record_completion(Mode::Focus, 1500, at(2026, 3, d, 9))
                .unwrap();
        }
        assert_eq!(db.streak_days(day(2026, 3, 6)).unwrap(), 2);
        assert_eq!(db.streak_days(day(2026, 3, 7)).unwrap(), 2);
        assert_eq!(db.streak_days(day(2026, 3, 8)).unwrap(), 0);
        assert_eq!(db.streak_days(day(2026, 3, 3)).unwrap(), 3);
    }

    #[test]
    fn week_counts_the_last_seven_days() {
        let db = Database::open_memory().unwrap();
        for d in 1..=10 {
            db.record_completion(Mode::Focus, 1500, at(2026, 3, d, 9))
                .unwrap();
        }
        let stats = db.stats(day(2026, 3, 10)).unwrap();
        assert_eq!(stats.week_pomodoros, 7);
        assert_eq!(stats.streak_days, 10);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn kv_json_roundtrip_and_corruption() {
        let db = Database::open_memory().unwrap();
        db.kv_set_json("mode", &Mode::LongBreak).unwrap();
        assert_eq!(db.kv_get_json::<Mode>("mode").unwrap(), Some(Mode::LongBreak));

        db.kv_set("mode", "{not json").unwrap();
        assert!(matches!(
            db.kv_get_json::<Mode>("mode"),
            Err(DatabaseError::Corrupt { .. })
        ));
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stats.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.record_completion(Mode::Focus, 60, Utc::now()).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.recent_sessions(5).unwrap().len(), 1);
    }
}
