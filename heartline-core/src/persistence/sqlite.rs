//! SQLite record store.
//!
//! One database per user/persona pairing:
//!
//! ```sql
//! CREATE TABLE character_state (
//!     id         INTEGER PRIMARY KEY CHECK (id = 1),
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! CREATE TABLE completed_events (
//!     id              INTEGER PRIMARY KEY AUTOINCREMENT,
//!     event_id        TEXT NOT NULL,
//!     completed_at_ms INTEGER NOT NULL,
//!     data            BLOB NOT NULL
//! );
//! CREATE TABLE memory_facts (
//!     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//!     importance    INTEGER NOT NULL,
//!     created_at_ms INTEGER NOT NULL,
//!     data          BLOB NOT NULL
//! );
//! ```
//!
//! Records are JSON inside BLOB columns so the schema survives changes to the
//! data model. The state blob optionally carries a CRC-32 that is verified on
//! load; a mismatch is logged, not fatal.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::RecordStore;
use crate::config::PersistenceConfig;
use crate::error::{HeartlineError, Result};
use crate::events::{CompletedEventRecord, EventFilter};
use crate::facts::MemoryFact;
use crate::types::CharacterState;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS character_state (
        id         INTEGER PRIMARY KEY CHECK (id = 1),
        data       BLOB NOT NULL,
        updated_at TEXT NOT NULL,
        checksum   TEXT
    );
    CREATE TABLE IF NOT EXISTS completed_events (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id        TEXT NOT NULL,
        completed_at_ms INTEGER NOT NULL,
        data            BLOB NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_completed_events_event
        ON completed_events (event_id, completed_at_ms);
    CREATE TABLE IF NOT EXISTS memory_facts (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        importance    INTEGER NOT NULL,
        created_at_ms INTEGER NOT NULL,
        data          BLOB NOT NULL
    );
";

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| HeartlineError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| HeartlineError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Durable [`RecordStore`] on top of SQLite.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`HeartlineError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, "Record store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path,
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`HeartlineError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (`:memory:` for in-memory stores).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`HeartlineError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;
        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Record store backup completed"
        );
        Ok(())
    }

    /// Run `PRAGMA integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns [`HeartlineError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl RecordStore for SqliteStore {
    fn save_state(&self, state: &CharacterState) -> Result<()> {
        let start = Instant::now();
        let json = to_json(state)?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&json));

        self.conn.lock().execute(
            "INSERT INTO character_state (id, data, updated_at, checksum)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![json, Utc::now().to_rfc3339(), checksum],
        )?;

        debug!(
            persona = %state.persona_id,
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved character state"
        );
        Ok(())
    }

    fn load_state(&self) -> Result<Option<CharacterState>> {
        let row: Option<(Vec<u8>, Option<String>)> = self
            .conn
            .lock()
            .query_row(
                "SELECT data, checksum FROM character_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(%expected, %actual, "Checksum mismatch, state may be corrupted");
                }
            }
        }

        let mut state: CharacterState = from_json(&data)?;
        state.clamp_all();
        Ok(Some(state))
    }

    fn clear_state(&self) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM character_state", [])?;
        Ok(())
    }

    fn completed_events(&self, filter: &EventFilter) -> Result<Vec<CompletedEventRecord>> {
        let conn = self.conn.lock();
        let limit = filter
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt = conn.prepare_cached(
            "SELECT id, data FROM completed_events
             WHERE (?1 IS NULL OR event_id = ?1)
             ORDER BY completed_at_ms DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![filter.event_id, limit], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let mut record: CompletedEventRecord = from_json(&data)?;
            record.id = Some(id);
            records.push(record);
        }
        Ok(records)
    }

    fn append_completed_event(&self, record: &CompletedEventRecord) -> Result<i64> {
        let json = to_json(record)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO completed_events (event_id, completed_at_ms, data) VALUES (?1, ?2, ?3)",
            params![record.event_id, record.completed_at.timestamp_millis(), json],
        )?;
        let id = conn.last_insert_rowid();
        debug!(event = %record.event_id, id, "Recorded completed event");
        Ok(id)
    }

    fn save_fact(&self, fact: &MemoryFact) -> Result<i64> {
        let json = to_json(fact)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO memory_facts (importance, created_at_ms, data) VALUES (?1, ?2, ?3)",
            params![fact.importance, fact.created_at.timestamp_millis(), json],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn facts(&self, limit: usize) -> Result<Vec<MemoryFact>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, data FROM memory_facts
             ORDER BY importance DESC, created_at_ms DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let mut fact: MemoryFact = from_json(&data)?;
            fact.id = Some(id);
            facts.push(fact);
        }
        Ok(facts)
    }

    fn facts_matching(
        &self,
        keywords: &[String],
        min_importance: u8,
        limit: usize,
    ) -> Result<Vec<MemoryFact>> {
        if keywords.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        // Content lives inside the JSON blob, so keywords are matched after decoding.
        let mut stmt = conn.prepare_cached(
            "SELECT id, data FROM memory_facts
             WHERE importance >= ?1
             ORDER BY importance DESC, created_at_ms DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![i64::from(min_importance)], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let mut fact: MemoryFact = from_json(&data)?;
            if !fact.mentions_any(keywords) {
                continue;
            }
            fact.id = Some(id);
            facts.push(fact);
            if facts.len() >= limit {
                break;
            }
        }
        Ok(facts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use chrono::Duration;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory(&PersistenceConfig::default()).expect("open")
    }

    fn record(id: &str, minutes_ago: i64) -> CompletedEventRecord {
        CompletedEventRecord {
            id: None,
            event_id: id.into(),
            event_type: EventType::Milestone,
            choice_index: Some(0),
            outcome: Some("yes".into()),
            state_changes: None,
            completed_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(crc32_compute(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32_hex(b"123456789"), "cbf43926");
    }

    #[test]
    fn state_upsert_and_load() {
        let store = store();
        assert!(store.load_state().expect("load").is_none());

        let mut state = CharacterState::new("Aiko");
        store.save_state(&state).expect("save");
        state.affection = 420;
        store.save_state(&state).expect("save again");

        let loaded = store.load_state().expect("load").expect("present");
        assert_eq!(loaded.affection, 420);
        assert_eq!(loaded.persona_id, state.persona_id);

        store.clear_state().expect("clear");
        assert!(store.load_state().expect("load").is_none());
    }

    #[test]
    fn corrupted_checksum_still_loads() {
        let store = store();
        store.save_state(&CharacterState::new("Aiko")).expect("save");
        store
            .conn
            .lock()
            .execute("UPDATE character_state SET checksum = 'deadbeef'", [])
            .expect("tamper");
        assert!(store.load_state().expect("load").is_some());
    }

    #[test]
    fn completed_events_most_recent_first() {
        let store = store();
        store.append_completed_event(&record("a", 60)).expect("append");
        store.append_completed_event(&record("b", 30)).expect("append");
        let newest_a = store.append_completed_event(&record("a", 5)).expect("append");

        let all = store.completed_events(&EventFilter::default()).expect("list");
        let ids: Vec<&str> = all.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a"]);

        let latest_a = store
            .completed_events(&EventFilter::for_event("a").limit(1))
            .expect("list");
        assert_eq!(latest_a.len(), 1);
        assert_eq!(latest_a[0].id, Some(newest_a));
        assert_eq!(latest_a[0].outcome.as_deref(), Some("yes"));
    }

    #[test]
    fn facts_ordered_by_importance() {
        let store = store();
        let now = Utc::now();
        store.save_fact(&MemoryFact::scored("likes tea", 0.0, now)).expect("save");
        store
            .save_fact(&MemoryFact::scored("User: my birthday is in May", 0.9, now))
            .expect("save");
        let facts = store.facts(10).expect("facts");
        assert_eq!(facts.len(), 2);
        assert!(facts[0].importance >= facts[1].importance);
        assert!(facts[0].content.contains("birthday"));
    }

    #[test]
    fn facts_matching_decodes_and_filters() {
        let store = store();
        let now = Utc::now();
        store
            .save_fact(&MemoryFact::scored("User: my birthday is in May", 0.9, now))
            .expect("save");
        store
            .save_fact(&MemoryFact::scored("we watched fireworks in May", 0.0, now))
            .expect("save");
        store.save_fact(&MemoryFact::scored("likes tea", 0.0, now)).expect("save");

        let may = vec!["MAY".to_string()];
        let facts = store.facts_matching(&may, 0, 10).expect("match");
        assert_eq!(facts.len(), 2);
        assert!(facts.iter().all(|f| f.id.is_some()));
        assert!(facts[0].content.contains("birthday"));

        let important = store.facts_matching(&may, 70, 10).expect("match");
        assert_eq!(important.len(), 1);
        assert_eq!(store.facts_matching(&may, 0, 1).expect("match").len(), 1);
        assert!(store.facts_matching(&[], 0, 10).expect("match").is_empty());
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("heartline.db");
        let state = CharacterState::new("Aiko");
        {
            let store = SqliteStore::open(&path, &PersistenceConfig::default()).expect("open");
            store.save_state(&state).expect("save");
            store.append_completed_event(&record("first_conversation", 1)).expect("append");
            assert!(store.integrity_check().expect("check"));
            store.backup(dir.path().join("backup.db")).expect("backup");
        }
        let reopened = SqliteStore::open(&path, &PersistenceConfig::default()).expect("reopen");
        assert_eq!(reopened.load_state().expect("load"), Some(state));
        assert_eq!(
            reopened
                .completed_events(&EventFilter::default())
                .expect("list")
                .len(),
            1
        );
        let backup = SqliteStore::open(dir.path().join("backup.db"), &PersistenceConfig::default())
            .expect("open backup");
        assert!(backup.load_state().expect("load").is_some());
    }
}
