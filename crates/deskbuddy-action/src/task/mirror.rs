//! Best-effort mirroring of the task store to an external store.
//!
//! The in-memory [`TaskStore`](super::TaskStore) stays the source of truth;
//! a mirror failure never rolls back a local change.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::info;
use uuid::Uuid;

use crate::error::SyncFailure;
use crate::types::Task;

/// Sink that receives every task mutation.
pub trait TaskMirror: Send + Sync {
    fn upsert(&self, task: &Task) -> Result<(), SyncFailure>;
    fn remove(&self, id: Uuid) -> Result<(), SyncFailure>;
    fn clear(&self) -> Result<(), SyncFailure>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    created TEXT NOT NULL,
    kind TEXT NOT NULL
);";

/// SQLite-backed mirror.
///
/// One connection behind a mutex since `rusqlite::Connection` is not `Sync`.
pub struct SqliteMirror {
    conn: Mutex<Connection>,
}

impl SqliteMirror {
    /// Open (or create) the mirror database at `path`.
    pub fn open(path: &Path) -> Result<Self, SyncFailure> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncFailure(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        let mirror = Self::init(conn)?;
        info!("Task mirror opened at {}", path.display());
        Ok(mirror)
    }

    pub fn in_memory() -> Result<Self, SyncFailure> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SyncFailure> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, SyncFailure> {
        self.conn
            .lock()
            .map_err(|_| SyncFailure("Mirror lock poisoned".to_string()))
    }

    /// Number of mirrored rows.
    pub fn count(&self) -> Result<usize, SyncFailure> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl TaskMirror for SqliteMirror {
    fn upsert(&self, task: &Task) -> Result<(), SyncFailure> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO tasks (id, name, date, time, created, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.id.to_string(),
                task.name,
                task.date.to_string(),
                task.time.format("%H:%M").to_string(),
                task.created.to_rfc3339(),
                task.kind.to_string(),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<(), SyncFailure> {
        self.conn()?
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SyncFailure> {
        self.conn()?.execute("DELETE FROM tasks", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskKind;
    use chrono::{NaiveDate, NaiveTime};

    fn sample(name: &str) -> Task {
        Task::new(
            name.to_string(),
            NaiveDate::from_ymd_opt(2026, 10, 22).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            TaskKind::Reminder,
        )
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mirror = SqliteMirror::in_memory().unwrap();
        let mut task = sample("team meeting");
        mirror.upsert(&task).unwrap();
        task.name = "team sync".to_string();
        mirror.upsert(&task).unwrap();
        assert_eq!(mirror.count().unwrap(), 1);

        let name: String = mirror
            .conn()
            .unwrap()
            .query_row("SELECT name FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "team sync");
    }

    #[test]
    fn test_remove_and_clear() {
        let mirror = SqliteMirror::in_memory().unwrap();
        let a = sample("a");
        let b = sample("b");
        mirror.upsert(&a).unwrap();
        mirror.upsert(&b).unwrap();

        mirror.remove(a.id).unwrap();
        assert_eq!(mirror.count().unwrap(), 1);
        mirror.clear().unwrap();
        assert_eq!(mirror.count().unwrap(), 0);
    }

    #[test]
    fn test_open_file_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("tasks.db");
        {
            let mirror = SqliteMirror::open(&path).unwrap();
            mirror.upsert(&sample("water plants")).unwrap();
        }
        let reopened = SqliteMirror::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
