// SPDX-License-Identifier: MIT

//! Embedded key-value backing: a single SQLite table partitioned into four
//! logical namespaces (`config`, `queue`, `job`, `task`). Task keys are
//! prefixed by their owning job ID so a job's tasks can be enumerated, or
//! deleted, with a single prefix scan.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Config,
    Queue,
    Job,
    Task,
}

impl Namespace {
    fn as_str(self) -> &'static str {
        match self {
            Namespace::Config => "config",
            Namespace::Queue => "queue",
            Namespace::Job => "job",
            Namespace::Task => "task",
        }
    }
}

/// A thin synchronous wrapper over an embedded SQLite connection.
///
/// Callers above this layer (the state store) already serialize access
/// with their own reader/writer lock, so a single mutex-guarded connection
/// is sufficient here and avoids SQLite's own connection-pool machinery.
pub struct KvStore {
    conn: Mutex<Connection>,
}

impl KvStore {
    /// Opens (creating if absent) the database at `path` and ensures the
    /// backing table exists. Pass `:memory:` for ephemeral/test stores.
    pub fn open(path: &Path) -> Result<Self, KvError> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, KvError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init(conn: &Connection) -> Result<(), KvError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value BLOB NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )?;
        Ok(())
    }

    pub fn put(&self, ns: Namespace, key: &str, value: &[u8]) -> Result<(), KvError> {
        self.conn.lock().execute(
            "INSERT INTO kv (namespace, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
            params![ns.as_str(), key, value],
        )?;
        Ok(())
    }

    pub fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                params![ns.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete(&self, ns: Namespace, key: &str) -> Result<(), KvError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE namespace = ?1 AND key = ?2", params![ns.as_str(), key])?;
        Ok(())
    }

    /// Deletes every key in `ns` whose key starts with `prefix`.
    pub fn delete_prefix(&self, ns: Namespace, prefix: &str) -> Result<(), KvError> {
        let like_pattern = format!("{}%", escape_like(prefix));
        self.conn.lock().execute(
            "DELETE FROM kv WHERE namespace = ?1 AND key LIKE ?2 ESCAPE '\\'",
            params![ns.as_str(), like_pattern],
        )?;
        Ok(())
    }

    /// Returns every `(key, value)` pair in `ns` whose key starts with `prefix`.
    pub fn scan_prefix(&self, ns: Namespace, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KvError> {
        let like_pattern = format!("{}%", escape_like(prefix));
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT key, value FROM kv WHERE namespace = ?1 AND key LIKE ?2 ESCAPE '\\' ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![ns.as_str(), like_pattern], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Returns every `(key, value)` pair in `ns`.
    pub fn scan_all(&self, ns: Namespace) -> Result<Vec<(String, Vec<u8>)>, KvError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key, value FROM kv WHERE namespace = ?1 ORDER BY key")?;
        let rows = stmt
            .query_map(params![ns.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let kv = KvStore::open_in_memory().unwrap();
        kv.put(Namespace::Job, "job-1", b"payload").unwrap();
        assert_eq!(kv.get(Namespace::Job, "job-1").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn put_overwrites_existing_key() {
        let kv = KvStore::open_in_memory().unwrap();
        kv.put(Namespace::Job, "job-1", b"v1").unwrap();
        kv.put(Namespace::Job, "job-1", b"v2").unwrap();
        assert_eq!(kv.get(Namespace::Job, "job-1").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn scan_prefix_only_matches_prefixed_keys() {
        let kv = KvStore::open_in_memory().unwrap();
        kv.put(Namespace::Task, "job-1.0.0", b"a").unwrap();
        kv.put(Namespace::Task, "job-1.0.1", b"b").unwrap();
        kv.put(Namespace::Task, "job-2.0.0", b"c").unwrap();
        let rows = kv.scan_prefix(Namespace::Task, "job-1.").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn delete_prefix_removes_only_matching_keys() {
        let kv = KvStore::open_in_memory().unwrap();
        kv.put(Namespace::Task, "job-1.0.0", b"a").unwrap();
        kv.put(Namespace::Task, "job-2.0.0", b"c").unwrap();
        kv.delete_prefix(Namespace::Task, "job-1.").unwrap();
        assert!(kv.scan_prefix(Namespace::Task, "job-1.").unwrap().is_empty());
        assert_eq!(kv.scan_prefix(Namespace::Task, "job-2.").unwrap().len(), 1);
    }

    #[test]
    fn namespaces_are_isolated() {
        let kv = KvStore::open_in_memory().unwrap();
        kv.put(Namespace::Job, "same-key", b"job-value").unwrap();
        kv.put(Namespace::Task, "same-key", b"task-value").unwrap();
        assert_eq!(kv.get(Namespace::Job, "same-key").unwrap(), Some(b"job-value".to_vec()));
        assert_eq!(kv.get(Namespace::Task, "same-key").unwrap(), Some(b"task-value".to_vec()));
    }
}
