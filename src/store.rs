// 💾 Blob Store - Opaque key-value persistence
// The pipeline sees only get/set over bytes; SQLite is an implementation
//
// One writer, many readers. Each set() is a single atomic replace, so a
// reader never observes a half-written dataset. Two concurrent writers race
// with last-write-wins semantics; runs are one-at-a-time.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

/// Key of the persisted dataset blob (gzip JSON array of Entity)
pub const DATASET_KEY: &str = "sdn:dataset";

/// Key of the persisted run metadata (JSON IngestMetadata)
pub const METADATA_KEY: &str = "sdn:metadata";

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Durable key-value storage with read-after-write consistency for a single
/// writer
pub trait BlobStore: Send + Sync {
    /// Fetch a blob; Ok(None) when the key has never been written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a blob, atomically replacing any previous value
    fn set(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Write a structured record as JSON bytes
    fn set_json(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let bytes =
            serde_json::to_vec(value).context("Failed to serialize structured record")?;
        self.set(key, &bytes)
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// SQLite-backed blob store (WAL mode, single `blobs` table)
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).with_context(|| {
            format!("Failed to open store database: {}", path.as_ref().display())
        })?;
        Self::setup(conn)
    }

    /// Open a throwaway in-memory store (tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::setup(conn)
    }

    fn setup(conn: Connection) -> Result<Self> {
        // WAL for crash recovery; a no-op on :memory: databases
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create blobs table")?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl BlobStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT value FROM blobs WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read blob: {}", key))
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        // Single-statement replace: readers see the old value or the new
        // one, never a mix
        conn.execute(
            "INSERT OR REPLACE INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, bytes, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("Failed to write blob: {}", key))?;

        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory store for tests and ephemeral runs
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> Vec<Box<dyn BlobStore>> {
        vec![
            Box::new(MemoryStore::new()),
            Box::new(SqliteStore::open_in_memory().unwrap()),
        ]
    }

    #[test]
    fn test_get_absent_key() {
        for store in stores() {
            assert!(store.get("missing").unwrap().is_none());
        }
    }

    #[test]
    fn test_set_then_get() {
        for store in stores() {
            store.set("k", b"hello").unwrap();
            assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"hello"[..]));
        }
    }

    #[test]
    fn test_set_replaces_previous_value() {
        for store in stores() {
            store.set("k", b"old").unwrap();
            store.set("k", b"new").unwrap();
            assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"new"[..]));
        }
    }

    #[test]
    fn test_binary_safe() {
        let blob: Vec<u8> = vec![0x1f, 0x8b, 0x00, 0xff, 0x00, 0x42];
        for store in stores() {
            store.set("bin", &blob).unwrap();
            assert_eq!(store.get("bin").unwrap().unwrap(), blob);
        }
    }

    #[test]
    fn test_set_json() {
        for store in stores() {
            let record = serde_json::json!({"counts": {"entities": 3}});
            store.set_json("meta", &record).unwrap();

            let bytes = store.get("meta").unwrap().unwrap();
            let restored: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(restored, record);
        }
    }

    #[test]
    fn test_keys_are_independent() {
        for store in stores() {
            store.set(DATASET_KEY, b"dataset").unwrap();
            store.set(METADATA_KEY, b"metadata").unwrap();

            assert_eq!(
                store.get(DATASET_KEY).unwrap().as_deref(),
                Some(&b"dataset"[..])
            );
            assert_eq!(
                store.get(METADATA_KEY).unwrap().as_deref(),
                Some(&b"metadata"[..])
            );
        }
    }
}
