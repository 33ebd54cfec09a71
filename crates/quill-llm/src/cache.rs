//! Response caching.
//!
//! Keys are serialized call args (streaming flag stripped); values are
//! full [`CompletionResponse`]s. The sqlite backend owns its own TTL and
//! count eviction; callers only find and insert.

use std::path::Path;

use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::errors::Result;
use crate::response::CompletionResponse;

/// A lookup/insert store for deterministic responses.
pub trait ResponseCache: Send + Sync {
    /// Find a cached response by key.
    fn find(&self, key: &str) -> Result<Option<CompletionResponse>>;

    /// Insert a response under `key`.
    fn insert(&self, key: &str, response: &CompletionResponse) -> Result<()>;
}

/// Unbounded in-process cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CompletionResponse>,
}

impl MemoryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResponseCache for MemoryCache {
    fn find(&self, key: &str) -> Result<Option<CompletionResponse>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn insert(&self, key: &str, response: &CompletionResponse) -> Result<()> {
        self.entries.insert(key.to_string(), response.clone());
        Ok(())
    }
}

/// Sqlite-backed cache surviving across processes.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    max_entries: u64,
    ttl_secs: u64,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`.
    ///
    /// `ttl_secs` of zero disables expiry; `max_entries` always applies,
    /// evicting the oldest rows first.
    pub fn open(path: &Path, max_entries: u64, ttl_secs: u64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache (
                uuid TEXT PRIMARY KEY,
                key TEXT,
                value TEXT,
                timestamp TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_entries,
            ttl_secs,
        })
    }

    /// In-memory sqlite database, for tests.
    pub fn open_in_memory(max_entries: u64, ttl_secs: u64) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache (
                uuid TEXT PRIMARY KEY,
                key TEXT,
                value TEXT,
                timestamp TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_entries,
            ttl_secs,
        })
    }

    fn row_id(key: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, key.as_bytes()).to_string()
    }

    fn cleanup(&self, conn: &Connection) -> Result<()> {
        if self.ttl_secs > 0 {
            let expiry = Utc::now() - ChronoDuration::seconds(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX));
            conn.execute(
                "DELETE FROM cache WHERE timestamp < ?1",
                params![expiry.to_rfc3339()],
            )?;
        }
        conn.execute(
            "DELETE FROM cache WHERE uuid IN (
                SELECT uuid FROM cache
                ORDER BY timestamp ASC
                LIMIT max(0, (SELECT COUNT(*) FROM cache) - ?1)
            )",
            params![self.max_entries],
        )?;
        Ok(())
    }
}

impl ResponseCache for SqliteCache {
    fn find(&self, key: &str) -> Result<Option<CompletionResponse>> {
        let conn = self.conn.lock();
        if self.ttl_secs > 0 {
            let expiry = Utc::now() - ChronoDuration::seconds(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX));
            conn.execute(
                "DELETE FROM cache WHERE timestamp < ?1",
                params![expiry.to_rfc3339()],
            )?;
        }
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM cache WHERE uuid = ?1",
                params![Self::row_id(key)],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, key: &str, response: &CompletionResponse) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO cache (uuid, key, value, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                Self::row_id(key),
                key,
                serde_json::to_string(response)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        self.cleanup(&conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_round_trips() {
        let cache = MemoryCache::new();
        assert!(cache.find("k").unwrap().is_none());
        cache
            .insert("k", &CompletionResponse::text("v"))
            .unwrap();
        assert_eq!(cache.find("k").unwrap().unwrap().content, "v");
    }

    #[test]
    fn sqlite_cache_round_trips() {
        let cache = SqliteCache::open_in_memory(100, 0).unwrap();
        assert!(cache.find("k").unwrap().is_none());
        cache
            .insert("k", &CompletionResponse::text("v"))
            .unwrap();
        assert_eq!(cache.find("k").unwrap().unwrap().content, "v");
    }

    #[test]
    fn sqlite_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        {
            let cache = SqliteCache::open(&path, 100, 0).unwrap();
            cache
                .insert("k", &CompletionResponse::text("v"))
                .unwrap();
        }
        let cache = SqliteCache::open(&path, 100, 0).unwrap();
        assert_eq!(cache.find("k").unwrap().unwrap().content, "v");
    }

    #[test]
    fn count_eviction_drops_the_oldest() {
        let cache = SqliteCache::open_in_memory(2, 0).unwrap();
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            // Distinct timestamps so eviction order is deterministic.
            let conn = cache.conn.lock();
            conn.execute(
                "INSERT OR REPLACE INTO cache (uuid, key, value, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![
                    SqliteCache::row_id(key),
                    key,
                    serde_json::to_string(&CompletionResponse::text(*key)).unwrap(),
                    format!("2026-01-01T00:00:0{i}+00:00")
                ],
            )
            .unwrap();
            cache.cleanup(&conn).unwrap();
        }
        assert!(cache.find("a").unwrap().is_none());
        assert!(cache.find("b").unwrap().is_some());
        assert!(cache.find("c").unwrap().is_some());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = SqliteCache::open_in_memory(100, 60).unwrap();
        {
            let conn = cache.conn.lock();
            conn.execute(
                "INSERT INTO cache (uuid, key, value, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![
                    SqliteCache::row_id("old"),
                    "old",
                    serde_json::to_string(&CompletionResponse::text("stale")).unwrap(),
                    (Utc::now() - ChronoDuration::seconds(120)).to_rfc3339()
                ],
            )
            .unwrap();
        }
        assert!(cache.find("old").unwrap().is_none());
    }
}
