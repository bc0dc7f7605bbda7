//! # siteconf-db
//!
//! Persistent storage for updated config options, backed by SQLite.
//!
//! Values live in a single `system_info` table keyed by option key. The
//! value column holds the string form of the option value, or `NULL` for a
//! cleared option.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use siteconf_core::{ConfigError, ConfigResult, SystemInfo, SystemInfoStore};
use std::path::Path;
use tracing::debug;

/// `system_info` storage backed by SQLite.
pub struct SqliteSystemInfoStore {
    conn: Mutex<Connection>,
}

impl SqliteSystemInfoStore {
    /// Opens (or creates) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| storage(format!("failed to open {}: {e}", path.display())))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("Opened system_info store at {}", path.display());
        Ok(store)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> ConfigResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| storage(format!("failed to open in-memory store: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> ConfigResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS system_info (
                key TEXT PRIMARY KEY,
                value TEXT,
                updated_at TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| storage(format!("failed to init system_info schema: {e}")))?;
        Ok(())
    }

    /// Returns the number of stored rows.
    pub fn count(&self) -> ConfigResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM system_info", [], |row| row.get(0))
            .map_err(|e| storage(format!("failed to count system_info: {e}")))?;
        Ok(count as usize)
    }
}

impl SystemInfoStore for SqliteSystemInfoStore {
    fn get(&self, key: &str) -> ConfigResult<Option<SystemInfo>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT key, value, updated_at FROM system_info WHERE key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| storage(format!("failed to read '{key}': {e}")))?;

        row.map(|(key, value, ts)| to_system_info(key, value, ts))
            .transpose()
    }

    fn upsert_many(&self, rows: &[(String, Option<String>)]) -> ConfigResult<Vec<SystemInfo>> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| storage(format!("failed to begin transaction: {e}")))?;

        for (key, value) in rows {
            tx.execute(
                "INSERT INTO system_info (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, stamp],
            )
            .map_err(|e| storage(format!("failed to upsert '{key}': {e}")))?;
        }

        tx.commit()
            .map_err(|e| storage(format!("failed to commit system_info: {e}")))?;

        Ok(rows
            .iter()
            .map(|(key, value)| SystemInfo {
                key: key.clone(),
                value: value.clone(),
                updated_at: now,
            })
            .collect())
    }

    fn delete(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .execute("DELETE FROM system_info WHERE key = ?1", params![key])
            .map_err(|e| storage(format!("failed to delete '{key}': {e}")))?;
        Ok(changed > 0)
    }

    fn list(&self) -> ConfigResult<Vec<SystemInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key, value, updated_at FROM system_info ORDER BY key")
            .map_err(|e| storage(format!("failed to prepare system_info query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let value: Option<String> = row.get(1)?;
                let ts: String = row.get(2)?;
                Ok((key, value, ts))
            })
            .map_err(|e| storage(format!("failed to query system_info: {e}")))?;

        let mut result = Vec::new();
        for row in rows {
            let (key, value, ts) =
                row.map_err(|e| storage(format!("failed to read system_info row: {e}")))?;
            result.push(to_system_info(key, value, ts)?);
        }
        Ok(result)
    }
}

fn to_system_info(key: String, value: Option<String>, ts: String) -> ConfigResult<SystemInfo> {
    let updated_at = DateTime::parse_from_rfc3339(&ts)
        .map_err(|e| storage(format!("invalid updated_at for '{key}': {e}")))?
        .with_timezone(&Utc);
    Ok(SystemInfo {
        key,
        value,
        updated_at,
    })
}

fn storage(msg: String) -> ConfigError {
    ConfigError::Storage(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_get() {
        let store = SqliteSystemInfoStore::open_in_memory().unwrap();

        store.upsert("site.datasets_per_page", "5").unwrap();
        let row = store.get("site.datasets_per_page").unwrap().unwrap();

        assert_eq!(row.key, "site.datasets_per_page");
        assert_eq!(row.value.as_deref(), Some("5"));
        assert!(store.get("site.title").unwrap().is_none());
    }

    #[test]
    fn test_upsert_overwrites_existing_row() {
        let store = SqliteSystemInfoStore::open_in_memory().unwrap();

        store.upsert("site.title", "Portal").unwrap();
        store.upsert("site.title", "Renamed").unwrap();

        assert_eq!(
            store.get_value("site.title").unwrap(),
            Some("Renamed".to_string())
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_is_sorted() {
        let store = SqliteSystemInfoStore::open_in_memory().unwrap();
        store
            .upsert_many(&[
                ("site.title".to_string(), Some("Portal".to_string())),
                ("site.about".to_string(), Some("About".to_string())),
            ])
            .unwrap();

        let keys: Vec<String> = store.list().unwrap().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["site.about", "site.title"]);
    }

    #[test]
    fn test_delete() {
        let store = SqliteSystemInfoStore::open_in_memory().unwrap();
        store.upsert("site.title", "Portal").unwrap();

        assert!(store.delete("site.title").unwrap());
        assert!(!store.delete("site.title").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_cleared_row_is_distinct_from_empty_string() {
        let store = SqliteSystemInfoStore::open_in_memory().unwrap();
        store
            .upsert_many(&[
                ("site.title".to_string(), Some(String::new())),
                ("site.about".to_string(), None),
            ])
            .unwrap();

        assert_eq!(store.get_value("site.title").unwrap(), Some(String::new()));
        let cleared = store.get("site.about").unwrap().unwrap();
        assert_eq!(cleared.value, None);
        assert_eq!(store.count().unwrap(), 2);
    }
}
