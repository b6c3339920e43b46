use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::store::KeyValueStore;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to read key {key}"))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO kv_store (key, value)
                VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value
                "#,
                params![key, value],
            )
            .with_context(|| format!("failed to write key {key}"))?;
        log::trace!("stored {key}");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv_store ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().expect("in-memory db should open");
        store.migrate().expect("schema should apply");
        store
    }

    #[test]
    fn set_then_get_returns_latest_value() {
        let db = store();
        db.set("fontSize", "1.1").unwrap();
        db.set("fontSize", "1.3").unwrap();
        assert_eq!(db.get("fontSize").unwrap().as_deref(), Some("1.3"));
    }

    #[test]
    fn get_missing_key_is_none() {
        let db = store();
        assert!(db.get("theme").unwrap().is_none());
    }

    #[test]
    fn keys_lists_each_key_once_in_first_write_order() {
        let db = store();
        db.set("reading_b", "{}").unwrap();
        db.set("theme", "dark").unwrap();
        db.set("reading_b", "{\"chapter\":2}").unwrap();
        assert_eq!(
            db.keys().unwrap(),
            vec!["reading_b".to_string(), "theme".to_string()]
        );
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = store();
        db.set("theme", "dark").unwrap();
        db.migrate().unwrap();
        assert_eq!(db.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
