use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::app::prefs::{PrefKey, PreferenceStore};

#[derive(Debug, Clone)]
pub struct StoredPref {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
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

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get_pref(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_pref(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn delete_pref(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    pub fn stored_pref(&self, key: &str) -> Result<Option<StoredPref>> {
        let row = self
            .conn
            .query_row(
                "SELECT key, value, updated_at FROM preferences WHERE key = ?1",
                params![key],
                |row| {
                    Ok(StoredPref {
                        key: row.get(0)?,
                        value: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

impl PreferenceStore for Database {
    fn load(&self, key: &PrefKey) -> Result<Option<String>> {
        self.get_pref(&key.storage_key())
    }

    fn store(&self, key: &PrefKey, value: &str) -> Result<()> {
        self.set_pref(&key.storage_key(), value)
    }

    fn remove(&self, key: &PrefKey) -> Result<bool> {
        self.delete_pref(&key.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::model::MediaId;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::open(&dir.path().join("nested").join("prefs.db")).expect("open db");
        db.migrate().expect("migrate");
        (dir, db)
    }

    #[test]
    fn upsert_replaces_previous_value() {
        let (_dir, db) = open_temp();
        db.set_pref("player_layout_preference", "episodes_right")
            .expect("first write");
        db.set_pref("player_layout_preference", "player_only")
            .expect("second write");
        assert_eq!(
            db.get_pref("player_layout_preference").expect("read"),
            Some("player_only".to_string())
        );
        let stored = db
            .stored_pref("player_layout_preference")
            .expect("read row")
            .expect("row exists");
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.updated_at).is_ok());
    }

    #[test]
    fn typed_keys_round_through_the_store() {
        let (_dir, db) = open_temp();
        let key = PrefKey::LastWatchedEpisode(MediaId::new("42").expect("id"));
        db.store(&key, "107").expect("store");
        assert_eq!(
            db.get_pref("last_watched_episode_42").expect("read"),
            Some("107".to_string())
        );
        assert!(db.remove(&key).expect("remove"));
        assert!(!db.remove(&key).expect("second remove"));
        assert_eq!(db.load(&key).expect("load"), None);
    }

    #[test]
    fn migrate_is_idempotent() {
        let (_dir, db) = open_temp();
        db.migrate().expect("second migrate");
        assert_eq!(db.get_pref("missing").expect("read"), None);
    }
}
