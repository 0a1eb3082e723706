use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{Database, DbError};

pub const DEFAULT_MAX_CLIPBOARD_ITEMS: i64 = 100;

/// Keys the application layer persists through this store.
pub mod keys {
    pub const MAX_CLIPBOARD_ITEMS: &str = "max_clipboard_items";
    pub const THEME: &str = "theme";
    pub const LANGUAGE: &str = "language";
    pub const AUTOSTART_ENABLED: &str = "autostart_enabled";
}

// Upsert that keeps the row's original created_at: the coalescing subselect
// reads the existing row before INSERT OR REPLACE rewrites it.
const UPSERT_SETTING: &str = "
    INSERT OR REPLACE INTO user_settings (key, value, created_at, updated_at)
    VALUES (?1, ?2, COALESCE((SELECT created_at FROM user_settings WHERE key = ?1), ?3), ?3)
";

impl Database {
    pub fn save_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        let now = self.now();
        conn.execute(UPSERT_SETTING, params![key, value, now])?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT value FROM user_settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(DbError::from)
    }

    /// Only keys that exist are present in the result; callers apply their
    /// own defaults for the rest.
    pub fn get_settings(&self, keys: &[&str]) -> Result<HashMap<String, String>, DbError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.conn()?;
        let placeholders = keys.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let mut stmt = conn.prepare(&format!(
            "SELECT key, value FROM user_settings WHERE key IN ({placeholders})"
        ))?;
        let rows = stmt.query_map(params_from_iter(keys.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut values = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            values.insert(key, value);
        }
        Ok(values)
    }

    /// Atomic batch upsert: either every entry lands or none does.
    pub fn save_settings(&self, values: &HashMap<String, String>) -> Result<(), DbError> {
        if values.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let now = self.now();
        let tx = conn.transaction()?;
        for (key, value) in values {
            tx.execute(UPSERT_SETTING, params![key, value, now])?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn all_settings(&self) -> Result<HashMap<String, String>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM user_settings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut values = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            values.insert(key, value);
        }
        Ok(values)
    }

    pub fn max_clipboard_items(&self) -> Result<i64, DbError> {
        let conn = self.conn()?;
        max_clipboard_items(&conn).map_err(DbError::from)
    }
}

/// Capacity bound for the clipboard history. Absent, unparsable, or
/// non-positive values fall back to the default.
pub(super) fn max_clipboard_items(conn: &Connection) -> rusqlite::Result<i64> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM user_settings WHERE key = ?1",
            params![keys::MAX_CLIPBOARD_ITEMS],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_CLIPBOARD_ITEMS))
}
