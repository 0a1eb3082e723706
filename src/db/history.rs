use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{settings, Database, DbError};

const MIN_CONTENT_CHARS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardEntry {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

const ENTRY_COLUMNS: &str = "id, content, created_at, updated_at";

impl Database {
    /// Insert a capture and enforce the capacity bound in the same
    /// transaction, so readers never observe the store over capacity. The
    /// bound comes from the `max_clipboard_items` setting (default 100).
    pub fn add_clipboard_entry(&self, content: &str) -> Result<ClipboardEntry, DbError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DbError::InvalidContent("content is empty".to_string()));
        }
        if trimmed.chars().count() < MIN_CONTENT_CHARS {
            return Err(DbError::InvalidContent(format!(
                "content shorter than {MIN_CONTENT_CHARS} characters"
            )));
        }

        let mut conn = self.conn()?;
        let now = self.now();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO clipboard_items (content, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![content, now],
        )?;
        let id = tx.last_insert_rowid();

        let max_items = settings::max_clipboard_items(&tx)?;
        tx.execute(
            "
            DELETE FROM clipboard_items
            WHERE id NOT IN (
                SELECT id FROM clipboard_items
                ORDER BY created_at DESC, id DESC
                LIMIT ?1
            )
            ",
            params![max_items],
        )?;

        let entry = tx.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM clipboard_items WHERE id = ?1"),
            params![id],
            entry_from_row,
        )?;
        tx.commit()?;
        Ok(entry)
    }

    pub fn clipboard_history(&self, limit: i64) -> Result<Vec<ClipboardEntry>, DbError> {
        let limit = limit.max(1);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "
            SELECT {ENTRY_COLUMNS}
            FROM clipboard_items
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "
        ))?;
        let rows = stmt.query_map(params![limit], entry_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn get_clipboard_entry(&self, id: i64) -> Result<Option<ClipboardEntry>, DbError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM clipboard_items WHERE id = ?1"),
            params![id],
            entry_from_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn delete_clipboard_entry(&self, id: i64) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM clipboard_items WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn clear_clipboard_history(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM clipboard_items", [])?;
        Ok(())
    }

    /// Exact-content membership probe, backed by the content index. Used by
    /// the watcher to avoid re-inserting text that already sits in history.
    pub fn history_contains(&self, content: &str) -> Result<bool, DbError> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM clipboard_items WHERE content = ?1)",
            params![content],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

fn entry_from_row(row: &Row<'_>) -> Result<ClipboardEntry, rusqlite::Error> {
    Ok(ClipboardEntry {
        id: row.get(0)?,
        content: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::keys;

    #[test]
    fn add_rejects_blank_and_too_short_content() {
        let db = Database::new_in_memory().expect("db init");

        for content in ["", "   ", "\n\t", "ab", " ab "] {
            let result = db.add_clipboard_entry(content);
            assert!(
                matches!(result, Err(DbError::InvalidContent(_))),
                "{content:?} should be rejected"
            );
        }
        assert!(db.clipboard_history(10).expect("history").is_empty());
    }

    #[test]
    fn add_returns_persisted_entry() {
        let db = Database::new_in_memory().expect("db init");
        let entry = db.add_clipboard_entry("hello world").expect("add");

        assert!(entry.id > 0);
        assert_eq!(entry.content, "hello world");
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(
            db.get_clipboard_entry(entry.id).expect("get"),
            Some(entry)
        );
    }

    #[test]
    fn capacity_bound_evicts_oldest_in_same_add() {
        let db = Database::new_in_memory().expect("db init");
        db.save_setting(keys::MAX_CLIPBOARD_ITEMS, "3").expect("cap");

        for n in 1..=5 {
            db.add_clipboard_entry(&format!("entry number {n}")).expect("add");
        }

        let contents: Vec<String> = db
            .clipboard_history(10)
            .expect("history")
            .into_iter()
            .map(|entry| entry.content)
            .collect();
        assert_eq!(
            contents,
            vec!["entry number 5", "entry number 4", "entry number 3"]
        );
    }

    #[test]
    fn capacity_defaults_to_one_hundred() {
        let db = Database::new_in_memory().expect("db init");
        for n in 1..=150 {
            db.add_clipboard_entry(&format!("distinct content {n:03}")).expect("add");
        }

        let history = db.clipboard_history(200).expect("history");
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].content, "distinct content 150");
        assert_eq!(history[99].content, "distinct content 051");
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let db = Database::new_in_memory().expect("db init");
        db.add_clipboard_entry("first entry").expect("add");
        db.add_clipboard_entry("second entry").expect("add");
        db.add_clipboard_entry("third entry").expect("add");

        let history = db.clipboard_history(2).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "third entry");
        assert_eq!(history[1].content, "second entry");
    }

    #[test]
    fn get_missing_entry_is_none() {
        let db = Database::new_in_memory().expect("db init");
        assert!(db.get_clipboard_entry(42).expect("get").is_none());
    }

    #[test]
    fn delete_and_clear_remove_rows() {
        let db = Database::new_in_memory().expect("db init");
        let entry = db.add_clipboard_entry("hello world").expect("add");
        db.add_clipboard_entry("other text").expect("add");

        db.delete_clipboard_entry(entry.id).expect("delete");
        assert!(db.get_clipboard_entry(entry.id).expect("get").is_none());
        db.delete_clipboard_entry(entry.id).expect("delete again");

        db.clear_clipboard_history().expect("clear");
        assert!(db.clipboard_history(10).expect("history").is_empty());
    }

    #[test]
    fn contains_matches_exact_content_only() {
        let db = Database::new_in_memory().expect("db init");
        db.add_clipboard_entry("hello world").expect("add");

        assert!(db.history_contains("hello world").expect("contains"));
        assert!(!db.history_contains("hello").expect("substring"));
        assert!(!db.history_contains("HELLO WORLD").expect("case"));
    }
}
