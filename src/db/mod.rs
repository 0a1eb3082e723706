mod history;
mod schema;
mod settings;
mod snippets;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{format_timestamp, Clock, SystemClock};

pub use history::ClipboardEntry;
pub use settings::{keys, DEFAULT_MAX_CLIPBOARD_ITEMS};
pub use snippets::{NewSnippet, Snippet, SnippetUpdate};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    LockPoisoned,
    #[error("record not found")]
    NotFound,
    #[error("invalid content: {0}")]
    InvalidContent(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_snippets: i64,
    pub total_clipboard_items: i64,
    pub languages: Vec<String>,
}

pub struct Database {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self, DbError> {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    pub fn new_in_memory() -> Result<Self, DbError> {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    fn initialize(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        conn.execute_batch(schema::CREATE_SETTINGS_TABLE)?;
        conn.execute_batch(schema::CREATE_SNIPPETS_TABLE)?;
        conn.execute_batch(schema::CREATE_CLIPBOARD_TABLE)?;
        conn.execute_batch(schema::CREATE_INDEX_SNIPPETS_LANGUAGE)?;
        conn.execute_batch(schema::CREATE_INDEX_SNIPPETS_CREATED_AT)?;
        conn.execute_batch(schema::CREATE_INDEX_CLIPBOARD_CREATED_AT)?;
        conn.execute_batch(schema::CREATE_INDEX_CLIPBOARD_CONTENT)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn now(&self) -> String {
        format_timestamp(self.clock.now())
    }

    pub fn stats(&self) -> Result<DatabaseStats, DbError> {
        let (total_snippets, total_clipboard_items) = {
            let conn = self.conn()?;
            let snippets: i64 =
                conn.query_row("SELECT COUNT(*) FROM code_snippets", [], |row| row.get(0))?;
            let entries: i64 =
                conn.query_row("SELECT COUNT(*) FROM clipboard_items", [], |row| row.get(0))?;
            (snippets, entries)
        };
        Ok(DatabaseStats {
            total_snippets,
            total_clipboard_items,
            languages: self.languages()?,
        })
    }
}
