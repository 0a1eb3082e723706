use std::collections::{BTreeSet, HashSet};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DbError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub language: String,
    pub code: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewSnippet<'a> {
    pub title: &'a str,
    pub language: &'a str,
    pub code: &'a str,
    pub tags: &'a [String],
}

/// Partial update: `None` fields keep their stored value.
#[derive(Debug, Default, Clone)]
pub struct SnippetUpdate {
    pub title: Option<String>,
    pub language: Option<String>,
    pub code: Option<String>,
    pub tags: Option<Vec<String>>,
}

const SNIPPET_COLUMNS: &str = "id, title, language, code, tags, created_at, updated_at";

impl Database {
    pub fn create_snippet(&self, snippet: NewSnippet<'_>) -> Result<Snippet, DbError> {
        let tags_json = serde_json::to_string(snippet.tags)?;
        let conn = self.conn()?;
        let now = self.now();
        conn.execute(
            "
            INSERT INTO code_snippets (title, language, code, tags, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ",
            params![snippet.title, snippet.language, snippet.code, tags_json, now],
        )?;
        let id = conn.last_insert_rowid();
        Ok(get_snippet_internal(&conn, id)?)
    }

    /// Newest first; the ordering is part of the display contract.
    pub fn list_snippets(&self) -> Result<Vec<Snippet>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM code_snippets ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], snippet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn get_snippet(&self, id: i64) -> Result<Option<Snippet>, DbError> {
        let conn = self.conn()?;
        get_snippet_internal(&conn, id)
            .optional()
            .map_err(DbError::from)
    }

    pub fn update_snippet(&self, id: i64, update: SnippetUpdate) -> Result<(), DbError> {
        let mut conn = self.conn()?;
        let now = self.now();
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                &format!("SELECT {SNIPPET_COLUMNS} FROM code_snippets WHERE id = ?1"),
                params![id],
                snippet_from_row,
            )
            .optional()?
            .ok_or(DbError::NotFound)?;

        let title = update.title.unwrap_or(current.title);
        let language = update.language.unwrap_or(current.language);
        let code = update.code.unwrap_or(current.code);
        let tags = update.tags.unwrap_or(current.tags);
        let tags_json = serde_json::to_string(&tags)?;

        tx.execute(
            "
            UPDATE code_snippets
            SET title = ?1, language = ?2, code = ?3, tags = ?4, updated_at = ?5
            WHERE id = ?6
            ",
            params![title, language, code, tags_json, now, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_snippet(&self, id: i64) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM code_snippets WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn delete_snippets(&self, ids: &[i64]) -> Result<usize, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        for id in ids {
            deleted += tx.execute("DELETE FROM code_snippets WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// Case-insensitive substring match over title, code, and the serialized
    /// tag list. A blank query means "everything".
    pub fn search_snippets(&self, query: &str) -> Result<Vec<Snippet>, DbError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return self.list_snippets();
        }

        let like = format!("%{}%", trimmed.to_lowercase());
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "
            SELECT {SNIPPET_COLUMNS}
            FROM code_snippets
            WHERE LOWER(title) LIKE ?1 OR LOWER(code) LIKE ?1 OR LOWER(tags) LIKE ?1
            ORDER BY created_at DESC, id DESC
            "
        ))?;
        let rows = stmt.query_map(params![like], snippet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Exact, case-sensitive match on the stored language code.
    pub fn list_snippets_by_language(&self, language: &str) -> Result<Vec<Snippet>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "
            SELECT {SNIPPET_COLUMNS}
            FROM code_snippets
            WHERE language = ?1
            ORDER BY created_at DESC, id DESC
            "
        ))?;
        let rows = stmt.query_map(params![language], snippet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// AND semantics: a snippet qualifies only if every requested tag appears
    /// (case-insensitively) among its own. Containment is checked against the
    /// parsed tag set, not the serialized JSON, so tag names that are
    /// substrings of other tag names cannot false-positive.
    pub fn list_snippets_by_tags(&self, tags: &[String]) -> Result<Vec<Snippet>, DbError> {
        let wanted: Vec<String> = tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        if wanted.is_empty() {
            return self.list_snippets();
        }

        let all = self.list_snippets()?;
        Ok(all
            .into_iter()
            .filter(|snippet| {
                let have: HashSet<String> = snippet
                    .tags
                    .iter()
                    .map(|tag| tag.trim().to_lowercase())
                    .collect();
                wanted.iter().all(|tag| have.contains(tag))
            })
            .collect())
    }

    /// Deduplicated, trimmed, lexicographically sorted union of every
    /// snippet's tags. Case is preserved.
    pub fn all_tags(&self) -> Result<Vec<String>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT tags FROM code_snippets WHERE tags != '[]' AND tags != ''")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tags = BTreeSet::new();
        for row in rows {
            for tag in parse_tags(&row?) {
                let trimmed = tag.trim();
                if !trimmed.is_empty() {
                    tags.insert(trimmed.to_string());
                }
            }
        }
        Ok(tags.into_iter().collect())
    }

    pub fn languages(&self) -> Result<Vec<String>, DbError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT language FROM code_snippets ORDER BY language")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn get_snippet_internal(conn: &Connection, id: i64) -> Result<Snippet, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {SNIPPET_COLUMNS} FROM code_snippets WHERE id = ?1"),
        params![id],
        snippet_from_row,
    )
}

fn snippet_from_row(row: &Row<'_>) -> Result<Snippet, rusqlite::Error> {
    Ok(Snippet {
        id: row.get(0)?,
        title: row.get(1)?,
        language: row.get(2)?,
        code: row.get(3)?,
        tags: parse_tags(&row.get::<_, String>(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// A malformed tags column yields no tags rather than failing the whole row.
fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
