pub const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_settings (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#;

pub const CREATE_SNIPPETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS code_snippets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  language TEXT NOT NULL,
  code TEXT NOT NULL,
  tags TEXT NOT NULL DEFAULT '[]',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#;

pub const CREATE_CLIPBOARD_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clipboard_items (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  content TEXT NOT NULL CHECK (length(content) > 0),
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#;

pub const CREATE_INDEX_SNIPPETS_LANGUAGE: &str =
    "CREATE INDEX IF NOT EXISTS idx_snippets_language ON code_snippets(language);";
pub const CREATE_INDEX_SNIPPETS_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_snippets_created_at ON code_snippets(created_at DESC);";
pub const CREATE_INDEX_CLIPBOARD_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_clipboard_created_at ON clipboard_items(created_at DESC);";
pub const CREATE_INDEX_CLIPBOARD_CONTENT: &str =
    "CREATE INDEX IF NOT EXISTS idx_clipboard_content ON clipboard_items(content);";
