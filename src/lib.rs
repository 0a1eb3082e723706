pub mod clipboard;
pub mod clock;
pub mod db;
pub mod error;
pub mod watcher;

pub use clipboard::{system_clipboard, Clipboard, ClipboardError, SystemClipboard};
pub use clock::{Clock, SystemClock, TIMESTAMP_FORMAT};
pub use db::{
    keys, ClipboardEntry, Database, DatabaseStats, DbError, NewSnippet, Snippet, SnippetUpdate,
    DEFAULT_MAX_CLIPBOARD_ITEMS,
};
pub use error::{AppError, AppResult};
pub use watcher::{ClipboardWatcher, DEFAULT_POLL_INTERVAL};
