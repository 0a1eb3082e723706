use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard backend error: {0}")]
    Backend(String),
    #[error("clipboard lock poisoned")]
    LockPoisoned,
}

/// Access to the OS clipboard. The persistence core only ever talks to this
/// trait; the watcher takes any implementation, which keeps tests off the
/// real system clipboard.
pub trait Clipboard: Send + Sync {
    /// Current clipboard text. `Ok(None)` when the clipboard is empty or
    /// holds no text representation.
    fn read_text(&self) -> Result<Option<String>, ClipboardError>;
    fn write_text(&self, content: &str) -> Result<(), ClipboardError>;
}

pub struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner = arboard::Clipboard::new()
            .map_err(|err| ClipboardError::Backend(err.to_string()))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }
}

impl Clipboard for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_: PoisonError<_>| ClipboardError::LockPoisoned)?;
        match inner.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(err) => Err(ClipboardError::Backend(err.to_string())),
        }
    }

    fn write_text(&self, content: &str) -> Result<(), ClipboardError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_: PoisonError<_>| ClipboardError::LockPoisoned)?;
        inner
            .set_text(content.to_string())
            .map_err(|err| ClipboardError::Backend(err.to_string()))
    }
}

pub fn system_clipboard() -> Result<Arc<dyn Clipboard>, ClipboardError> {
    Ok(Arc::new(SystemClipboard::new()?))
}
