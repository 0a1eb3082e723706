use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::clipboard::Clipboard;
use crate::db::{ClipboardEntry, Database, DbError};
use crate::error::AppResult;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const MIN_CAPTURE_CHARS: usize = 3;

struct RunningWatch {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Polls the OS clipboard and appends qualifying changes to the history
/// store. Two states: idle and monitoring. Both the poll loop and outbound
/// copy actions drive the same "last observed" value, which is what keeps the
/// watcher from recapturing its own writes.
pub struct ClipboardWatcher {
    db: Arc<Database>,
    clipboard: Arc<dyn Clipboard>,
    poll_interval: Duration,
    last_observed: Mutex<Option<String>>,
    running: Mutex<Option<RunningWatch>>,
}

impl ClipboardWatcher {
    pub fn new(db: Arc<Database>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self::with_poll_interval(db, clipboard, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        db: Arc<Database>,
        clipboard: Arc<dyn Clipboard>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            db,
            clipboard,
            poll_interval,
            last_observed: Mutex::new(None),
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Begin monitoring. A no-op when already monitoring. Must be called
    /// from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return;
        }

        self.prime_last_observed();

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let watcher = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(watcher.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick fires immediately; consume it so the
            // first poll happens one full period after start.
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => watcher.poll_once(),
                }
            }
        });

        *running = Some(RunningWatch { shutdown, task });
    }

    /// Halt monitoring. An in-flight tick is allowed to complete, but no
    /// tick runs after this returns. A no-op when idle.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            let _ = running.shutdown.send(true);
            let _ = running.task.await;
        }
    }

    /// Callers that write to the OS clipboard themselves must report it here
    /// so the next poll does not treat the write as a fresh external copy.
    pub fn record_local_write(&self, content: &str) {
        let mut last_observed = self
            .last_observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last_observed = Some(content.to_string());
    }

    /// Write text to the OS clipboard without it bouncing back into history.
    pub fn copy_text(&self, content: &str) -> AppResult<()> {
        self.clipboard.write_text(content)?;
        self.record_local_write(content);
        Ok(())
    }

    // Content already on the clipboard when monitoring first starts is not
    // treated as a new copy.
    fn prime_last_observed(&self) {
        let mut last_observed = self
            .last_observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last_observed.is_some() {
            return;
        }
        if let Ok(Some(text)) = self.clipboard.read_text() {
            *last_observed = Some(text);
        }
    }

    fn poll_once(&self) {
        let text = match self.clipboard.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(err) => {
                // Transient read failures must not kill the loop.
                warn!("clipboard read failed: {err}");
                return;
            }
        };

        match self.capture(text) {
            Ok(Some(entry)) => debug!("captured clipboard entry {}", entry.id),
            Ok(None) => {}
            Err(err) => error!("failed to persist clipboard capture: {err}"),
        }
    }

    fn capture(&self, content: String) -> Result<Option<ClipboardEntry>, DbError> {
        if !is_capturable(&content) {
            return Ok(None);
        }

        let mut last_observed = self
            .last_observed
            .lock()
            .map_err(|_| DbError::LockPoisoned)?;
        if last_observed.as_deref() == Some(content.as_str()) {
            return Ok(None);
        }

        // The content differs from what we last saw; it still may already sit
        // in history (e.g. the user re-copied an old fragment).
        let entry = if self.db.history_contains(&content)? {
            None
        } else {
            Some(self.db.add_clipboard_entry(&content)?)
        };

        *last_observed = Some(content);
        Ok(entry)
    }
}

pub fn is_capturable(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && trimmed.chars().count() >= MIN_CAPTURE_CHARS
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::clipboard::ClipboardError;

    #[derive(Default)]
    struct FakeClipboard {
        text: Mutex<Option<String>>,
        fail_reads: AtomicBool,
    }

    impl FakeClipboard {
        fn set(&self, content: &str) {
            *self.text.lock().expect("fake lock") = Some(content.to_string());
        }
    }

    impl Clipboard for FakeClipboard {
        fn read_text(&self) -> Result<Option<String>, ClipboardError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ClipboardError::Backend("simulated failure".to_string()));
            }
            Ok(self.text.lock().expect("fake lock").clone())
        }

        fn write_text(&self, content: &str) -> Result<(), ClipboardError> {
            self.set(content);
            Ok(())
        }
    }

    fn watcher_fixture() -> (Arc<ClipboardWatcher>, Arc<Database>, Arc<FakeClipboard>) {
        let db = Arc::new(Database::new_in_memory().expect("db init"));
        let clipboard = Arc::new(FakeClipboard::default());
        let capability: Arc<dyn Clipboard> = clipboard.clone();
        let watcher = Arc::new(ClipboardWatcher::with_poll_interval(
            Arc::clone(&db),
            capability,
            Duration::from_millis(10),
        ));
        (watcher, db, clipboard)
    }

    #[test]
    fn capturable_requires_three_trimmed_chars() {
        assert!(is_capturable("abc"));
        assert!(is_capturable("  abc  "));
        assert!(!is_capturable(""));
        assert!(!is_capturable("   "));
        assert!(!is_capturable(" ab "));
    }

    #[test]
    fn capture_stores_new_content() {
        let (watcher, db, _) = watcher_fixture();

        let entry = watcher
            .capture("fresh content".to_string())
            .expect("capture")
            .expect("entry stored");
        assert_eq!(entry.content, "fresh content");
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);
    }

    #[test]
    fn capture_skips_repeat_of_last_observed() {
        let (watcher, db, _) = watcher_fixture();

        watcher
            .capture("hello world".to_string())
            .expect("first capture");
        let second = watcher
            .capture("hello world".to_string())
            .expect("second capture");

        assert!(second.is_none());
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);
    }

    #[test]
    fn capture_skips_content_already_in_history() {
        let (watcher, db, _) = watcher_fixture();
        db.add_clipboard_entry("recycled fragment").expect("seed history");
        watcher.record_local_write("something else");

        let captured = watcher
            .capture("recycled fragment".to_string())
            .expect("capture");

        assert!(captured.is_none());
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);
        // Last observed still advances, so the next identical read is the
        // cheap O(1) skip.
        let last = watcher
            .last_observed
            .lock()
            .expect("state lock")
            .clone();
        assert_eq!(last.as_deref(), Some("recycled fragment"));
    }

    #[test]
    fn capture_ignores_short_or_blank_content() {
        let (watcher, db, _) = watcher_fixture();

        assert!(watcher.capture("ab".to_string()).expect("short").is_none());
        assert!(watcher.capture("   ".to_string()).expect("blank").is_none());
        assert!(db.clipboard_history(10).expect("history").is_empty());
    }

    #[test]
    fn copy_text_does_not_bounce_back_into_history() {
        let (watcher, db, clipboard) = watcher_fixture();

        watcher.copy_text("copied from app").expect("copy");
        assert_eq!(
            clipboard.read_text().expect("read").as_deref(),
            Some("copied from app")
        );

        watcher.poll_once();
        assert!(db.clipboard_history(10).expect("history").is_empty());
    }

    #[test]
    fn poll_survives_read_failures() {
        let (watcher, db, clipboard) = watcher_fixture();

        clipboard.fail_reads.store(true, Ordering::SeqCst);
        watcher.poll_once();
        assert!(db.clipboard_history(10).expect("history").is_empty());

        clipboard.fail_reads.store(false, Ordering::SeqCst);
        clipboard.set("recovered content");
        watcher.poll_once();
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_polls_and_stop_halts() {
        let (watcher, db, clipboard) = watcher_fixture();

        watcher.start();
        assert!(watcher.is_running());
        // Starting again while monitoring is a no-op.
        watcher.start();

        clipboard.set("captured while running");
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);

        watcher.stop().await;
        assert!(!watcher.is_running());

        clipboard.set("changed after stop");
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);

        // Stopping while idle is a no-op.
        watcher.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_primes_last_observed_from_current_clipboard() {
        let (watcher, db, clipboard) = watcher_fixture();
        clipboard.set("already on the clipboard");

        watcher.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Pre-existing content is not captured; a later change is.
        assert!(db.clipboard_history(10).expect("history").is_empty());
        clipboard.set("a genuine change");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(db.clipboard_history(10).expect("history").len(), 1);

        watcher.stop().await;
    }
}
