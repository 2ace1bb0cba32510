//! Clipboard access and the transient "copied" marker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use passop_core::record::Field;

use crate::error::ClientError;

/// How long a copied cell stays marked.
pub const COPY_FEEDBACK_DELAY: Duration = Duration::from_secs(2);

/// Somewhere copied text can be written.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Clipboard`] if the write fails.
    fn set_text(&mut self, text: &str) -> Result<(), ClientError>;
}

/// The operating system clipboard.
///
/// The handle is opened on first use and kept for the lifetime of this
/// value, since some platforms drop the contents when the owner goes away.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClientError> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(|e| ClientError::Clipboard(e.to_string()))?,
        };
        let result = clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClientError::Clipboard(e.to_string()));
        self.inner = Some(clipboard);
        result
    }
}

/// An in-process clipboard. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last text written, if any.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClientError> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|e| ClientError::Clipboard(e.to_string()))?;
        *contents = Some(text.to_owned());
        Ok(())
    }
}

/// Which cell was copied last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyMarker {
    pub id: String,
    pub field: Field,
}

/// Owner of the copy marker and its auto-clear timer.
///
/// Marking again aborts the pending timer, so an older timer can never
/// clear a newer marker. Dropping the owner aborts the timer.
#[derive(Debug)]
pub struct CopyFeedback {
    marker: Arc<watch::Sender<Option<CopyMarker>>>,
    timer: Option<JoinHandle<()>>,
    delay: Duration,
}

impl Default for CopyFeedback {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyFeedback {
    #[must_use]
    pub fn new() -> Self {
        Self::with_delay(COPY_FEEDBACK_DELAY)
    }

    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        let (marker, _) = watch::channel(None);
        Self {
            marker: Arc::new(marker),
            timer: None,
            delay,
        }
    }

    /// Set the marker and schedule it to clear after the delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mark(&mut self, marker: CopyMarker) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.marker.send_replace(Some(marker));

        let sender = Arc::clone(&self.marker);
        let delay = self.delay;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send_replace(None);
        }));
    }

    /// The current marker.
    #[must_use]
    pub fn current(&self) -> Option<CopyMarker> {
        self.marker.borrow().clone()
    }

    /// Whether the given cell is currently marked.
    #[must_use]
    pub fn is_marked(&self, id: &str, field: Field) -> bool {
        self.marker
            .borrow()
            .as_ref()
            .is_some_and(|m| m.id == id && m.field == field)
    }

    /// Watch marker changes, e.g. to redraw when it clears.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<CopyMarker>> {
        self.marker.subscribe()
    }
}

impl Drop for CopyFeedback {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
