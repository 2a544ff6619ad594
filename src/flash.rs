//! Flash message queue
//!
//! Messages are kept in insertion order under a generated id. Non-persistent
//! messages remove themselves after the configured delay; removing an entry
//! that is already gone is a no-op, so a late timer never disturbs the queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

pub type FlashId = Uuid;

/// Types of flash messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Warning,
    Error,
    Info,
    Success,
}

impl FlashKind {
    pub fn as_str(&self) -> &str {
        match self {
            FlashKind::Warning => "warning",
            FlashKind::Error => "error",
            FlashKind::Info => "info",
            FlashKind::Success => "success",
        }
    }
}

/// Flash message with type and content. `message` may carry HTML markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub message: String,
    pub kind: FlashKind,
    pub persistent: bool,
}

impl Flash {
    pub fn new(message: impl Into<String>, kind: FlashKind) -> Self {
        Self {
            message: message.into(),
            kind,
            persistent: false,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, FlashKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, FlashKind::Error)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, FlashKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, FlashKind::Success)
    }

    /// Keep the message until it is removed explicitly
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FlashQueue {
    entries: Arc<watch::Sender<Vec<(FlashId, Flash)>>>,
    remove_delay: Duration,
}

impl Default for FlashQueue {
    fn default() -> Self {
        Self::new(Duration::from_millis(10_000))
    }
}

impl FlashQueue {
    pub fn new(remove_delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            entries: Arc::new(tx),
            remove_delay,
        }
    }

    /// Insert a message and return its id.
    ///
    /// Non-persistent messages spawn a removal timer, so this must be called
    /// from within a tokio runtime.
    pub fn add(&self, flash: Flash) -> FlashId {
        let id = Uuid::new_v4();
        let persistent = flash.persistent;
        debug!("Adding {} flash {}", flash.kind.as_str(), id);

        self.entries.send_modify(|entries| entries.push((id, flash)));

        if !persistent {
            let queue = self.clone();
            let delay = self.remove_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                queue.remove(id);
            });
        }

        id
    }

    pub fn warning(&self, message: impl Into<String>) -> FlashId {
        self.add(Flash::warning(message))
    }

    pub fn error(&self, message: impl Into<String>) -> FlashId {
        self.add(Flash::error(message))
    }

    pub fn info(&self, message: impl Into<String>) -> FlashId {
        self.add(Flash::info(message))
    }

    pub fn success(&self, message: impl Into<String>) -> FlashId {
        self.add(Flash::success(message))
    }

    /// Remove a message. Returns `false` if it was already gone.
    pub fn remove(&self, id: FlashId) -> bool {
        self.entries.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            entries.len() != before
        })
    }

    pub fn clear(&self) {
        self.entries.send_if_modified(|entries| {
            let had_entries = !entries.is_empty();
            entries.clear();
            had_entries
        });
    }

    pub fn get(&self, id: FlashId) -> Option<Flash> {
        self.entries
            .borrow()
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, flash)| flash.clone())
    }

    /// Snapshot of all messages in insertion order
    pub fn entries(&self) -> Vec<(FlashId, Flash)> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<(FlashId, Flash)>> {
        self.entries.subscribe()
    }
}
